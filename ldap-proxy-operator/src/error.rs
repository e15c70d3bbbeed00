//! Error handling for reconciliation passes
use kube::error::ErrorResponse;
use thiserror::Error;

/// Failure of a single reconciliation pass
///
/// Every variant aborts the remaining stages of the pass; the controller retries the whole
/// pass later with fresh data.
#[derive(Error, Debug)]
pub enum Error {
    /// The object lacks metadata the API server always sets
    #[error("missing object key: {0}")]
    MissingObjectKey(&'static str),

    /// Reading the LdapProxy failed
    #[error("failed to get LdapProxy: {0}")]
    GetProxy(#[source] kube::Error),

    /// Reading the credentials Secret failed
    #[error("failed to get Secret: {0}")]
    GetSecret(#[source] kube::Error),

    /// Creating the credentials Secret failed
    #[error("failed to create Secret: {0}")]
    CreateSecret(#[source] kube::Error),

    /// Rewriting drifted Secret data failed
    #[error("failed to replace Secret: {0}")]
    ReplaceSecret(#[source] kube::Error),

    /// Reading the Service failed
    #[error("failed to get Service: {0}")]
    GetService(#[source] kube::Error),

    /// Creating the Service failed
    #[error("failed to create Service: {0}")]
    CreateService(#[source] kube::Error),

    /// Reading the Deployment failed
    #[error("failed to get Deployment: {0}")]
    GetDeployment(#[source] kube::Error),

    /// Creating the Deployment failed
    #[error("failed to create Deployment: {0}")]
    CreateDeployment(#[source] kube::Error),

    /// Correcting the Deployment replica count failed
    #[error("failed to patch Deployment replicas: {0}")]
    PatchDeployment(#[source] kube::Error),

    /// Listing the proxy pods failed
    #[error("failed to list pods: {0}")]
    ListPods(#[source] kube::Error),

    /// Writing the observed pods to the status subresource failed
    #[error("failed to patch LdapProxy status: {0}")]
    PatchStatus(#[source] kube::Error),
}

/// Convenience alias over [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    fn api_error(&self) -> Option<&ErrorResponse> {
        match self {
            Error::MissingObjectKey(_) => None,
            Error::GetProxy(e)
            | Error::GetSecret(e)
            | Error::CreateSecret(e)
            | Error::ReplaceSecret(e)
            | Error::GetService(e)
            | Error::CreateService(e)
            | Error::GetDeployment(e)
            | Error::CreateDeployment(e)
            | Error::PatchDeployment(e)
            | Error::ListPods(e)
            | Error::PatchStatus(e) => match e {
                kube::Error::Api(resp) => Some(resp),
                _ => None,
            },
        }
    }

    /// Whether a write lost an optimistic concurrency race (HTTP 409)
    pub fn is_conflict(&self) -> bool {
        self.api_error().is_some_and(|e| e.code == 409)
    }

    /// Whether the apiserver reported a missing object (HTTP 404)
    pub fn is_not_found(&self) -> bool {
        self.api_error().is_some_and(|e| e.code == 404)
    }
}
