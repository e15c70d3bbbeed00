//! Create-or-update flows for the children of an [`LdapProxy`]
//!
//! Each flow reads the child by its deterministic name, creates it with a controller owner
//! reference when absent, and otherwise corrects only the fields the operator manages.
//! Writes to existing objects carry the observed `resourceVersion`, so a concurrent edit
//! surfaces as a conflict instead of being overwritten.
use std::{collections::BTreeMap, fmt::Debug};

use k8s_openapi::{
    api::{
        apps::v1::Deployment,
        core::v1::{Secret, Service},
    },
    apimachinery::pkg::apis::meta::v1::OwnerReference,
};
use kube::{
    api::{Api, Patch, PatchParams, PostParams},
    Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::{
    crd::LdapProxy,
    error::{Error, Result},
    resources::{deployment_for, owner_reference, secret_for, service_for},
};

/// What a create-or-update flow did to the cluster
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// The child did not exist and was created
    Created,
    /// The child existed but had drifted and was corrected
    Updated,
    /// The child already matched
    Unchanged,
}

/// Replica count the apiserver assumes when a Deployment leaves it unset
const DEFAULT_DEPLOYMENT_REPLICAS: i32 = 1;

async fn create_owned<K>(
    api: &Api<K>,
    mut child: K,
    owner: OwnerReference,
    on_error: fn(kube::Error) -> Error,
) -> Result<Applied>
where
    K: Resource + Clone + Debug + Serialize + DeserializeOwned,
    K::DynamicType: Default,
{
    child.meta_mut().owner_references = Some(vec![owner]);
    info!(
        kind = %K::kind(&K::DynamicType::default()),
        name = %child.name_any(),
        "creating child"
    );
    api.create(&PostParams::default(), &child).await.map_err(on_error)?;
    Ok(Applied::Created)
}

fn secret_drifted(existing: &Secret, desired: &Secret) -> bool {
    let stored: BTreeMap<&str, &[u8]> = existing
        .data
        .iter()
        .flatten()
        .map(|(k, v)| (k.as_str(), v.0.as_slice()))
        .collect();
    let wanted: BTreeMap<&str, &[u8]> = desired
        .string_data
        .iter()
        .flatten()
        .map(|(k, v)| (k.as_str(), v.as_bytes()))
        .collect();
    stored != wanted
}

/// Ensure the credentials Secret exists and holds the spec's upstream settings
///
/// The Secret is regenerated from the spec in full; when the stored data differs it is
/// replaced as a whole rather than merged.
pub async fn reconcile_secret(api: &Api<Secret>, proxy: &LdapProxy) -> Result<Applied> {
    let desired = secret_for(proxy);
    let name = desired.name_any();
    let owner = owner_reference(proxy)?;
    let Some(existing) = api.get_opt(&name).await.map_err(Error::GetSecret)? else {
        return create_owned(api, desired, owner, Error::CreateSecret).await;
    };
    if !secret_drifted(&existing, &desired) {
        debug!(%name, "secret up to date");
        return Ok(Applied::Unchanged);
    }
    let mut replacement = desired;
    replacement.metadata.resource_version = existing.resource_version();
    replacement.metadata.owner_references = Some(vec![owner]);
    info!(%name, "replacing drifted secret data");
    api.replace(&name, &PostParams::default(), &replacement)
        .await
        .map_err(Error::ReplaceSecret)?;
    Ok(Applied::Updated)
}

/// Ensure the Service exists
///
/// An existing Service is left untouched.
pub async fn reconcile_service(api: &Api<Service>, proxy: &LdapProxy) -> Result<Applied> {
    let desired = service_for(proxy);
    let name = desired.name_any();
    let owner = owner_reference(proxy)?;
    if api.get_opt(&name).await.map_err(Error::GetService)?.is_some() {
        debug!(%name, "service exists");
        return Ok(Applied::Unchanged);
    }
    create_owned(api, desired, owner, Error::CreateService).await
}

/// Ensure the Deployment exists and runs the requested number of replicas
///
/// Only `spec.replicas` is corrected on an existing Deployment; fields managed by the
/// cluster are never written.
pub async fn reconcile_deployment(api: &Api<Deployment>, proxy: &LdapProxy) -> Result<Applied> {
    let desired = deployment_for(proxy);
    let name = desired.name_any();
    let owner = owner_reference(proxy)?;
    let Some(existing) = api.get_opt(&name).await.map_err(Error::GetDeployment)? else {
        return create_owned(api, desired, owner, Error::CreateDeployment).await;
    };
    let observed = existing
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(DEFAULT_DEPLOYMENT_REPLICAS);
    let wanted = proxy.spec.replicas;
    if observed == wanted {
        debug!(%name, replicas = wanted, "deployment replicas up to date");
        return Ok(Applied::Unchanged);
    }
    info!(%name, from = observed, to = wanted, "scaling deployment");
    let patch = json!({
        "metadata": { "resourceVersion": existing.resource_version() },
        "spec": { "replicas": wanted },
    });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(Error::PatchDeployment)?;
    Ok(Applied::Updated)
}
