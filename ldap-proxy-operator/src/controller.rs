//! Reconciliation of `LdapProxy` objects
//!
//! A pass loads the proxy, converges its Secret, Service and Deployment in that order, and
//! then reports the running pods on its status. Passes are level-triggered: running one
//! against an already converged proxy only performs reads.
use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{Pod, Secret, Service},
};
use kube::{
    api::{Api, ListParams},
    runtime::{
        controller::{Action, Controller},
        watcher,
    },
    Client, ResourceExt,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    children::{self, Applied},
    config::Config,
    crd::LdapProxy,
    error::{Error, Result},
    status,
};

/// Result of a successful pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing left to do until something changes
    Done,
    /// Run another pass soon; the Deployment was just created and has no pods yet
    Requeue,
}

/// The reconciliation engine, shared by every pass
#[derive(Clone)]
pub struct Reconciler {
    client: Client,
    config: Config,
}

impl Reconciler {
    /// Engine talking to the cluster through `client`
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    /// Settings the engine was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one pass for the proxy `namespace/name`
    ///
    /// A proxy that no longer exists is not an error; its children are removed by the
    /// garbage collector through their owner references.
    #[instrument(skip(self))]
    pub async fn reconcile_proxy(&self, namespace: &str, name: &str) -> Result<Outcome> {
        let proxies: Api<LdapProxy> = Api::namespaced(self.client.clone(), namespace);
        let Some(proxy) = proxies.get_opt(name).await.map_err(Error::GetProxy)? else {
            debug!("LdapProxy not found, ignoring");
            return Ok(Outcome::Done);
        };

        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        children::reconcile_secret(&secrets, &proxy).await?;

        let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        children::reconcile_service(&services, &proxy).await?;

        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        if children::reconcile_deployment(&deployments, &proxy).await? == Applied::Created {
            return Ok(Outcome::Requeue);
        }

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        status::sync_status(&proxies, &pods, &proxy).await?;
        Ok(Outcome::Done)
    }
}

/// Controller entry point for a changed `LdapProxy` or one of its children
pub async fn reconcile(proxy: Arc<LdapProxy>, ctx: Arc<Reconciler>) -> Result<Action> {
    let namespace = proxy
        .namespace()
        .ok_or(Error::MissingObjectKey(".metadata.namespace"))?;
    let action = match ctx.reconcile_proxy(&namespace, &proxy.name_any()).await? {
        Outcome::Requeue => Action::requeue(ctx.config.requeue_delay()),
        Outcome::Done => match ctx.config.resync_interval() {
            Some(interval) => Action::requeue(interval),
            None => Action::await_change(),
        },
    };
    Ok(action)
}

/// Retry policy for failed passes
pub fn error_policy(proxy: Arc<LdapProxy>, error: &Error, ctx: Arc<Reconciler>) -> Action {
    if error.is_conflict() {
        info!(name = %proxy.name_any(), "stale write, retrying with fresh data");
    } else {
        warn!(name = %proxy.name_any(), %error, "reconcile failed");
    }
    Action::requeue(ctx.config.retry_delay())
}

/// Run the controller until a shutdown signal arrives
///
/// Fails early when the `LdapProxy` CRD is not installed.
pub async fn run(client: Client, config: Config) -> kube::Result<()> {
    let (proxies, deployments, services, secrets) = match config.namespace.as_deref() {
        Some(ns) => (
            Api::<LdapProxy>::namespaced(client.clone(), ns),
            Api::<Deployment>::namespaced(client.clone(), ns),
            Api::<Service>::namespaced(client.clone(), ns),
            Api::<Secret>::namespaced(client.clone(), ns),
        ),
        None => (
            Api::<LdapProxy>::all(client.clone()),
            Api::<Deployment>::all(client.clone()),
            Api::<Service>::all(client.clone()),
            Api::<Secret>::all(client.clone()),
        ),
    };
    proxies.list(&ListParams::default().limit(1)).await?;

    info!(namespace = config.namespace.as_deref().unwrap_or("*"), "starting controller");
    let ctx = Arc::new(Reconciler::new(client, config));
    let wc = watcher::Config::default();
    Controller::new(proxies, wc.clone())
        .owns(deployments, wc.clone())
        .owns(services, wc.clone())
        .owns(secrets, wc)
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, action)) => debug!("reconciled {obj}: {action:?}"),
                Err(err) => debug!("reconcile failed: {err}"),
            }
        })
        .await;
    info!("controller shut down");
    Ok(())
}
