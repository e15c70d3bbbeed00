//! Reporting the running proxy pods onto `LdapProxy.status`
use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ListParams, Patch, PatchParams},
    ResourceExt,
};
use serde_json::json;
use tracing::{debug, info};

use crate::{
    crd::LdapProxy,
    error::{Error, Result},
    resources::selector_for,
};

/// Whether `recorded` already names exactly the pods in `observed`, ignoring order
pub fn nodes_match(recorded: &[String], observed: &BTreeSet<String>) -> bool {
    recorded.iter().collect::<BTreeSet<_>>() == observed.iter().collect::<BTreeSet<_>>()
}

/// Names of the pods selected by the proxy's `app` label
pub async fn observed_nodes(pods: &Api<Pod>, proxy: &LdapProxy) -> Result<BTreeSet<String>> {
    let lp = ListParams::default().labels(&selector_for(&proxy.name_any()));
    let list = pods.list(&lp).await.map_err(Error::ListPods)?;
    Ok(list.items.iter().map(ResourceExt::name_any).collect())
}

/// Bring `status.nodes` in line with the pods that currently exist
///
/// Returns whether a status write happened. The write only touches the status subresource
/// and is guarded by the `resourceVersion` the proxy was read at.
pub async fn sync_status(proxies: &Api<LdapProxy>, pods: &Api<Pod>, proxy: &LdapProxy) -> Result<bool> {
    let observed = observed_nodes(pods, proxy).await?;
    let recorded = proxy.status.as_ref().map(|s| s.nodes.as_slice()).unwrap_or_default();
    if nodes_match(recorded, &observed) {
        debug!(nodes = observed.len(), "status up to date");
        return Ok(false);
    }
    let name = proxy.name_any();
    info!(%name, nodes = ?observed, "updating status");
    let patch = json!({
        "metadata": { "resourceVersion": proxy.resource_version() },
        "status": { "nodes": observed },
    });
    proxies
        .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(Error::PatchStatus)?;
    Ok(true)
}
