//! Drives the operator against a live cluster: installs the CRD, creates an LdapProxy,
//! waits for its children, scales it, and deletes it again.
use std::time::Duration;

use k8s_openapi::{
    api::{
        apps::v1::Deployment,
        core::v1::{Secret, Service},
    },
    apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition,
};
use kube::{
    api::{Api, DeleteParams, Patch, PatchParams},
    runtime::wait::{await_condition, conditions},
    Client, CustomResourceExt, ResourceExt,
};
use ldap_proxy_operator::{Config, LdapProxy, LdapProxySpec};
use tracing::info;

const NAME: &str = "e2e-proxy";

fn has_replicas(replicas: i32) -> impl Fn(Option<&Deployment>) -> bool {
    move |obj| obj.and_then(|d| d.spec.as_ref()).and_then(|s| s.replicas) == Some(replicas)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let client = Client::try_default().await?;
    let ssapply = PatchParams::apply("ldap-proxy-e2e").force();

    info!("Installing CRD");
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let crd_name = LdapProxy::crd_name();
    crds.patch(crd_name, &ssapply, &Patch::Apply(LdapProxy::crd())).await?;
    let establish = await_condition(crds, crd_name, conditions::is_crd_established());
    tokio::time::timeout(Duration::from_secs(10), establish).await??;

    let namespace = client.default_namespace().to_string();
    let config = Config {
        namespace: Some(namespace.clone()),
        requeue_after: 1,
        ..Config::default()
    };
    let controller = tokio::spawn(ldap_proxy_operator::run(client.clone(), config));

    info!("Creating LdapProxy {NAME}");
    let proxies: Api<LdapProxy> = Api::namespaced(client.clone(), &namespace);
    let proxy = LdapProxy::new(NAME, LdapProxySpec::new("ldap.example.com", "389", false));
    let uid = proxies
        .patch(NAME, &ssapply, &Patch::Apply(&proxy))
        .await?
        .uid()
        .unwrap_or_default();

    info!("Waiting for the deployment");
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), &namespace);
    let created = await_condition(deployments.clone(), NAME, has_replicas(1));
    tokio::time::timeout(Duration::from_secs(30), created).await??;

    let secrets: Api<Secret> = Api::namespaced(client.clone(), &namespace);
    let secret = secrets.get(&format!("{NAME}-secret")).await?;
    anyhow::ensure!(secret.owner_references().len() == 1, "secret is not owned");
    let services: Api<Service> = Api::namespaced(client.clone(), &namespace);
    let service = services.get(&format!("{NAME}-svc")).await?;
    anyhow::ensure!(service.owner_references().len() == 1, "service is not owned");

    info!("Scaling {NAME} to 2 replicas");
    let scale = serde_json::json!({ "spec": { "replicas": 2 } });
    proxies
        .patch(NAME, &PatchParams::default(), &Patch::Merge(&scale))
        .await?;
    let scaled = await_condition(deployments, NAME, has_replicas(2));
    tokio::time::timeout(Duration::from_secs(30), scaled).await??;

    info!("Cleaning up {NAME}");
    proxies.delete(NAME, &DeleteParams::foreground()).await?;
    let deleted = await_condition(proxies, NAME, conditions::is_deleted(&uid));
    tokio::time::timeout(Duration::from_secs(30), deleted).await??;
    controller.abort();
    Ok(())
}
