//! Desired state of the children of an [`LdapProxy`]
//!
//! Everything here is pure: the same proxy always yields the same Secret, Service and
//! Deployment, so callers can build them on every pass and compare against the cluster.
use std::collections::BTreeMap;

use k8s_openapi::{
    api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::{
            Container, ContainerPort, EnvFromSource, EnvVar, PodSpec, PodTemplateSpec, Secret,
            SecretEnvSource, Service, ServicePort, ServiceSpec,
        },
    },
    apimachinery::pkg::{
        apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference},
        util::intstr::IntOrString,
    },
};
use kube::{Resource, ResourceExt};

use crate::{
    crd::LdapProxy,
    error::{Error, Result},
};

/// Key of the label selecting everything that belongs to one proxy
pub const APP_LABEL: &str = "app";
/// Name of the proxy container in the pod template
pub const CONTAINER_NAME: &str = "proxy";
/// Name of the container port
pub const CONTAINER_PORT_NAME: &str = "ldap-proxy";

/// Labels attached to every child and pod of the proxy named `name`
pub fn labels_for(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), name.to_string())])
}

/// Label selector matching [`labels_for`], for list calls
pub fn selector_for(name: &str) -> String {
    format!("{APP_LABEL}={name}")
}

/// Name of the credentials Secret
pub fn secret_name(proxy: &str) -> String {
    format!("{proxy}-secret")
}

/// Name of the Service
pub fn service_name(proxy: &str) -> String {
    format!("{proxy}-svc")
}

/// Name of the Deployment
pub fn deployment_name(proxy: &str) -> String {
    proxy.to_string()
}

/// Controller owner reference pointing at `proxy`, used by the garbage collector
pub fn owner_reference(proxy: &LdapProxy) -> Result<OwnerReference> {
    if proxy.meta().uid.is_none() {
        return Err(Error::MissingObjectKey(".metadata.uid"));
    }
    let owner = proxy
        .controller_owner_ref(&())
        .ok_or(Error::MissingObjectKey(".metadata.name"))?;
    Ok(OwnerReference {
        block_owner_deletion: Some(true),
        ..owner
    })
}

fn child_meta(proxy: &LdapProxy, name: String) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: proxy.namespace(),
        labels: Some(labels_for(&proxy.name_any())),
        ..ObjectMeta::default()
    }
}

/// Secret holding the upstream connection settings as environment variables
pub fn secret_for(proxy: &LdapProxy) -> Secret {
    let spec = &proxy.spec;
    Secret {
        metadata: child_meta(proxy, secret_name(&proxy.name_any())),
        type_: Some("Opaque".into()),
        string_data: Some(BTreeMap::from([
            ("LDAP_HOST".to_string(), spec.ldap_host.clone()),
            ("LDAP_PORT".to_string(), spec.ldap_port.clone()),
            ("LDAP_USE_TLS".to_string(), spec.ldap_use_tls.clone()),
        ])),
        ..Secret::default()
    }
}

/// ClusterIP Service exposing the ldap and ldaps ports on the proxy's container port
pub fn service_for(proxy: &LdapProxy) -> Service {
    let spec = &proxy.spec;
    let target = IntOrString::Int(spec.container_port);
    let port = |name: &str, port: i32| ServicePort {
        name: Some(name.into()),
        port,
        target_port: Some(target.clone()),
        protocol: Some("TCP".into()),
        ..ServicePort::default()
    };
    Service {
        metadata: child_meta(proxy, service_name(&proxy.name_any())),
        spec: Some(ServiceSpec {
            selector: Some(labels_for(&proxy.name_any())),
            ports: Some(vec![
                port("ldap", spec.ldap_service_port),
                port("ldaps", spec.ldaps_service_port),
            ]),
            type_: Some("ClusterIP".into()),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    }
}

/// Deployment running the proxy image, configured from the credentials Secret
pub fn deployment_for(proxy: &LdapProxy) -> Deployment {
    let name = proxy.name_any();
    let spec = &proxy.spec;
    let labels = labels_for(&name);
    let container = Container {
        name: CONTAINER_NAME.into(),
        image: Some(spec.image.clone()),
        image_pull_policy: Some("Always".into()),
        ports: Some(vec![ContainerPort {
            name: Some(CONTAINER_PORT_NAME.into()),
            container_port: spec.container_port,
            protocol: Some("TCP".into()),
            ..ContainerPort::default()
        }]),
        env: Some(vec![EnvVar {
            name: "LISTEN_PORT".into(),
            value: Some(spec.container_port.to_string()),
            ..EnvVar::default()
        }]),
        env_from: Some(vec![EnvFromSource {
            secret_ref: Some(SecretEnvSource {
                name: secret_name(&name),
                ..SecretEnvSource::default()
            }),
            ..EnvFromSource::default()
        }]),
        resources: spec.resources.clone(),
        ..Container::default()
    };
    Deployment {
        metadata: child_meta(proxy, deployment_name(&name)),
        spec: Some(DeploymentSpec {
            replicas: Some(spec.replicas),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..LabelSelector::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..ObjectMeta::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    ..PodSpec::default()
                }),
            },
            ..DeploymentSpec::default()
        }),
        ..Deployment::default()
    }
}
