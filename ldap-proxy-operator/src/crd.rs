//! The `LdapProxy` custom resource
use k8s_openapi::api::core::v1::ResourceRequirements;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Image used when `spec.image` is not set
pub const DEFAULT_IMAGE: &str = "quay.io/rhn-gps-aluque/proxy-ldap:1.0";
/// Port the proxy listens on inside its container
pub const DEFAULT_CONTAINER_PORT: i32 = 1389;
/// Service port for plaintext LDAP
pub const DEFAULT_LDAP_SERVICE_PORT: i32 = 389;
/// Service port for LDAP over TLS
pub const DEFAULT_LDAPS_SERVICE_PORT: i32 = 636;

/// Desired state of an LDAP proxy deployment
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(
    group = "proxy.ar-consulting.redhat.com",
    version = "v1alpha1",
    kind = "LdapProxy",
    plural = "ldapproxies",
    namespaced,
    status = "LdapProxyStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Replicas", "type":"integer", "jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Upstream", "type":"string", "jsonPath":".spec.ldapHost"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct LdapProxySpec {
    /// Number of proxy pods to run
    #[serde(default = "default_replicas")]
    #[schemars(range(min = 1))]
    pub replicas: i32,

    /// Address of the upstream LDAP server
    pub ldap_host: String,

    /// Port of the upstream LDAP server
    pub ldap_port: String,

    /// Whether the proxy talks TLS to the upstream server
    #[serde(rename = "ldapUseTLS")]
    pub ldap_use_tls: String,

    /// Container image running the proxy
    #[serde(default = "default_image")]
    pub image: String,

    /// Port the proxy listens on inside the container
    #[serde(default = "default_container_port")]
    pub container_port: i32,

    /// Service port exposing plaintext LDAP
    #[serde(default = "default_ldap_service_port")]
    pub ldap_service_port: i32,

    /// Service port exposing LDAPS
    #[serde(default = "default_ldaps_service_port")]
    pub ldaps_service_port: i32,

    /// CPU and memory requests and limits for the proxy container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

/// Observed state of an LDAP proxy deployment
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct LdapProxyStatus {
    /// Names of the pods running the proxy, sorted
    #[serde(default)]
    pub nodes: Vec<String>,
}

fn default_replicas() -> i32 {
    1
}

fn default_image() -> String {
    DEFAULT_IMAGE.into()
}

fn default_container_port() -> i32 {
    DEFAULT_CONTAINER_PORT
}

fn default_ldap_service_port() -> i32 {
    DEFAULT_LDAP_SERVICE_PORT
}

fn default_ldaps_service_port() -> i32 {
    DEFAULT_LDAPS_SERVICE_PORT
}

impl LdapProxySpec {
    /// Spec pointing at an upstream server, with every optional field at its default
    pub fn new(ldap_host: impl Into<String>, ldap_port: impl Into<String>, ldap_use_tls: bool) -> Self {
        Self {
            replicas: default_replicas(),
            ldap_host: ldap_host.into(),
            ldap_port: ldap_port.into(),
            ldap_use_tls: ldap_use_tls.to_string(),
            image: default_image(),
            container_port: default_container_port(),
            ldap_service_port: default_ldap_service_port(),
            ldaps_service_port: default_ldaps_service_port(),
            resources: None,
        }
    }
}
