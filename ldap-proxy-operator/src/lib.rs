//! Kubernetes operator for LDAP proxies
//!
//! An [`LdapProxy`] describes a proxy in front of an upstream LDAP server. The operator
//! keeps three children per proxy in line with its spec:
//!
//! - a Secret `<name>-secret` carrying the upstream settings,
//! - a Service `<name>-svc` exposing the `ldap` and `ldaps` ports,
//! - a Deployment `<name>` running the proxy image,
//!
//! and records the names of the running proxy pods in `status.nodes`.
//!
//! The children carry a controller owner reference to their proxy, so deleting the proxy
//! lets the garbage collector remove them.
//!
//! ```no_run
//! use ldap_proxy_operator::{Config, Outcome, Reconciler};
//! # async fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let engine = Reconciler::new(client, Config::default());
//! if engine.reconcile_proxy("default", "proxy-a").await? == Outcome::Requeue {
//!     // the Deployment was just created
//! }
//! # Ok(())
//! # }
//! ```

pub mod children;
pub mod config;
pub mod controller;
pub mod crd;
pub mod error;
pub mod resources;
pub mod status;

pub use config::Config;
pub use controller::{error_policy, reconcile, run, Outcome, Reconciler};
pub use crd::{LdapProxy, LdapProxySpec, LdapProxyStatus};
pub use error::{Error, Result};
