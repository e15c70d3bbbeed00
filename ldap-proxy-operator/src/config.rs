//! Operator settings, read from flags or the environment
use std::time::Duration;

use clap::Args;

/// Runtime configuration of the controller
///
/// How to reach the cluster is not configured here; the client is built from the
/// kubeconfig or in-cluster environment.
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Only manage LdapProxy objects in this namespace (default: all namespaces)
    #[arg(long, env = "LDAP_PROXY_NAMESPACE")]
    pub namespace: Option<String>,

    /// Seconds before the follow-up pass after a Deployment was first created
    #[arg(long, env = "LDAP_PROXY_REQUEUE_AFTER", value_name = "SECONDS", default_value_t = 5)]
    pub requeue_after: u64,

    /// Seconds before a failed pass is retried
    #[arg(long, env = "LDAP_PROXY_RETRY_AFTER", value_name = "SECONDS", default_value_t = 10)]
    pub retry_after: u64,

    /// Seconds between passes over unchanged objects; 0 waits for changes instead
    #[arg(long, env = "LDAP_PROXY_RESYNC_AFTER", value_name = "SECONDS", default_value_t = 0)]
    pub resync_after: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: None,
            requeue_after: 5,
            retry_after: 10,
            resync_after: 0,
        }
    }
}

impl Config {
    /// Delay before re-observing a freshly created Deployment
    pub fn requeue_delay(&self) -> Duration {
        Duration::from_secs(self.requeue_after)
    }

    /// Delay before retrying a failed pass
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_after)
    }

    /// Periodic resync interval, if any
    pub fn resync_interval(&self) -> Option<Duration> {
        (self.resync_after > 0).then(|| Duration::from_secs(self.resync_after))
    }
}
