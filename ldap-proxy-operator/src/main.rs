//! Command line entry point of the LDAP proxy operator
use clap::{Parser, Subcommand};
use kube::{Client, CustomResourceExt};
use ldap_proxy_operator::{Config, LdapProxy};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Manage LdapProxy custom resources
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    config: Config,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the controller (the default)
    Run,
    /// Print the LdapProxy CustomResourceDefinition as YAML
    Crd,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(Command::Crd) = cli.command {
        print!("{}", serde_yaml::to_string(&LdapProxy::crd())?);
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,kube=warn")),
        )
        .init();

    let client = Client::try_default().await?;
    info!(version = env!("CARGO_PKG_VERSION"), "ldap-proxy-operator starting");
    ldap_proxy_operator::run(client, cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("controller failed (is the LdapProxy CRD installed?): {e}"))
}
