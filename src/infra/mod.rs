use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::process::Command;
use tracing::{info, instrument};

use crate::{Error, Result};

/// Provider implementations are looked up on PATH as `hypershift-infra-<provider>`
pub const PLUGIN_PREFIX: &str = "hypershift-infra-";

#[derive(Clone, Debug, clap::Args)]
pub struct AwsDestroyOptions {
    /// Cluster ID with which to tag AWS resources
    #[arg(long)]
    pub infra_id: String,

    /// Path to an AWS credentials file
    #[arg(long, value_name = "FILE")]
    pub aws_creds: PathBuf,

    /// Region where cluster infra lives
    #[arg(long, default_value = "us-east-1")]
    pub region: String,

    /// Cluster's base domain
    #[arg(long)]
    pub base_domain: Option<String>,
}

#[derive(Clone, Debug, clap::Args)]
pub struct AzureDestroyOptions {
    /// Cluster ID with which to tag Azure resources
    #[arg(long)]
    pub infra_id: String,

    /// Path to a file with Azure credentials
    #[arg(long, value_name = "FILE")]
    pub azure_creds: PathBuf,

    /// Name of the HostedCluster
    #[arg(long)]
    pub name: String,

    /// Location where cluster infra lives
    #[arg(long, default_value = "eastus")]
    pub location: String,
}

/// Destroys HostedCluster infrastructure resources
#[derive(Clone, Debug, clap::Subcommand)]
pub enum DestroyInfraCommand {
    /// Destroys AWS infrastructure resources for a cluster
    Aws(AwsDestroyOptions),
    /// Destroys Azure infrastructure resources for a cluster
    Azure(AzureDestroyOptions),
}

impl DestroyInfraCommand {
    pub fn provider(&self) -> &'static str {
        match self {
            DestroyInfraCommand::Aws(_) => "aws",
            DestroyInfraCommand::Azure(_) => "azure",
        }
    }

    pub fn plugin(&self) -> String {
        format!("{PLUGIN_PREFIX}{}", self.provider())
    }

    /// Arguments handed to the provider plugin, starting with its `destroy` verb
    pub fn plugin_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["destroy".into()];
        match self {
            DestroyInfraCommand::Aws(o) => {
                args.extend([
                    "--infra-id".into(),
                    o.infra_id.clone().into(),
                    "--aws-creds".into(),
                    o.aws_creds.clone().into(),
                    "--region".into(),
                    o.region.clone().into(),
                ]);
                if let Some(base_domain) = &o.base_domain {
                    args.extend(["--base-domain".into(), base_domain.into()]);
                }
            }
            DestroyInfraCommand::Azure(o) => args.extend([
                "--infra-id".into(),
                o.infra_id.clone().into(),
                "--azure-creds".into(),
                o.azure_creds.clone().into(),
                "--name".into(),
                o.name.clone().into(),
                "--location".into(),
                o.location.clone().into(),
            ]),
        }
        args
    }

    #[instrument(skip(self), fields(provider = self.provider()))]
    pub async fn run(&self) -> Result<()> {
        run_plugin(&self.plugin(), self.plugin_args()).await
    }
}

async fn run_plugin(plugin: &str, args: Vec<OsString>) -> Result<()> {
    info!("Destroying infrastructure with {}", plugin);
    let status = Command::new(plugin)
        .args(args)
        .status()
        .await
        .map_err(|source| match source.kind() {
            ErrorKind::NotFound => Error::ProviderPluginNotFound(plugin.into()),
            _ => Error::ProviderPluginIo {
                plugin: plugin.into(),
                source,
            },
        })?;

    if !status.success() {
        return Err(Error::ProviderPluginFailed {
            plugin: plugin.into(),
            status,
        });
    }
    info!("Infrastructure destroyed");
    Ok(())
}
