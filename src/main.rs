use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use hypershift_install::infra::DestroyInfraCommand;
use hypershift_install::install::{self, Credentials, InstallOptions, OutputFormat};
use hypershift_install::telemetry::{self, LogFormat};

#[derive(Debug, clap::Parser)]
#[command(name = "hypershift", version)]
struct Arguments {
    /// Format of the log lines written to stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Installs the HyperShift operator
    Install {
        #[command(flatten)]
        options: InstallOptions,

        /// Render the manifests to stdout instead of applying them
        #[arg(long)]
        render: bool,

        /// Format of the rendered manifests
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,

        /// Wait until the operator deployment is available after applying
        #[arg(long)]
        wait_until_available: bool,

        /// How long to wait for the operator to become available
        #[arg(long, default_value_t = 300)]
        wait_timeout_seconds: u64,
    },
    /// Commands for destroying HyperShift resources
    Destroy {
        #[command(subcommand)]
        command: DestroyCommand,
    },
}

#[derive(Debug, clap::Subcommand)]
enum DestroyCommand {
    /// Destroys HostedCluster infrastructure resources
    Infra {
        #[command(subcommand)]
        command: DestroyInfraCommand,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    telemetry::init(args.log_format)?;

    match args.command {
        Command::Install {
            options,
            render,
            format,
            wait_until_available,
            wait_timeout_seconds,
        } => {
            options.validate()?;
            let credentials = Credentials::load(&options).await?;
            let manifests = install::manifests(&options, &credentials)?;

            if render {
                print!("{}", install::render(&manifests, format)?);
                return Ok(());
            }

            let client = kube::Client::try_default()
                .await
                .context("failed to create a Kubernetes client")?;
            install::apply_manifests(&client, &manifests).await?;
            info!("Applied {} objects", manifests.len());

            if wait_until_available {
                install::wait_for_operator(
                    &client,
                    &options.namespace,
                    Duration::from_secs(wait_timeout_seconds),
                )
                .await?;
            }
        }
        Command::Destroy {
            command: DestroyCommand::Infra { command },
        } => command.run().await?,
    }
    Ok(())
}
