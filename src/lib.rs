use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SerializationError: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YamlSerializationError: {0}")]
    YamlSerializationError(#[from] serde_yaml::Error),

    #[error("Kube Error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Invalid install options: {0}")]
    InvalidOptions(String),

    #[error("Unsupported platform type {0:?}")]
    UnsupportedPlatform(String),

    #[error("Failed to read credentials file {path}: {source}")]
    ReadCredentials {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Deployment {name} did not become available within {timeout:?}")]
    WaitTimeout { name: String, timeout: Duration },

    #[error("Failed waiting for condition: {0}")]
    WaitError(#[from] kube::runtime::wait::Error),

    #[error("The infra provider plugin {0} was not found on PATH")]
    ProviderPluginNotFound(String),

    #[error("The infra provider plugin {plugin} exited with {status}")]
    ProviderPluginFailed { plugin: String, status: ExitStatus },

    #[error("Failed to run infra provider plugin {plugin}: {source}")]
    ProviderPluginIo {
        plugin: String,
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Object builders for the operator and its supporting resources
pub mod assets;

/// Destroy commands for cloud infrastructure
pub mod infra;

/// Rendering and applying the full set of manifests
pub mod install;

/// Log integrations
pub mod telemetry;

/// External CRDs
pub mod resources;
