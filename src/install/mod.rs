use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::assets::client::{CLIENT_NAME, READERS_NAME};
use crate::assets::PlatformType;
use crate::{Error, Result};

mod apply;
mod manifests;
mod render;

pub use apply::{apply_manifests, is_rollout_complete, wait_for_operator, FIELD_MANAGER};
pub use manifests::{manifests, to_dynamic};
pub use render::{render, OutputFormat};

pub const DEFAULT_OPERATOR_IMAGE: &str = "quay.io/hypershift/hypershift-operator:latest";
pub const DEFAULT_EXTERNAL_DNS_IMAGE: &str = "registry.k8s.io/external-dns/external-dns:v0.13.5";

/// Everything needed to lay down the operator on a management cluster
#[derive(Clone, Debug, clap::Args)]
pub struct InstallOptions {
    /// The namespace in which to install HyperShift
    #[arg(long, default_value = "hypershift")]
    pub namespace: String,

    /// The HyperShift operator image to deploy
    #[arg(
        long = "hypershift-image",
        env = "HYPERSHIFT_IMAGE",
        default_value = DEFAULT_OPERATOR_IMAGE
    )]
    pub operator_image: String,

    /// Number of operator replicas
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub replicas: i32,

    /// Label the namespace for scraping by the OpenShift cluster monitoring stack
    #[arg(long)]
    pub enable_ocp_cluster_monitoring: bool,

    /// Have the operator write verbose output useful in CI
    #[arg(long)]
    pub enable_ci_debug_output: bool,

    /// Platform on which private clusters are supported by this operator
    #[arg(long, default_value_t = PlatformType::None)]
    pub private_platform: PlatformType,

    /// Path to an AWS credentials file with privileges sufficient to manage private cluster resources
    #[arg(long, env = "AWS_PRIVATE_CREDS", value_name = "FILE")]
    pub aws_private_creds: Option<PathBuf>,

    /// AWS region where private clusters are supported by this operator
    #[arg(long)]
    pub aws_private_region: Option<String>,

    /// Name of the S3 bucket in which to store the clusters OIDC discovery information
    #[arg(long = "oidc-storage-provider-s3-bucket-name")]
    pub oidc_bucket_name: Option<String>,

    /// Region of the OIDC bucket
    #[arg(long = "oidc-storage-provider-s3-region")]
    pub oidc_bucket_region: Option<String>,

    /// Credentials to use for writing the OIDC documents into the S3 bucket
    #[arg(long = "oidc-storage-provider-s3-credentials", value_name = "FILE")]
    pub oidc_credentials: Option<PathBuf>,

    /// Key of the credentials in the OIDC storage provider secret
    #[arg(long = "oidc-storage-provider-s3-secret-key", default_value = "credentials")]
    pub oidc_secret_key: String,

    /// Provider to use for managing DNS records using external-dns
    #[arg(long)]
    pub external_dns_provider: Option<String>,

    /// Credentials to use for managing DNS records using external-dns
    #[arg(long, env = "EXTERNAL_DNS_CREDENTIALS", value_name = "FILE")]
    pub external_dns_credentials: Option<PathBuf>,

    /// Restrict external-dns to changes within the specified domain
    #[arg(long)]
    pub external_dns_domain_filter: Option<String>,

    /// Image to use for external-dns
    #[arg(long, env = "EXTERNAL_DNS_IMAGE", default_value = DEFAULT_EXTERNAL_DNS_IMAGE)]
    pub external_dns_image: String,

    /// Group bound to the hypershift-client cluster role
    #[arg(long, default_value = CLIENT_NAME)]
    pub client_group: String,

    /// Group bound to the hypershift-readers cluster role
    #[arg(long, default_value = READERS_NAME)]
    pub readers_group: String,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            namespace: "hypershift".into(),
            operator_image: DEFAULT_OPERATOR_IMAGE.into(),
            replicas: 1,
            enable_ocp_cluster_monitoring: false,
            enable_ci_debug_output: false,
            private_platform: PlatformType::None,
            aws_private_creds: None,
            aws_private_region: None,
            oidc_bucket_name: None,
            oidc_bucket_region: None,
            oidc_credentials: None,
            oidc_secret_key: "credentials".into(),
            external_dns_provider: None,
            external_dns_credentials: None,
            external_dns_domain_filter: None,
            external_dns_image: DEFAULT_EXTERNAL_DNS_IMAGE.into(),
            client_group: CLIENT_NAME.into(),
            readers_group: READERS_NAME.into(),
        }
    }
}

fn is_dns1123_label(name: &str) -> bool {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    name.len() <= 63
        && REGEX
            .get_or_init(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap())
            .is_match(name)
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl InstallOptions {
    pub fn validate(&self) -> Result<()> {
        if !is_dns1123_label(&self.namespace) {
            return Err(Error::InvalidOptions(format!(
                "namespace {:?} is not a valid DNS-1123 label",
                self.namespace
            )));
        }

        if self.replicas < 0 {
            return Err(Error::InvalidOptions(format!(
                "replicas must not be negative, got {}",
                self.replicas
            )));
        }

        // the operator mounts the credentials secret for every private platform
        if self.private_platform != PlatformType::None && self.aws_private_creds.is_none() {
            return Err(Error::InvalidOptions(format!(
                "--aws-private-creds is required with --private-platform={}",
                self.private_platform
            )));
        }
        if self.private_platform == PlatformType::AWS && !non_empty(&self.aws_private_region) {
            return Err(Error::InvalidOptions(
                "--aws-private-region is required with --private-platform=AWS".into(),
            ));
        }

        let oidc = [
            non_empty(&self.oidc_bucket_name),
            non_empty(&self.oidc_bucket_region),
            self.oidc_credentials.is_some(),
        ];
        if oidc.contains(&true) && oidc.contains(&false) {
            return Err(Error::InvalidOptions(
                "the OIDC storage provider bucket name, region and credentials must be set together"
                    .into(),
            ));
        }
        if oidc[0] && self.oidc_secret_key.is_empty() {
            return Err(Error::InvalidOptions(
                "--oidc-storage-provider-s3-secret-key must not be empty".into(),
            ));
        }

        let external_dns = [
            non_empty(&self.external_dns_provider),
            self.external_dns_credentials.is_some(),
            non_empty(&self.external_dns_domain_filter),
        ];
        if external_dns.contains(&true) && external_dns.contains(&false) {
            return Err(Error::InvalidOptions(
                "--external-dns-provider, --external-dns-credentials and --external-dns-domain-filter must be set together"
                    .into(),
            ));
        }

        Ok(())
    }

    pub fn oidc_storage_enabled(&self) -> bool {
        non_empty(&self.oidc_bucket_name)
    }

    pub fn external_dns_enabled(&self) -> bool {
        non_empty(&self.external_dns_provider)
    }
}

/// Credential material read from the files named in [`InstallOptions`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Credentials {
    pub aws_private: Option<Vec<u8>>,
    pub oidc_storage_provider_s3: Option<Vec<u8>>,
    pub external_dns: Option<Vec<u8>>,
}

async fn read_file(path: Option<&Path>) -> Result<Option<Vec<u8>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    debug!("Reading credentials from {}", path.display());
    tokio::fs::read(path)
        .await
        .map(Some)
        .map_err(|source| Error::ReadCredentials {
            path: path.to_path_buf(),
            source,
        })
}

impl Credentials {
    pub async fn load(options: &InstallOptions) -> Result<Self> {
        // credentials for the private platform only matter when there is one
        let aws_private = if options.private_platform == PlatformType::None {
            None
        } else {
            read_file(options.aws_private_creds.as_deref()).await?
        };

        Ok(Self {
            aws_private,
            oidc_storage_provider_s3: read_file(options.oidc_credentials.as_deref()).await?,
            external_dns: read_file(options.external_dns_credentials.as_deref()).await?,
        })
    }
}
