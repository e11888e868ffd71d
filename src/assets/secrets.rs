use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Namespace, Secret};
use k8s_openapi::ByteString;

use super::{namespaced_meta, Asset};

pub const AWS_CREDS_SECRET_NAME: &str = "hypershift-operator-aws-credentials";
pub const AWS_CREDS_SECRET_KEY: &str = "credentials";
pub const OIDC_PROVIDER_S3_CREDS_SECRET_NAME: &str =
    "hypershift-operator-oidc-provider-s3-credentials";
pub const EXTERNAL_DNS_CREDS_SECRET_NAME: &str = "external-dns-credentials";

fn credentials_secret(namespace: &Namespace, name: &str, key: &str, creds: &[u8]) -> Secret {
    Secret {
        metadata: namespaced_meta(namespace, name),
        data: Some(BTreeMap::from([(key.into(), ByteString(creds.to_vec()))])),
        ..Default::default()
    }
}

/// Cloud credentials used by the operator to manage private clusters
pub struct HyperShiftOperatorCredentialsSecret<'a> {
    pub namespace: &'a Namespace,
    pub creds: Vec<u8>,
}

impl Asset for HyperShiftOperatorCredentialsSecret<'_> {
    type Object = Secret;

    fn build(&self) -> Secret {
        credentials_secret(
            self.namespace,
            AWS_CREDS_SECRET_NAME,
            AWS_CREDS_SECRET_KEY,
            &self.creds,
        )
    }
}

/// Credentials for the S3 bucket the operator publishes OIDC documents to
pub struct HyperShiftOperatorOidcProviderS3Secret<'a> {
    pub namespace: &'a Namespace,
    pub oidc_storage_provider_s3_creds: Vec<u8>,
    pub creds_key: String,
}

impl Asset for HyperShiftOperatorOidcProviderS3Secret<'_> {
    type Object = Secret;

    fn build(&self) -> Secret {
        credentials_secret(
            self.namespace,
            OIDC_PROVIDER_S3_CREDS_SECRET_NAME,
            &self.creds_key,
            &self.oidc_storage_provider_s3_creds,
        )
    }
}

/// DNS provider credentials mounted into external-dns
pub struct ExternalDnsCredsSecret<'a> {
    pub namespace: &'a Namespace,
    pub creds: Vec<u8>,
}

impl Asset for ExternalDnsCredsSecret<'_> {
    type Object = Secret;

    fn build(&self) -> Secret {
        credentials_secret(
            self.namespace,
            EXTERNAL_DNS_CREDS_SECRET_NAME,
            "credentials",
            &self.creds,
        )
    }
}

#[cfg(test)]
mod tests {
    use kube::ResourceExt;

    use super::*;
    use crate::assets::test_support::namespace;

    fn data<'a>(secret: &'a Secret, key: &str) -> Option<&'a [u8]> {
        secret
            .data
            .as_ref()
            .and_then(|d| d.get(key))
            .map(|b| b.0.as_slice())
    }

    #[test]
    fn operator_credentials_secret() {
        let ns = namespace();
        let secret = HyperShiftOperatorCredentialsSecret {
            namespace: &ns,
            creds: b"[default]\naws_access_key_id=abc".to_vec(),
        }
        .build();

        assert_eq!(secret.name_any(), AWS_CREDS_SECRET_NAME);
        assert_eq!(secret.namespace().as_deref(), Some("hypershift"));
        assert_eq!(
            data(&secret, "credentials"),
            Some(b"[default]\naws_access_key_id=abc".as_slice())
        );
    }

    #[test]
    fn oidc_secret_uses_configured_key() {
        let ns = namespace();
        let secret = HyperShiftOperatorOidcProviderS3Secret {
            namespace: &ns,
            oidc_storage_provider_s3_creds: b"creds".to_vec(),
            creds_key: "aws-creds".into(),
        }
        .build();

        assert_eq!(secret.name_any(), OIDC_PROVIDER_S3_CREDS_SECRET_NAME);
        assert_eq!(data(&secret, "aws-creds"), Some(b"creds".as_slice()));
        assert_eq!(data(&secret, "credentials"), None);
    }

    #[test]
    fn secret_data_is_base64_encoded() {
        let ns = namespace();
        let secret = ExternalDnsCredsSecret {
            namespace: &ns,
            creds: b"token".to_vec(),
        }
        .build();

        assert_json_diff::assert_json_include!(
            actual: serde_json::to_value(&secret).unwrap(),
            expected: serde_json::json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "metadata": {
                    "name": "external-dns-credentials",
                    "namespace": "hypershift"
                },
                "data": { "credentials": "dG9rZW4=" }
            })
        );
    }
}
