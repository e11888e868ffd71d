use kube::api::DynamicObject;
use kube::Resource;
use serde::Serialize;

use super::{Credentials, InstallOptions};
use crate::assets::client::{
    HyperShiftClientClusterRole, HyperShiftClientClusterRoleBinding,
    HyperShiftClientServiceAccount, HyperShiftReaderClusterRole,
    HyperShiftReaderClusterRoleBinding,
};
use crate::assets::external_dns::{
    ExternalDnsClusterRole, ExternalDnsClusterRoleBinding, ExternalDnsDeployment,
    ExternalDnsServiceAccount,
};
use crate::assets::monitoring::{
    HyperShiftOperatorPrometheusRoleBinding, HyperShiftPrometheusRole, HyperShiftServiceMonitor,
    HypershiftRecordingRule,
};
use crate::assets::namespace::HyperShiftNamespace;
use crate::assets::operator::{
    HyperShiftOperatorClusterRole, HyperShiftOperatorClusterRoleBinding,
    HyperShiftOperatorDeployment, HyperShiftOperatorRole, HyperShiftOperatorRoleBinding,
    HyperShiftOperatorService, HyperShiftOperatorServiceAccount,
};
use crate::assets::priority_classes::{
    HyperShiftApiCriticalPriorityClass, HyperShiftControlPlanePriorityClass,
    HyperShiftEtcdPriorityClass,
};
use crate::assets::secrets::{
    ExternalDnsCredsSecret, HyperShiftOperatorCredentialsSecret,
    HyperShiftOperatorOidcProviderS3Secret,
};
use crate::assets::{Asset, PlatformType};
use crate::{Error, Result};

/// Convert a typed object into its untyped form, keeping apiVersion and kind
pub fn to_dynamic<K>(object: &K) -> Result<DynamicObject>
where
    K: Resource<DynamicType = ()> + Serialize,
{
    Ok(serde_json::from_value(serde_json::to_value(object)?)?)
}

#[derive(Default)]
struct ManifestList(Vec<DynamicObject>);

impl ManifestList {
    fn push<A: Asset>(&mut self, asset: A) -> Result<A::Object> {
        let object = asset.build();
        self.0.push(to_dynamic(&object)?);
        Ok(object)
    }
}

fn missing_credentials(what: &str) -> Error {
    Error::InvalidOptions(format!("no credentials were provided for {what}"))
}

/// All objects making up an installation, in the order they should be applied
pub fn manifests(options: &InstallOptions, credentials: &Credentials) -> Result<Vec<DynamicObject>> {
    let mut list = ManifestList::default();

    let namespace = list.push(HyperShiftNamespace {
        name: options.namespace.clone(),
        enable_ocp_cluster_monitoring: options.enable_ocp_cluster_monitoring,
    })?;
    let namespace = &namespace;

    let operator_sa = list.push(HyperShiftOperatorServiceAccount { namespace })?;
    let operator_cluster_role = list.push(HyperShiftOperatorClusterRole)?;
    list.push(HyperShiftOperatorClusterRoleBinding {
        cluster_role: &operator_cluster_role,
        service_account: &operator_sa,
    })?;
    let operator_role = list.push(HyperShiftOperatorRole { namespace })?;
    list.push(HyperShiftOperatorRoleBinding {
        role: &operator_role,
        service_account: &operator_sa,
    })?;

    if options.private_platform != PlatformType::None {
        let creds = credentials
            .aws_private
            .clone()
            .ok_or_else(|| missing_credentials("the private platform"))?;
        list.push(HyperShiftOperatorCredentialsSecret { namespace, creds })?;
    }

    let oidc_secret = if options.oidc_storage_enabled() {
        let creds = credentials
            .oidc_storage_provider_s3
            .clone()
            .ok_or_else(|| missing_credentials("the OIDC storage provider"))?;
        Some(list.push(HyperShiftOperatorOidcProviderS3Secret {
            namespace,
            oidc_storage_provider_s3_creds: creds,
            creds_key: options.oidc_secret_key.clone(),
        })?)
    } else {
        None
    };

    list.push(HyperShiftOperatorDeployment {
        namespace,
        operator_image: options.operator_image.clone(),
        service_account: &operator_sa,
        replicas: options.replicas,
        enable_ocp_cluster_monitoring: options.enable_ocp_cluster_monitoring,
        enable_ci_debug_output: options.enable_ci_debug_output,
        private_platform: options.private_platform,
        aws_private_region: options.aws_private_region.clone().unwrap_or_default(),
        oidc_bucket_name: options.oidc_bucket_name.clone().unwrap_or_default(),
        oidc_bucket_region: options.oidc_bucket_region.clone().unwrap_or_default(),
        oidc_storage_provider_s3_secret: oidc_secret.as_ref(),
        oidc_storage_provider_s3_secret_key: options.oidc_secret_key.clone(),
    })?;
    list.push(HyperShiftOperatorService { namespace })?;

    let prometheus_role = list.push(HyperShiftPrometheusRole { namespace })?;
    list.push(HyperShiftOperatorPrometheusRoleBinding {
        namespace,
        role: &prometheus_role,
        enable_ocp_cluster_monitoring: options.enable_ocp_cluster_monitoring,
    })?;
    list.push(HyperShiftServiceMonitor { namespace })?;
    list.push(HypershiftRecordingRule { namespace })?;

    list.push(HyperShiftControlPlanePriorityClass)?;
    list.push(HyperShiftApiCriticalPriorityClass)?;
    list.push(HyperShiftEtcdPriorityClass)?;

    let client_role = list.push(HyperShiftClientClusterRole)?;
    let client_sa = list.push(HyperShiftClientServiceAccount { namespace })?;
    list.push(HyperShiftClientClusterRoleBinding {
        cluster_role: &client_role,
        service_account: &client_sa,
        group_name: options.client_group.clone(),
    })?;
    let reader_role = list.push(HyperShiftReaderClusterRole)?;
    list.push(HyperShiftReaderClusterRoleBinding {
        cluster_role: &reader_role,
        group_name: options.readers_group.clone(),
    })?;

    if options.external_dns_enabled() {
        let creds = credentials
            .external_dns
            .clone()
            .ok_or_else(|| missing_credentials("external-dns"))?;
        let secret = list.push(ExternalDnsCredsSecret { namespace, creds })?;
        let sa = list.push(ExternalDnsServiceAccount { namespace })?;
        let role = list.push(ExternalDnsClusterRole)?;
        list.push(ExternalDnsClusterRoleBinding {
            cluster_role: &role,
            service_account: &sa,
        })?;
        list.push(ExternalDnsDeployment {
            namespace,
            image: options.external_dns_image.clone(),
            service_account: &sa,
            provider: options.external_dns_provider.clone().unwrap_or_default(),
            domain_filter: options.external_dns_domain_filter.clone().unwrap_or_default(),
            credentials_secret: &secret,
        })?;
    }

    Ok(list.0)
}

#[cfg(test)]
mod tests {
    use kube::ResourceExt;

    use super::*;

    fn kinds(manifests: &[DynamicObject]) -> Vec<String> {
        manifests
            .iter()
            .map(|m| m.types.as_ref().unwrap().kind.clone())
            .collect()
    }

    fn find<'a>(manifests: &'a [DynamicObject], kind: &str, name: &str) -> &'a DynamicObject {
        manifests
            .iter()
            .find(|m| m.types.as_ref().unwrap().kind == kind && m.name_any() == name)
            .unwrap_or_else(|| panic!("{kind} {name} not found"))
    }

    fn full_options() -> (InstallOptions, Credentials) {
        (
            InstallOptions {
                private_platform: PlatformType::AWS,
                aws_private_creds: Some("/tmp/aws".into()),
                aws_private_region: Some("us-west-2".into()),
                oidc_bucket_name: Some("oidc".into()),
                oidc_bucket_region: Some("us-east-2".into()),
                oidc_credentials: Some("/tmp/oidc".into()),
                external_dns_provider: Some("aws".into()),
                external_dns_credentials: Some("/tmp/dns".into()),
                external_dns_domain_filter: Some("example.com".into()),
                ..Default::default()
            },
            Credentials {
                aws_private: Some(b"aws".to_vec()),
                oidc_storage_provider_s3: Some(b"oidc".to_vec()),
                external_dns: Some(b"dns".to_vec()),
            },
        )
    }

    #[test]
    fn default_install() {
        let manifests = manifests(&InstallOptions::default(), &Credentials::default()).unwrap();

        assert_eq!(
            kinds(&manifests),
            vec![
                "Namespace",
                "ServiceAccount",
                "ClusterRole",
                "ClusterRoleBinding",
                "Role",
                "RoleBinding",
                "Deployment",
                "Service",
                "Role",
                "RoleBinding",
                "ServiceMonitor",
                "PrometheusRule",
                "PriorityClass",
                "PriorityClass",
                "PriorityClass",
                "ClusterRole",
                "ServiceAccount",
                "ClusterRoleBinding",
                "ClusterRole",
                "ClusterRoleBinding",
            ]
        );
    }

    #[test]
    fn full_install_adds_secrets_and_external_dns() {
        let (options, credentials) = full_options();
        let manifests = manifests(&options, &credentials).unwrap();

        assert_eq!(manifests.len(), 27);
        find(&manifests, "Secret", "hypershift-operator-aws-credentials");
        find(&manifests, "Secret", "hypershift-operator-oidc-provider-s3-credentials");
        find(&manifests, "Secret", "external-dns-credentials");
        let dns = find(&manifests, "Deployment", "external-dns");
        assert_eq!(
            dns.data["spec"]["template"]["spec"]["volumes"][0]["secret"]["secretName"],
            "external-dns-credentials"
        );

        let operator = find(&manifests, "Deployment", "operator");
        let args = &operator.data["spec"]["template"]["spec"]["containers"][0]["args"];
        assert!(args
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a == "--oidc-storage-provider-s3-bucket-name=oidc"));
    }

    #[test]
    fn namespaced_objects_land_in_install_namespace() {
        let (mut options, credentials) = full_options();
        options.namespace = "hcp-operator".into();
        let manifests = manifests(&options, &credentials).unwrap();

        for m in &manifests {
            let kind = &m.types.as_ref().unwrap().kind;
            match kind.as_str() {
                "Namespace" | "ClusterRole" | "ClusterRoleBinding" | "PriorityClass" => {
                    assert_eq!(m.namespace(), None, "{kind} {}", m.name_any())
                }
                _ => assert_eq!(
                    m.namespace().as_deref(),
                    Some("hcp-operator"),
                    "{kind} {}",
                    m.name_any()
                ),
            }
        }
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let (options, mut credentials) = full_options();
        credentials.external_dns = None;
        assert!(matches!(
            manifests(&options, &credentials),
            Err(Error::InvalidOptions(_))
        ));
    }

    #[test]
    fn manifests_are_reproducible() {
        let (options, credentials) = full_options();
        assert_eq!(
            serde_json::to_value(manifests(&options, &credentials).unwrap()).unwrap(),
            serde_json::to_value(manifests(&options, &credentials).unwrap()).unwrap()
        );
    }
}
