use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, Namespace, PodSpec, PodTemplateSpec, ResourceRequirements,
    Secret, ServiceAccount,
};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;

use super::{
    cluster_meta, http_probe, name_selector, namespaced_meta, pod_labels, policy_rule, role_ref,
    secret_volume, service_account_subject, volume_mount, Asset, ProbeTiming, READ_VERBS,
};

pub const EXTERNAL_DNS_NAME: &str = "external-dns";

const METRICS_PORT: i32 = 7979;

pub struct ExternalDnsDeployment<'a> {
    pub namespace: &'a Namespace,
    pub image: String,
    pub service_account: &'a ServiceAccount,
    /// external-dns provider name, e.g. `aws`
    pub provider: String,
    pub domain_filter: String,
    pub credentials_secret: &'a Secret,
}

impl Asset for ExternalDnsDeployment<'_> {
    type Object = Deployment;

    fn build(&self) -> Deployment {
        let mut args = vec![
            "--source=service".to_string(),
            "--source=openshift-route".into(),
            format!("--domain-filter={}", self.domain_filter),
            format!("--provider={}", self.provider),
            "--registry=noop".into(),
            "--txt-owner-id=hypershift".into(),
        ];
        let mut env = Vec::new();

        if self.provider == "aws" {
            env.extend([
                EnvVar {
                    name: "AWS_SHARED_CREDENTIALS_FILE".into(),
                    value: Some("/etc/provider/credentials".into()),
                    value_from: None,
                },
                // route53 is a global service, so the region is fixed
                EnvVar {
                    name: "AWS_REGION".into(),
                    value: Some("us-east-1".into()),
                    value_from: None,
                },
            ]);
            args.push("--aws-zone-type=public".into());
        }

        Deployment {
            metadata: namespaced_meta(self.namespace, EXTERNAL_DNS_NAME),
            spec: Some(DeploymentSpec {
                selector: name_selector(EXTERNAL_DNS_NAME),
                replicas: Some(1),
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(pod_labels(EXTERNAL_DNS_NAME)),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        service_account_name: Some(self.service_account.name_any()),
                        containers: vec![Container {
                            name: EXTERNAL_DNS_NAME.into(),
                            image: Some(self.image.clone()),
                            image_pull_policy: Some("IfNotPresent".into()),
                            command: Some(vec!["/external-dns".into()]),
                            args: Some(args),
                            env: (!env.is_empty()).then_some(env),
                            ports: Some(vec![ContainerPort {
                                name: Some("metrics".into()),
                                container_port: METRICS_PORT,
                                ..Default::default()
                            }]),
                            liveness_probe: Some(http_probe(
                                "/healthz",
                                METRICS_PORT,
                                ProbeTiming(60, 60, 1, 5, 5),
                            )),
                            resources: Some(ResourceRequirements {
                                requests: Some(BTreeMap::from([
                                    ("memory".into(), Quantity("20Mi".into())),
                                    ("cpu".into(), Quantity("5m".into())),
                                ])),
                                ..Default::default()
                            }),
                            volume_mounts: Some(vec![volume_mount(
                                "credentials",
                                "/etc/provider",
                            )]),
                            ..Default::default()
                        }],
                        volumes: Some(vec![secret_volume(
                            "credentials",
                            self.credentials_secret.name_any(),
                        )]),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            status: None,
        }
    }
}

pub struct ExternalDnsServiceAccount<'a> {
    pub namespace: &'a Namespace,
}

impl Asset for ExternalDnsServiceAccount<'_> {
    type Object = ServiceAccount;

    fn build(&self) -> ServiceAccount {
        ServiceAccount {
            metadata: namespaced_meta(self.namespace, EXTERNAL_DNS_NAME),
            ..Default::default()
        }
    }
}

pub struct ExternalDnsClusterRole;

impl Asset for ExternalDnsClusterRole {
    type Object = ClusterRole;

    fn build(&self) -> ClusterRole {
        ClusterRole {
            metadata: cluster_meta(EXTERNAL_DNS_NAME),
            rules: Some(vec![
                policy_rule(&["route.openshift.io"], &["*"], READ_VERBS),
                policy_rule(
                    &[""],
                    &["endpoints", "services", "nodes", "pods"],
                    READ_VERBS,
                ),
            ]),
            ..Default::default()
        }
    }
}

pub struct ExternalDnsClusterRoleBinding<'a> {
    pub cluster_role: &'a ClusterRole,
    pub service_account: &'a ServiceAccount,
}

impl Asset for ExternalDnsClusterRoleBinding<'_> {
    type Object = ClusterRoleBinding;

    fn build(&self) -> ClusterRoleBinding {
        ClusterRoleBinding {
            metadata: cluster_meta(EXTERNAL_DNS_NAME),
            role_ref: role_ref("ClusterRole", self.cluster_role.name_any()),
            subjects: Some(vec![service_account_subject(self.service_account)]),
        }
    }
}
