use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, Namespace, ObjectFieldSelector, PodSpec,
    PodTemplateSpec, ProjectedVolumeSource, ResourceRequirements, Secret, SecurityContext,
    Service, ServiceAccount, ServiceAccountTokenProjection, ServicePort, ServiceSpec, Volume,
    VolumeMount, VolumeProjection,
};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;

use super::secrets::AWS_CREDS_SECRET_NAME;
use super::{
    cluster_meta, http_probe, name_labels, name_selector, namespaced_meta, pod_labels,
    policy_rule, role_ref, secret_volume, service_account_subject, volume_mount, Asset,
    PlatformType, ProbeTiming, ALL, READ_VERBS,
};

pub const OPERATOR_NAME: &str = "operator";
pub const OPERATOR_CLUSTER_ROLE_NAME: &str = "hypershift-operator";

const METRICS_PORT: i32 = 9000;
const OIDC_S3_CREDS_VOLUME: &str = "oidc-storage-provider-s3-creds";
const OIDC_S3_CREDS_MOUNT_PATH: &str = "/etc/oidc-storage-provider-s3-creds";
const PROVIDER_CREDS_MOUNT_PATH: &str = "/etc/provider";

pub struct HyperShiftOperatorDeployment<'a> {
    pub namespace: &'a Namespace,
    pub operator_image: String,
    pub service_account: &'a ServiceAccount,
    pub replicas: i32,
    pub enable_ocp_cluster_monitoring: bool,
    pub enable_ci_debug_output: bool,
    pub private_platform: PlatformType,
    /// Region of the private platform; only consulted for AWS
    pub aws_private_region: String,
    pub oidc_bucket_name: String,
    pub oidc_bucket_region: String,
    pub oidc_storage_provider_s3_secret: Option<&'a Secret>,
    pub oidc_storage_provider_s3_secret_key: String,
}

impl HyperShiftOperatorDeployment<'_> {
    // OIDC storage is only wired up when every piece of it is configured
    fn oidc_s3_secret_name(&self) -> Option<String> {
        if self.oidc_bucket_name.is_empty()
            || self.oidc_bucket_region.is_empty()
            || self.oidc_storage_provider_s3_secret_key.is_empty()
        {
            return None;
        }
        self.oidc_storage_provider_s3_secret
            .and_then(|s| s.metadata.name.clone())
            .filter(|name| !name.is_empty())
    }

    fn args(&self) -> Vec<String> {
        vec![
            "run".into(),
            "--namespace=$(MY_NAMESPACE)".into(),
            format!("--deployment-name={OPERATOR_NAME}"),
            format!("--metrics-addr=:{METRICS_PORT}"),
            format!(
                "--enable-ocp-cluster-monitoring={}",
                self.enable_ocp_cluster_monitoring
            ),
            format!("--enable-ci-debug-output={}", self.enable_ci_debug_output),
            format!("--private-platform={}", self.private_platform),
        ]
    }
}

fn operator_container(image: String, args: Vec<String>) -> Container {
    Container {
        name: OPERATOR_NAME.into(),
        // the operator runs with the anyuid SCC
        security_context: Some(SecurityContext {
            run_as_user: Some(1000),
            ..Default::default()
        }),
        image: Some(image),
        image_pull_policy: Some("Always".into()),
        env: Some(vec![EnvVar {
            name: "MY_NAMESPACE".into(),
            value: None,
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    api_version: None,
                    field_path: "metadata.namespace".into(),
                }),
                ..Default::default()
            }),
        }]),
        command: Some(vec!["/usr/bin/hypershift-operator".into()]),
        args: Some(args),
        liveness_probe: Some(http_probe(
            "/metrics",
            METRICS_PORT,
            ProbeTiming(60, 60, 1, 5, 5),
        )),
        readiness_probe: Some(http_probe(
            "/metrics",
            METRICS_PORT,
            ProbeTiming(15, 60, 1, 3, 5),
        )),
        ports: Some(vec![ContainerPort {
            name: Some("metrics".into()),
            container_port: METRICS_PORT,
            protocol: Some("TCP".into()),
            ..Default::default()
        }]),
        resources: Some(ResourceRequirements {
            requests: Some(BTreeMap::from([
                ("memory".into(), Quantity("150Mi".into())),
                ("cpu".into(), Quantity("10m".into())),
            ])),
            ..Default::default()
        }),
        ..Default::default()
    }
}

impl Asset for HyperShiftOperatorDeployment<'_> {
    type Object = Deployment;

    fn build(&self) -> Deployment {
        let mut args = self.args();
        let mut env = Vec::new();
        let mut volume_mounts: Vec<VolumeMount> = Vec::new();
        let mut volumes: Vec<Volume> = Vec::new();

        if let Some(secret_name) = self.oidc_s3_secret_name() {
            args.extend([
                format!(
                    "--oidc-storage-provider-s3-bucket-name={}",
                    self.oidc_bucket_name
                ),
                format!("--oidc-storage-provider-s3-region={}", self.oidc_bucket_region),
                format!(
                    "--oidc-storage-provider-s3-credentials={OIDC_S3_CREDS_MOUNT_PATH}/{}",
                    self.oidc_storage_provider_s3_secret_key
                ),
            ]);
            volume_mounts.push(volume_mount(OIDC_S3_CREDS_VOLUME, OIDC_S3_CREDS_MOUNT_PATH));
            volumes.push(secret_volume(OIDC_S3_CREDS_VOLUME, secret_name));
        }

        if self.private_platform != PlatformType::None {
            volumes.push(secret_volume("credentials", AWS_CREDS_SECRET_NAME.into()));
            volume_mounts.push(volume_mount("credentials", PROVIDER_CREDS_MOUNT_PATH));
        }

        if self.private_platform == PlatformType::AWS {
            env.extend([
                EnvVar {
                    name: "AWS_SHARED_CREDENTIALS_FILE".into(),
                    value: Some(format!("{PROVIDER_CREDS_MOUNT_PATH}/credentials")),
                    value_from: None,
                },
                EnvVar {
                    name: "AWS_REGION".into(),
                    value: Some(self.aws_private_region.clone()),
                    value_from: None,
                },
            ]);
            volume_mounts.push(volume_mount(
                "token",
                "/var/run/secrets/openshift/serviceaccount",
            ));
            volumes.push(Volume {
                name: "token".into(),
                projected: Some(ProjectedVolumeSource {
                    sources: Some(vec![VolumeProjection {
                        service_account_token: Some(ServiceAccountTokenProjection {
                            audience: Some("openshift".into()),
                            path: "token".into(),
                            expiration_seconds: None,
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
                ..Default::default()
            });
        }

        let mut container = operator_container(self.operator_image.clone(), args);
        container.env.get_or_insert_with(Vec::new).extend(env);
        if !volume_mounts.is_empty() {
            container.volume_mounts = Some(volume_mounts);
        }

        Deployment {
            metadata: namespaced_meta(self.namespace, OPERATOR_NAME),
            spec: Some(DeploymentSpec {
                replicas: Some(self.replicas),
                selector: name_selector(OPERATOR_NAME),
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(pod_labels(OPERATOR_NAME)),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        service_account_name: Some(self.service_account.name_any()),
                        containers: vec![container],
                        volumes: (!volumes.is_empty()).then_some(volumes),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            status: None,
        }
    }
}

pub struct HyperShiftOperatorService<'a> {
    pub namespace: &'a Namespace,
}

impl Asset for HyperShiftOperatorService<'_> {
    type Object = Service;

    fn build(&self) -> Service {
        let mut metadata = namespaced_meta(self.namespace, OPERATOR_NAME);
        metadata.labels = Some(name_labels(OPERATOR_NAME));

        Service {
            metadata,
            spec: Some(ServiceSpec {
                type_: Some("ClusterIP".into()),
                selector: Some(name_labels(OPERATOR_NAME)),
                ports: Some(vec![ServicePort {
                    name: Some("metrics".into()),
                    protocol: Some("TCP".into()),
                    port: 9393,
                    target_port: Some(IntOrString::String("metrics".into())),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            status: None,
        }
    }
}

pub struct HyperShiftOperatorServiceAccount<'a> {
    pub namespace: &'a Namespace,
}

impl Asset for HyperShiftOperatorServiceAccount<'_> {
    type Object = ServiceAccount;

    fn build(&self) -> ServiceAccount {
        ServiceAccount {
            metadata: namespaced_meta(self.namespace, OPERATOR_NAME),
            ..Default::default()
        }
    }
}

pub struct HyperShiftOperatorClusterRole;

impl Asset for HyperShiftOperatorClusterRole {
    type Object = ClusterRole;

    fn build(&self) -> ClusterRole {
        ClusterRole {
            metadata: cluster_meta(OPERATOR_CLUSTER_ROLE_NAME),
            rules: Some(vec![
                policy_rule(&["hypershift.openshift.io"], ALL, ALL),
                policy_rule(&["config.openshift.io"], ALL, READ_VERBS),
                policy_rule(&["apiextensions.k8s.io"], &["customresourcedefinitions"], ALL),
                policy_rule(&["batch"], &["cronjobs", "jobs"], ALL),
                policy_rule(&["coordination.k8s.io"], &["leases"], ALL),
                policy_rule(&["networking.k8s.io"], &["networkpolicies"], ALL),
                policy_rule(
                    &[
                        "bootstrap.cluster.x-k8s.io",
                        "controlplane.cluster.x-k8s.io",
                        "infrastructure.cluster.x-k8s.io",
                        "machines.cluster.x-k8s.io",
                        "exp.infrastructure.cluster.x-k8s.io",
                        "addons.cluster.x-k8s.io",
                        "exp.cluster.x-k8s.io",
                        "cluster.x-k8s.io",
                        "monitoring.coreos.com",
                    ],
                    ALL,
                    ALL,
                ),
                policy_rule(&["policy"], &["poddisruptionbudgets"], ALL),
                policy_rule(&["operator.openshift.io"], ALL, ALL),
                policy_rule(&["route.openshift.io"], ALL, ALL),
                policy_rule(&["security.openshift.io"], &["securitycontextconstraints"], ALL),
                policy_rule(
                    &["rbac.authorization.k8s.io"],
                    ALL,
                    &[
                        "get", "list", "watch", "create", "update", "patch", "delete",
                    ],
                ),
                policy_rule(
                    &[""],
                    &[
                        "events",
                        "configmaps",
                        "pods",
                        "pods/log",
                        "secrets",
                        "nodes",
                        "namespaces",
                        "serviceaccounts",
                        "services",
                        "endpoints",
                    ],
                    ALL,
                ),
                policy_rule(&["apps"], &["deployments", "statefulsets"], ALL),
                policy_rule(&["etcd.database.coreos.com"], ALL, ALL),
                policy_rule(&["machine.openshift.io"], ALL, ALL),
                policy_rule(
                    &["monitoring.coreos.com"],
                    &["podmonitors"],
                    &["get", "list", "watch", "create", "update"],
                ),
                policy_rule(&["capi-provider.agent-install.openshift.io"], ALL, ALL),
                policy_rule(&["operator.openshift.io"], &["ingresscontrollers"], ALL),
                policy_rule(
                    &["kubevirt.io"],
                    &["virtualmachineinstances", "virtualmachines"],
                    ALL,
                ),
                policy_rule(&["agent-install.openshift.io"], &["agents"], ALL),
            ]),
            ..Default::default()
        }
    }
}

pub struct HyperShiftOperatorClusterRoleBinding<'a> {
    pub cluster_role: &'a ClusterRole,
    pub service_account: &'a ServiceAccount,
}

impl Asset for HyperShiftOperatorClusterRoleBinding<'_> {
    type Object = ClusterRoleBinding;

    fn build(&self) -> ClusterRoleBinding {
        ClusterRoleBinding {
            metadata: cluster_meta(OPERATOR_CLUSTER_ROLE_NAME),
            role_ref: role_ref("ClusterRole", self.cluster_role.name_any()),
            subjects: Some(vec![service_account_subject(self.service_account)]),
        }
    }
}

/// Namespaced permissions the operator needs for leader election
pub struct HyperShiftOperatorRole<'a> {
    pub namespace: &'a Namespace,
}

impl Asset for HyperShiftOperatorRole<'_> {
    type Object = Role;

    fn build(&self) -> Role {
        Role {
            metadata: namespaced_meta(self.namespace, OPERATOR_CLUSTER_ROLE_NAME),
            rules: Some(vec![policy_rule(&["coordination.k8s.io"], &["leases"], ALL)]),
        }
    }
}

pub struct HyperShiftOperatorRoleBinding<'a> {
    pub role: &'a Role,
    pub service_account: &'a ServiceAccount,
}

impl Asset for HyperShiftOperatorRoleBinding<'_> {
    type Object = RoleBinding;

    fn build(&self) -> RoleBinding {
        RoleBinding {
            metadata: ObjectMeta {
                name: Some(OPERATOR_CLUSTER_ROLE_NAME.into()),
                namespace: self.service_account.namespace(),
                ..Default::default()
            },
            role_ref: role_ref("Role", self.role.name_any()),
            subjects: Some(vec![service_account_subject(self.service_account)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::secrets::{
        HyperShiftOperatorOidcProviderS3Secret, OIDC_PROVIDER_S3_CREDS_SECRET_NAME,
    };
    use crate::assets::test_support::{container, env_value, namespace, pod_spec};

    fn deployment(
        ns: &Namespace,
        sa: &ServiceAccount,
        platform: PlatformType,
        oidc_secret: Option<&Secret>,
    ) -> Deployment {
        HyperShiftOperatorDeployment {
            namespace: ns,
            operator_image: "quay.io/hypershift/hypershift-operator:latest".into(),
            service_account: sa,
            replicas: 1,
            enable_ocp_cluster_monitoring: false,
            enable_ci_debug_output: false,
            private_platform: platform,
            aws_private_region: "us-west-2".into(),
            oidc_bucket_name: "oidc-bucket".into(),
            oidc_bucket_region: "us-east-2".into(),
            oidc_storage_provider_s3_secret: oidc_secret,
            oidc_storage_provider_s3_secret_key: "credentials".into(),
        }
        .build()
    }

    fn volume_names(deployment: &Deployment) -> Vec<&str> {
        pod_spec(deployment)
            .volumes
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|v| v.name.as_str())
            .collect()
    }

    #[test]
    fn none_platform_has_no_credentials() {
        let ns = namespace();
        let sa = HyperShiftOperatorServiceAccount { namespace: &ns }.build();
        let dp = deployment(&ns, &sa, PlatformType::None, None);

        assert!(pod_spec(&dp).volumes.is_none());
        assert!(container(&dp).volume_mounts.is_none());
        assert_eq!(env_value(container(&dp), "AWS_REGION"), None);
        assert!(container(&dp)
            .args
            .as_ref()
            .unwrap()
            .contains(&"--private-platform=None".to_string()));
    }

    #[test]
    fn aws_platform_sets_region_and_token() {
        let ns = namespace();
        let sa = HyperShiftOperatorServiceAccount { namespace: &ns }.build();
        let dp = deployment(&ns, &sa, PlatformType::AWS, None);
        let c = container(&dp);

        assert_eq!(env_value(c, "AWS_REGION"), Some("us-west-2"));
        assert_eq!(
            env_value(c, "AWS_SHARED_CREDENTIALS_FILE"),
            Some("/etc/provider/credentials")
        );
        assert_eq!(volume_names(&dp), vec!["credentials", "token"]);

        let credentials = &pod_spec(&dp).volumes.as_ref().unwrap()[0];
        assert_eq!(
            credentials.secret.as_ref().unwrap().secret_name.as_deref(),
            Some(AWS_CREDS_SECRET_NAME)
        );
        let token = &pod_spec(&dp).volumes.as_ref().unwrap()[1];
        let projection = token.projected.as_ref().unwrap().sources.as_ref().unwrap()[0]
            .service_account_token
            .as_ref()
            .unwrap();
        assert_eq!(projection.audience.as_deref(), Some("openshift"));
        assert_eq!(projection.path, "token");
    }

    #[test]
    fn other_platforms_only_mount_credentials() {
        let ns = namespace();
        let sa = HyperShiftOperatorServiceAccount { namespace: &ns }.build();
        let dp = deployment(&ns, &sa, PlatformType::KubeVirt, None);

        assert_eq!(volume_names(&dp), vec!["credentials"]);
        assert_eq!(env_value(container(&dp), "AWS_REGION"), None);
        assert_eq!(container(&dp).env.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn oidc_storage_requires_secret() {
        let ns = namespace();
        let sa = HyperShiftOperatorServiceAccount { namespace: &ns }.build();
        let dp = deployment(&ns, &sa, PlatformType::None, None);
        assert!(!container(&dp)
            .args
            .as_ref()
            .unwrap()
            .iter()
            .any(|a| a.starts_with("--oidc-storage-provider-s3")));

        let secret = HyperShiftOperatorOidcProviderS3Secret {
            namespace: &ns,
            oidc_storage_provider_s3_creds: b"creds".to_vec(),
            creds_key: "credentials".into(),
        }
        .build();
        let dp = deployment(&ns, &sa, PlatformType::None, Some(&secret));
        let args = container(&dp).args.clone().unwrap();

        assert!(args.contains(&"--oidc-storage-provider-s3-bucket-name=oidc-bucket".to_string()));
        assert!(args.contains(&"--oidc-storage-provider-s3-region=us-east-2".to_string()));
        assert!(args.contains(
            &"--oidc-storage-provider-s3-credentials=/etc/oidc-storage-provider-s3-creds/credentials"
                .to_string()
        ));
        let volume = &pod_spec(&dp).volumes.as_ref().unwrap()[0];
        assert_eq!(volume.name, "oidc-storage-provider-s3-creds");
        assert_eq!(
            volume.secret.as_ref().unwrap().secret_name.as_deref(),
            Some(OIDC_PROVIDER_S3_CREDS_SECRET_NAME)
        );
    }

    #[test]
    fn deployment_shape() {
        let ns = namespace();
        let sa = HyperShiftOperatorServiceAccount { namespace: &ns }.build();
        let dp = deployment(&ns, &sa, PlatformType::None, None);

        assert_json_diff::assert_json_include!(
            actual: serde_json::to_value(&dp).unwrap(),
            expected: serde_json::json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": { "name": "operator", "namespace": "hypershift" },
                "spec": {
                    "replicas": 1,
                    "selector": { "matchLabels": { "name": "operator" } },
                    "template": {
                        "metadata": {
                            "labels": {
                                "name": "operator",
                                "app": "operator",
                                "hypershift.openshift.io/operator-component": "operator"
                            }
                        },
                        "spec": {
                            "serviceAccountName": "operator",
                            "containers": [{
                                "name": "operator",
                                "imagePullPolicy": "Always",
                                "command": ["/usr/bin/hypershift-operator"],
                                "securityContext": { "runAsUser": 1000 },
                                "ports": [{ "name": "metrics", "containerPort": 9000, "protocol": "TCP" }],
                                "resources": { "requests": { "memory": "150Mi", "cpu": "10m" } },
                                "livenessProbe": {
                                    "httpGet": { "path": "/metrics", "port": 9000, "scheme": "HTTP" },
                                    "initialDelaySeconds": 60,
                                    "failureThreshold": 5
                                },
                                "readinessProbe": {
                                    "initialDelaySeconds": 15,
                                    "failureThreshold": 3
                                }
                            }]
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn building_is_idempotent() {
        let ns = namespace();
        let sa = HyperShiftOperatorServiceAccount { namespace: &ns }.build();
        assert_eq!(
            deployment(&ns, &sa, PlatformType::AWS, None),
            deployment(&ns, &sa, PlatformType::AWS, None)
        );
    }

    #[test]
    fn service_targets_metrics_port() {
        let ns = namespace();
        let svc = HyperShiftOperatorService { namespace: &ns }.build();
        let spec = svc.spec.unwrap();

        assert_eq!(spec.selector, Some(name_labels("operator")));
        assert_eq!(svc.metadata.labels, Some(name_labels("operator")));
        let port = &spec.ports.unwrap()[0];
        assert_eq!(port.port, 9393);
        assert_eq!(
            port.target_port,
            Some(IntOrString::String("metrics".into()))
        );
    }

    #[test]
    fn bindings_reference_role_and_service_account() {
        let ns = namespace();
        let sa = HyperShiftOperatorServiceAccount { namespace: &ns }.build();
        let cluster_role = HyperShiftOperatorClusterRole.build();
        let role = HyperShiftOperatorRole { namespace: &ns }.build();

        let crb = HyperShiftOperatorClusterRoleBinding {
            cluster_role: &cluster_role,
            service_account: &sa,
        }
        .build();
        assert_eq!(crb.role_ref.kind, "ClusterRole");
        assert_eq!(crb.role_ref.name, "hypershift-operator");
        let subject = &crb.subjects.unwrap()[0];
        assert_eq!(subject.kind, "ServiceAccount");
        assert_eq!(subject.name, "operator");
        assert_eq!(subject.namespace.as_deref(), Some("hypershift"));

        let rb = HyperShiftOperatorRoleBinding {
            role: &role,
            service_account: &sa,
        }
        .build();
        assert_eq!(rb.namespace().as_deref(), Some("hypershift"));
        assert_eq!(rb.role_ref.kind, "Role");
        assert_eq!(rb.role_ref.name, role.name_any());
    }

    #[test]
    fn cluster_role_grants_hypershift_resources() {
        let role = HyperShiftOperatorClusterRole.build();
        let rules = role.rules.unwrap();

        let hypershift = rules
            .iter()
            .find(|r| r.api_groups == Some(vec!["hypershift.openshift.io".to_string()]))
            .unwrap();
        assert_eq!(hypershift.verbs, vec!["*"]);
        assert!(rules.iter().any(|r| r
            .resources
            .as_deref()
            .unwrap_or_default()
            .contains(&"pods/log".to_string())));
    }
}
