use k8s_openapi::api::core::v1::{Namespace, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use kube::ResourceExt;

use super::{
    cluster_meta, group_subject, namespaced_meta, policy_rule, role_ref, service_account_subject,
    Asset, ALL, READ_VERBS,
};

pub const CLIENT_NAME: &str = "hypershift-client";
pub const READERS_NAME: &str = "hypershift-readers";

/// Grants full control over hosted clusters and node pools
pub struct HyperShiftClientClusterRole;

impl Asset for HyperShiftClientClusterRole {
    type Object = ClusterRole;

    fn build(&self) -> ClusterRole {
        ClusterRole {
            metadata: cluster_meta(CLIENT_NAME),
            rules: Some(vec![policy_rule(
                &["hypershift.openshift.io"],
                &["hostedclusters", "nodepools"],
                ALL,
            )]),
            ..Default::default()
        }
    }
}

pub struct HyperShiftClientServiceAccount<'a> {
    pub namespace: &'a Namespace,
}

impl Asset for HyperShiftClientServiceAccount<'_> {
    type Object = ServiceAccount;

    fn build(&self) -> ServiceAccount {
        ServiceAccount {
            metadata: namespaced_meta(self.namespace, CLIENT_NAME),
            ..Default::default()
        }
    }
}

pub struct HyperShiftClientClusterRoleBinding<'a> {
    pub cluster_role: &'a ClusterRole,
    pub service_account: &'a ServiceAccount,
    pub group_name: String,
}

impl Asset for HyperShiftClientClusterRoleBinding<'_> {
    type Object = ClusterRoleBinding;

    fn build(&self) -> ClusterRoleBinding {
        ClusterRoleBinding {
            metadata: cluster_meta(CLIENT_NAME),
            role_ref: role_ref("ClusterRole", self.cluster_role.name_any()),
            subjects: Some(vec![
                service_account_subject(self.service_account),
                group_subject(&self.group_name),
            ]),
        }
    }
}

/// Read only access to everything the operator manages
pub struct HyperShiftReaderClusterRole;

impl Asset for HyperShiftReaderClusterRole {
    type Object = ClusterRole;

    fn build(&self) -> ClusterRole {
        ClusterRole {
            metadata: cluster_meta(READERS_NAME),
            rules: Some(vec![
                policy_rule(&["hypershift.openshift.io"], ALL, READ_VERBS),
                policy_rule(&["config.openshift.io"], ALL, READ_VERBS),
                policy_rule(
                    &["apiextensions.k8s.io"],
                    &["customresourcedefinitions"],
                    READ_VERBS,
                ),
                policy_rule(&["networking.k8s.io"], &["networkpolicies"], READ_VERBS),
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
                    ],
                    ALL,
                    READ_VERBS,
                ),
                policy_rule(&["operator.openshift.io"], ALL, READ_VERBS),
                policy_rule(&["route.openshift.io"], ALL, READ_VERBS),
                policy_rule(
                    &["security.openshift.io"],
                    &["securitycontextconstraints"],
                    READ_VERBS,
                ),
                policy_rule(&["rbac.authorization.k8s.io"], ALL, READ_VERBS),
                policy_rule(
                    &[""],
                    &[
                        "events",
                        "configmaps",
                        "pods",
                        "pods/log",
                        "nodes",
                        "namespaces",
                        "serviceaccounts",
                        "services",
                    ],
                    READ_VERBS,
                ),
                policy_rule(&["apps"], &["deployments"], READ_VERBS),
                policy_rule(&["etcd.database.coreos.com"], ALL, READ_VERBS),
                policy_rule(&["machine.openshift.io"], ALL, READ_VERBS),
                policy_rule(&["monitoring.coreos.com"], &["podmonitors"], READ_VERBS),
                policy_rule(
                    &["capi-provider.agent-install.openshift.io"],
                    ALL,
                    READ_VERBS,
                ),
            ]),
            ..Default::default()
        }
    }
}

pub struct HyperShiftReaderClusterRoleBinding<'a> {
    pub cluster_role: &'a ClusterRole,
    pub group_name: String,
}

impl Asset for HyperShiftReaderClusterRoleBinding<'_> {
    type Object = ClusterRoleBinding;

    fn build(&self) -> ClusterRoleBinding {
        ClusterRoleBinding {
            metadata: cluster_meta(READERS_NAME),
            role_ref: role_ref("ClusterRole", self.cluster_role.name_any()),
            subjects: Some(vec![group_subject(&self.group_name)]),
        }
    }
}
