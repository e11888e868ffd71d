use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::api::rbac::v1::{Role, RoleBinding, Subject};
use kube::ResourceExt;

use super::operator::OPERATOR_NAME;
use super::{name_selector, namespaced_meta, policy_rule, role_ref, Asset, READ_VERBS};
use crate::resources::prometheusrules::{PrometheusRule, PrometheusRuleSpec, Rule, RuleGroup};
use crate::resources::servicemonitors::{Endpoint, ServiceMonitor, ServiceMonitorSpec};

const PROMETHEUS_NAME: &str = "prometheus";

/// Lets Prometheus discover scrape targets in the operator namespace
pub struct HyperShiftPrometheusRole<'a> {
    pub namespace: &'a Namespace,
}

impl Asset for HyperShiftPrometheusRole<'_> {
    type Object = Role;

    fn build(&self) -> Role {
        Role {
            metadata: namespaced_meta(self.namespace, PROMETHEUS_NAME),
            rules: Some(vec![policy_rule(
                &[""],
                &["services", "endpoints", "pods"],
                READ_VERBS,
            )]),
        }
    }
}

pub struct HyperShiftOperatorPrometheusRoleBinding<'a> {
    pub namespace: &'a Namespace,
    pub role: &'a Role,
    pub enable_ocp_cluster_monitoring: bool,
}

impl Asset for HyperShiftOperatorPrometheusRoleBinding<'_> {
    type Object = RoleBinding;

    fn build(&self) -> RoleBinding {
        // user workload monitoring scrapes unless the platform stack was asked for
        let (name, namespace) = if self.enable_ocp_cluster_monitoring {
            ("prometheus-k8s", "openshift-monitoring")
        } else {
            (
                "prometheus-user-workload",
                "openshift-user-workload-monitoring",
            )
        };

        RoleBinding {
            metadata: namespaced_meta(self.namespace, PROMETHEUS_NAME),
            role_ref: role_ref("Role", self.role.name_any()),
            subjects: Some(vec![Subject {
                kind: "ServiceAccount".into(),
                name: name.into(),
                namespace: Some(namespace.into()),
                api_group: None,
            }]),
        }
    }
}

pub struct HyperShiftServiceMonitor<'a> {
    pub namespace: &'a Namespace,
}

impl Asset for HyperShiftServiceMonitor<'_> {
    type Object = ServiceMonitor;

    fn build(&self) -> ServiceMonitor {
        let mut monitor = ServiceMonitor::new(
            OPERATOR_NAME,
            ServiceMonitorSpec {
                job_label: Some("component".into()),
                selector: name_selector(OPERATOR_NAME),
                endpoints: vec![Endpoint {
                    interval: Some("30s".into()),
                    port: Some("metrics".into()),
                    ..Default::default()
                }],
                ..Default::default()
            },
        );
        monitor.metadata.namespace = Some(self.namespace.name_any());
        monitor
    }
}

pub struct HypershiftRecordingRule<'a> {
    pub namespace: &'a Namespace,
}

impl Asset for HypershiftRecordingRule<'_> {
    type Object = PrometheusRule;

    fn build(&self) -> PrometheusRule {
        let mut rule = PrometheusRule::new("metrics", recording_rule_spec());
        rule.metadata.namespace = Some(self.namespace.name_any());
        rule
    }
}

fn recording_rule_spec() -> PrometheusRuleSpec {
    PrometheusRuleSpec {
        groups: vec![RuleGroup {
            name: "hypershift.rules".into(),
            interval: None,
            rules: vec![
                Rule::recording(
                    "platform:hypershift_hostedclusters:max",
                    "max by(platform) (hypershift_hostedclusters)",
                ),
                Rule::recording(
                    "platform:hypershift_nodepools:max",
                    "max by(platform) (hypershift_nodepools)",
                ),
                Rule::recording(
                    "hypershift:operator:component_api_requests_total",
                    r#"sum by (namespace, code, method) (rest_client_requests_total{job="operator"})"#,
                ),
            ],
        }],
    }
}
