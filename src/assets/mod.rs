use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    HTTPGetAction, Namespace, Probe, SecretVolumeSource, ServiceAccount, Volume, VolumeMount,
};
use k8s_openapi::api::rbac::v1::{PolicyRule, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::{Resource, ResourceExt};
use serde::Serialize;

pub mod client;
pub mod external_dns;
pub mod monitoring;
pub mod namespace;
pub mod operator;
pub mod platform;
pub mod priority_classes;
pub mod secrets;

pub use platform::PlatformType;

/// Label set on the pods of every workload deployed by the installer
pub const OPERATOR_COMPONENT_LABEL: &str = "hypershift.openshift.io/operator-component";

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

pub(crate) const READ_VERBS: &[&str] = &["get", "list", "watch"];
pub(crate) const ALL: &[&str] = &["*"];

/// A configuration holder that knows how to produce a single Kubernetes object.
///
/// Building is pure: the same configuration always produces the same object.
pub trait Asset {
    type Object: Resource<DynamicType = ()> + Serialize;

    fn build(&self) -> Self::Object;
}

/// Metadata for a cluster scoped object
pub fn cluster_meta(name: impl Into<String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        ..Default::default()
    }
}

/// Metadata for an object living in the given namespace
pub fn namespaced_meta(namespace: &Namespace, name: impl Into<String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        namespace: Some(namespace.name_any()),
        ..Default::default()
    }
}

pub(crate) fn name_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("name".into(), name.into())])
}

// pods carry the selector label plus app and component labels
pub(crate) fn pod_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("name".into(), name.into()),
        ("app".into(), name.into()),
        (OPERATOR_COMPONENT_LABEL.into(), name.into()),
    ])
}

pub(crate) fn name_selector(name: &str) -> LabelSelector {
    LabelSelector {
        match_labels: Some(name_labels(name)),
        match_expressions: None,
    }
}

pub(crate) fn policy_rule(api_groups: &[&str], resources: &[&str], verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(api_groups.iter().map(|g| (*g).into()).collect()),
        resources: Some(resources.iter().map(|r| (*r).into()).collect()),
        verbs: verbs.iter().map(|v| (*v).into()).collect(),
        ..Default::default()
    }
}

pub(crate) fn role_ref(kind: &str, name: String) -> RoleRef {
    RoleRef {
        api_group: RBAC_API_GROUP.into(),
        kind: kind.into(),
        name,
    }
}

pub(crate) fn service_account_subject(sa: &ServiceAccount) -> Subject {
    Subject {
        kind: "ServiceAccount".into(),
        name: sa.name_any(),
        namespace: sa.namespace(),
        api_group: None,
    }
}

pub(crate) fn group_subject(name: &str) -> Subject {
    Subject {
        kind: "Group".into(),
        api_group: Some(RBAC_API_GROUP.into()),
        name: name.into(),
        namespace: None,
    }
}

pub(crate) fn secret_volume(name: &str, secret_name: String) -> Volume {
    Volume {
        name: name.into(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret_name),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(crate) fn volume_mount(name: &str, mount_path: &str) -> VolumeMount {
    VolumeMount {
        name: name.into(),
        mount_path: mount_path.into(),
        ..Default::default()
    }
}

/// Timing of a probe, in seconds: initial delay, period, success and failure thresholds, timeout
pub(crate) struct ProbeTiming(pub i32, pub i32, pub i32, pub i32, pub i32);

pub(crate) fn http_probe(path: &str, port: i32, timing: ProbeTiming) -> Probe {
    let ProbeTiming(initial_delay, period, success, failure, timeout) = timing;
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(path.into()),
            port: IntOrString::Int(port),
            scheme: Some("HTTP".into()),
            ..Default::default()
        }),
        initial_delay_seconds: Some(initial_delay),
        period_seconds: Some(period),
        success_threshold: Some(success),
        failure_threshold: Some(failure),
        timeout_seconds: Some(timeout),
        ..Default::default()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::{Container, EnvVar, Namespace, PodSpec};

    use super::namespace::HyperShiftNamespace;
    use super::Asset;

    pub fn namespace() -> Namespace {
        HyperShiftNamespace {
            name: "hypershift".into(),
            enable_ocp_cluster_monitoring: false,
        }
        .build()
    }

    pub fn pod_spec(deployment: &Deployment) -> &PodSpec {
        deployment
            .spec
            .as_ref()
            .and_then(|s| s.template.spec.as_ref())
            .expect("deployment has a pod spec")
    }

    pub fn container(deployment: &Deployment) -> &Container {
        &pod_spec(deployment).containers[0]
    }

    pub fn env_value<'a>(container: &'a Container, name: &str) -> Option<&'a str> {
        container
            .env
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|e: &&EnvVar| e.name == name)
            .and_then(|e| e.value.as_deref())
    }
}
