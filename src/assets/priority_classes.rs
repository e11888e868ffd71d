use k8s_openapi::api::scheduling::v1::PriorityClass;

use super::{cluster_meta, Asset};

/// For etcd pods.
pub const ETCD_PRIORITY_CLASS: &str = "hypershift-etcd";

/// For pods that are required for API calls and resource admission to succeed, such as
/// kube-apiserver, aggregated API servers and webhooks.
pub const API_CRITICAL_PRIORITY_CLASS: &str = "hypershift-api-critical";

/// For control plane pods that are not API critical but still need elevated priority.
pub const DEFAULT_PRIORITY_CLASS: &str = "hypershift-control-plane";

fn priority_class(name: &str, value: i32, description: &str) -> PriorityClass {
    PriorityClass {
        metadata: cluster_meta(name),
        value,
        global_default: Some(false),
        description: Some(description.into()),
        ..Default::default()
    }
}

pub struct HyperShiftControlPlanePriorityClass;

impl Asset for HyperShiftControlPlanePriorityClass {
    type Object = PriorityClass;

    fn build(&self) -> PriorityClass {
        priority_class(
            DEFAULT_PRIORITY_CLASS,
            100000000,
            "This priority class should be used for hypershift control plane pods not critical to serving the API.",
        )
    }
}

pub struct HyperShiftApiCriticalPriorityClass;

impl Asset for HyperShiftApiCriticalPriorityClass {
    type Object = PriorityClass;

    fn build(&self) -> PriorityClass {
        priority_class(
            API_CRITICAL_PRIORITY_CLASS,
            100001000,
            "This priority class should be used for hypershift control plane pods critical to serving the API.",
        )
    }
}

pub struct HyperShiftEtcdPriorityClass;

impl Asset for HyperShiftEtcdPriorityClass {
    type Object = PriorityClass;

    fn build(&self) -> PriorityClass {
        priority_class(
            ETCD_PRIORITY_CLASS,
            100002000,
            "This priority class should be used for hypershift etcd pods.",
        )
    }
}
