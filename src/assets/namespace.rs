use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Namespace;

use super::{cluster_meta, Asset};

pub struct HyperShiftNamespace {
    pub name: String,
    /// Label the namespace so that the OpenShift cluster monitoring stack scrapes it
    pub enable_ocp_cluster_monitoring: bool,
}

impl Asset for HyperShiftNamespace {
    type Object = Namespace;

    fn build(&self) -> Namespace {
        let mut metadata = cluster_meta(&self.name);
        if self.enable_ocp_cluster_monitoring {
            metadata.labels = Some(BTreeMap::from([(
                "openshift.io/cluster-monitoring".into(),
                "true".into(),
            )]));
        }

        Namespace {
            metadata,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use kube::ResourceExt;

    use super::*;

    #[test]
    fn no_labels_without_cluster_monitoring() {
        let ns = HyperShiftNamespace {
            name: "hypershift".into(),
            enable_ocp_cluster_monitoring: false,
        }
        .build();

        assert_eq!(ns.name_any(), "hypershift");
        assert!(ns.metadata.labels.is_none());
    }

    #[test]
    fn cluster_monitoring_label() {
        let ns = HyperShiftNamespace {
            name: "hypershift".into(),
            enable_ocp_cluster_monitoring: true,
        }
        .build();

        assert_eq!(
            ns.labels().get("openshift.io/cluster-monitoring"),
            Some(&"true".to_string())
        );
    }

    #[test]
    fn serializes_type_meta() {
        let ns = HyperShiftNamespace {
            name: "hypershift".into(),
            enable_ocp_cluster_monitoring: false,
        }
        .build();

        assert_json_diff::assert_json_eq!(
            serde_json::to_value(&ns).unwrap(),
            serde_json::json!({
                "apiVersion": "v1",
                "kind": "Namespace",
                "metadata": { "name": "hypershift" }
            })
        );
    }
}
