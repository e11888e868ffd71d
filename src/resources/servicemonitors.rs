use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ServiceMonitor defines monitoring for a set of services
/// API: monitoring.coreos.com/v1
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "monitoring.coreos.com",
    version = "v1",
    kind = "ServiceMonitor",
    plural = "servicemonitors",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMonitorSpec {
    /// The label to use to retrieve the job name from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_label: Option<String>,

    /// Selector to select Endpoints objects
    pub selector: LabelSelector,

    /// Selector to select which namespaces the Endpoints objects are discovered from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<NamespaceSelector>,

    /// A list of endpoints allowed as part of this ServiceMonitor
    pub endpoints: Vec<Endpoint>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSelector {
    /// Boolean describing whether all namespaces are selected in contrast to a list restricting them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<bool>,

    /// List of namespace names to select from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_names: Option<Vec<String>>,
}

/// Endpoint defines a scrapeable endpoint serving Prometheus metrics
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Name of the service port this endpoint refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,

    /// Interval at which metrics should be scraped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// HTTP path to scrape for metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// HTTP scheme to use for scraping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}
