use kube::api::DynamicObject;
use serde_json::json;

use crate::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// A stream of YAML documents
    #[default]
    Yaml,
    /// A single v1 List object
    Json,
}

/// Serialize manifests for piping into `kubectl apply -f -`
pub fn render(manifests: &[DynamicObject], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => {
            let mut out = String::new();
            for manifest in manifests {
                out.push_str("---\n");
                out.push_str(&serde_yaml::to_string(manifest)?);
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
            "apiVersion": "v1",
            "kind": "List",
            "metadata": {},
            "items": manifests,
        }))?),
    }
}
