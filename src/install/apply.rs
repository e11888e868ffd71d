use std::time::Duration;

use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{ApiResource, DynamicObject, Patch, PatchParams};
use kube::core::GroupVersionKind;
use kube::runtime::wait::{await_condition, Condition};
use kube::{Api, Client, ResourceExt};
use tracing::{debug, info, instrument};

use crate::assets::operator::OPERATOR_NAME;
use crate::{Error, Result};

pub const FIELD_MANAGER: &str = "hypershift";

fn api_for(client: &Client, manifest: &DynamicObject) -> Result<Api<DynamicObject>> {
    let types = manifest.types.as_ref().ok_or_else(|| {
        Error::InvalidManifest(format!("{} has no apiVersion or kind", manifest.name_any()))
    })?;
    let gvk = GroupVersionKind::try_from(types)
        .map_err(|e| Error::InvalidManifest(format!("{}: {e}", types.api_version)))?;
    let resource = ApiResource::from_gvk(&gvk);

    Ok(match manifest.namespace() {
        Some(namespace) => Api::namespaced_with(client.clone(), &namespace, &resource),
        None => Api::all_with(client.clone(), &resource),
    })
}

/// Server-side apply every manifest in order, taking ownership of conflicting fields
#[instrument(skip_all, fields(count = manifests.len()))]
pub async fn apply_manifests(client: &Client, manifests: &[DynamicObject]) -> Result<()> {
    let params = PatchParams::apply(FIELD_MANAGER).force();
    for manifest in manifests {
        let name = manifest
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| Error::InvalidManifest("object has no name".into()))?;
        let api = api_for(client, manifest)?;
        let kind = manifest
            .types
            .as_ref()
            .map(|t| t.kind.as_str())
            .unwrap_or_default();

        debug!("Applying {} {}", kind, name);
        api.patch(name, &params, &Patch::Apply(manifest)).await?;
        info!("Applied {} {}", kind, name);
    }
    Ok(())
}

/// Completes once the Deployment controller has observed the latest template and
/// every desired replica runs it and is available.
pub fn is_rollout_complete() -> impl Condition<Deployment> {
    |deployment: Option<&Deployment>| {
        let Some(deployment) = deployment else {
            return false;
        };
        let Some(status) = &deployment.status else {
            return false;
        };

        // a status from before the last apply says nothing about the new template
        if status.observed_generation.unwrap_or(0) < deployment.metadata.generation.unwrap_or(0) {
            return false;
        }

        let desired = deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(1);
        let updated = status.updated_replicas.unwrap_or(0);

        updated >= desired
            && status.replicas.unwrap_or(0) <= updated
            && status.available_replicas.unwrap_or(0) >= updated
    }
}

/// Block until the operator Deployment has rolled out
pub async fn wait_for_operator(client: &Client, namespace: &str, timeout: Duration) -> Result<()> {
    let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    info!("Waiting up to {:?} for the operator to become available", timeout);

    let available = await_condition(api, OPERATOR_NAME, is_rollout_complete());
    match tokio::time::timeout(timeout, available).await {
        Ok(result) => {
            result?;
            info!("The operator is available");
            Ok(())
        }
        Err(_) => Err(Error::WaitTimeout {
            name: OPERATOR_NAME.into(),
            timeout,
        }),
    }
}
