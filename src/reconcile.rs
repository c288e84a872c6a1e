//! Create-or-patch reconciliation for rendered manifests.
//!
//! One idempotent-apply primitive: read the resource; if it exists, patch it
//! with the full rendered body; if the read comes back 404, create it; any
//! other error aborts with the underlying reason. No diff is computed and the
//! whole body is sent verbatim on every patch.
//!
//! The cluster calls sit behind [`ResourceOps`] so the decision logic can be
//! exercised against a fake client without a cluster.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, DynamicObject, Patch, PatchParams, PostParams};
use kube::discovery::ApiResource;
use kube::Client;
use tracing::debug;

use crate::{Error, Result};

/// KEDA ScaledObject custom resource coordinates.
pub const SCALED_OBJECT_GROUP: &str = "keda.sh";
pub const SCALED_OBJECT_VERSION: &str = "v1alpha1";
pub const SCALED_OBJECT_PLURAL: &str = "scaledobjects";

/// How a resource was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Created,
    Patched,
}

/// Read/create/patch operations for one resource kind in one namespace.
#[async_trait]
pub trait ResourceOps {
    /// Human-readable kind, for messages.
    fn kind(&self) -> &str;

    /// Existence probe. Must surface a 404 as an error for which
    /// [`Error::is_not_found`] returns true.
    async fn read(&self, name: &str) -> Result<()>;

    async fn create(&self, body: &serde_json::Value) -> Result<()>;

    async fn patch(&self, name: &str, body: &serde_json::Value) -> Result<()>;
}

/// Apply a rendered body: patch if the resource exists, create on 404.
pub async fn apply<C: ResourceOps + ?Sized>(
    ops: &C,
    name: &str,
    body: &serde_json::Value,
) -> Result<Applied> {
    match ops.read(name).await {
        Ok(()) => {
            debug!(kind = ops.kind(), name, "resource exists, patching");
            ops.patch(name, body).await?;
            Ok(Applied::Patched)
        }
        Err(e) if e.is_not_found() => {
            debug!(kind = ops.kind(), name, "resource not found, creating");
            ops.create(body).await?;
            Ok(Applied::Created)
        }
        Err(e) => Err(e),
    }
}

/// [`ResourceOps`] over the apps/v1 Deployment API.
pub struct DeploymentOps {
    api: Api<Deployment>,
}

impl DeploymentOps {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
        }
    }
}

#[async_trait]
impl ResourceOps for DeploymentOps {
    fn kind(&self) -> &str {
        "Deployment"
    }

    async fn read(&self, name: &str) -> Result<()> {
        self.api.get(name).await.map_err(Error::from)?;
        Ok(())
    }

    async fn create(&self, body: &serde_json::Value) -> Result<()> {
        let deployment: Deployment = serde_json::from_value(body.clone())?;
        self.api
            .create(&PostParams::default(), &deployment)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn patch(&self, name: &str, body: &serde_json::Value) -> Result<()> {
        self.api
            .patch(name, &PatchParams::default(), &Patch::Strategic(body.clone()))
            .await
            .map_err(Error::from)?;
        Ok(())
    }
}

/// The KEDA ScaledObject [`ApiResource`].
pub fn scaled_object_resource() -> ApiResource {
    ApiResource {
        group: SCALED_OBJECT_GROUP.to_string(),
        version: SCALED_OBJECT_VERSION.to_string(),
        api_version: format!("{}/{}", SCALED_OBJECT_GROUP, SCALED_OBJECT_VERSION),
        kind: "ScaledObject".to_string(),
        plural: SCALED_OBJECT_PLURAL.to_string(),
    }
}

/// [`ResourceOps`] over the keda.sh/v1alpha1 ScaledObject custom resource.
pub struct ScaledObjectOps {
    api: Api<DynamicObject>,
}

impl ScaledObjectOps {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced_with(client, namespace, &scaled_object_resource()),
        }
    }
}

#[async_trait]
impl ResourceOps for ScaledObjectOps {
    fn kind(&self) -> &str {
        "ScaledObject"
    }

    async fn read(&self, name: &str) -> Result<()> {
        self.api.get(name).await.map_err(Error::from)?;
        Ok(())
    }

    async fn create(&self, body: &serde_json::Value) -> Result<()> {
        let object: DynamicObject = serde_json::from_value(body.clone())?;
        self.api
            .create(&PostParams::default(), &object)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn patch(&self, name: &str, body: &serde_json::Value) -> Result<()> {
        self.api
            .patch(name, &PatchParams::default(), &Patch::Merge(body.clone()))
            .await
            .map_err(Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn not_found() -> Error {
        Error::Api(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        }))
    }

    fn forbidden() -> Error {
        Error::Api(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "forbidden".to_string(),
            reason: "Forbidden".to_string(),
            code: 403,
        }))
    }

    /// Fake client recording which path the reconciler took.
    struct FakeOps {
        read_result: Mutex<Option<Error>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeOps {
        fn with_read(result: Option<Error>) -> Self {
            Self {
                read_result: Mutex::new(result),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceOps for FakeOps {
        fn kind(&self) -> &str {
            "Fake"
        }

        async fn read(&self, _name: &str) -> Result<()> {
            self.calls.lock().unwrap().push("read");
            match self.read_result.lock().unwrap().take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        async fn create(&self, _body: &serde_json::Value) -> Result<()> {
            self.calls.lock().unwrap().push("create");
            Ok(())
        }

        async fn patch(&self, _name: &str, _body: &serde_json::Value) -> Result<()> {
            self.calls.lock().unwrap().push("patch");
            Ok(())
        }
    }

    fn body() -> serde_json::Value {
        serde_json::json!({ "kind": "Fake", "metadata": { "name": "api" } })
    }

    #[tokio::test]
    async fn existing_resource_is_patched() {
        let ops = FakeOps::with_read(None);
        let applied = apply(&ops, "api", &body()).await.unwrap();
        assert_eq!(applied, Applied::Patched);
        assert_eq!(ops.calls(), vec!["read", "patch"]);
    }

    #[tokio::test]
    async fn missing_resource_is_created() {
        let ops = FakeOps::with_read(Some(not_found()));
        let applied = apply(&ops, "api", &body()).await.unwrap();
        assert_eq!(applied, Applied::Created);
        assert_eq!(ops.calls(), vec!["read", "create"]);
    }

    #[tokio::test]
    async fn other_read_error_aborts() {
        let ops = FakeOps::with_read(Some(forbidden()));
        let err = apply(&ops, "api", &body()).await.unwrap_err();
        assert!(!err.is_not_found());
        // Neither branch was taken
        assert_eq!(ops.calls(), vec!["read"]);
    }

    #[test]
    fn scaled_object_resource_coordinates() {
        let ar = scaled_object_resource();
        assert_eq!(ar.api_version, "keda.sh/v1alpha1");
        assert_eq!(ar.plural, "scaledobjects");
        assert_eq!(ar.kind, "ScaledObject");
    }
}
