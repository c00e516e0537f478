//! Wire shape of an ingress description.
//!
//! These types mirror the `networking.k8s.io/v1` `Ingress` resource closely
//! enough to deserialize real manifests. They are deliberately permissive
//! (everything optional, unknown fields ignored) so that shape checks and
//! field validation happen in one place, [`IngressSpec::from_manifest`].
//!
//! [`IngressSpec::from_manifest`]: crate::core::IngressSpec::from_manifest
use serde::{Deserialize, Serialize};

/// API group every accepted manifest must belong to.
pub const INGRESS_API_GROUP: &str = "networking.k8s.io";

/// Resource kind every accepted manifest must declare.
pub const INGRESS_KIND: &str = "Ingress";

/// Top level ingress resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressManifest {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: Option<ManifestSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSpec {
    #[serde(default)]
    pub default_backend: Option<ManifestBackend>,
    #[serde(default)]
    pub rules: Vec<ManifestRule>,
}

/// Host scoped rule. A missing `http` block is legal and yields no paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestRule {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub http: Option<ManifestHttp>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestHttp {
    #[serde(default)]
    pub paths: Vec<ManifestPath>,
}

/// Path entry. `path_type` is accepted for compatibility but matching is
/// always a plain string prefix test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPath {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub path_type: Option<String>,
    pub backend: ManifestBackend,
}

/// Backend reference. Only service backends can be routed to; `resource`
/// backends are rejected as malformed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestBackend {
    #[serde(default)]
    pub service: Option<ServiceBackend>,
    #[serde(default)]
    pub resource: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceBackend {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub port: Option<ServiceBackendPort>,
}

/// Port is kept signed so out-of-range values reach validation instead of
/// failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceBackendPort {
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl IngressManifest {
    /// Whether `apiVersion` and `kind` identify an ingress resource.
    pub fn is_ingress(&self) -> bool {
        let group = self
            .api_version
            .split_once('/')
            .map(|(group, _)| group)
            .unwrap_or_default();
        self.kind == INGRESS_KIND && group == INGRESS_API_GROUP
    }
}
