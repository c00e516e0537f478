//! Typed, validated ingress rule set.
//!
//! An [`IngressSpec`] is built exactly once, either from an ingress manifest
//! ([`IngressSpec::from_manifest`], [`IngressSpec::from_value`],
//! [`IngressSpec::from_yaml_str`]) or programmatically through
//! [`IngressSpec::builder`]. Every [`Backend`] it contains is fully specified,
//! so routing never has to deal with half-parsed input. The value has no
//! mutation API and is shared between requests behind an `Arc`.
use std::fmt;

use http::uri::Authority as UriAuthority;
use thiserror::Error;

use crate::core::manifest::{IngressManifest, ManifestBackend};

/// Errors raised while building an [`IngressSpec`]. Both are fatal to startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngressError {
    /// The source object is not shaped like an ingress resource
    #[error("Malformed ingress: {0}")]
    Malformed(String),

    /// A field has the right shape but an unusable value
    #[error("Invalid ingress field '{field}': {message}")]
    Validation { field: String, message: String },
}

/// Result type for rule model operations
pub type IngressResult<T> = Result<T, IngressError>;

/// `host:port` authority a request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Authority(String);

impl Authority {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named network endpoint. Name resolution is left to the system resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    service_name: String,
    port: u16,
}

impl Backend {
    /// Create a backend, rejecting empty names, port 0 and names that cannot
    /// form a valid URI authority.
    pub fn new(service_name: impl Into<String>, port: u16) -> IngressResult<Self> {
        Self::checked(service_name.into(), i64::from(port), "backend")
    }

    fn checked(service_name: String, port: i64, field: &str) -> IngressResult<Self> {
        if service_name.trim().is_empty() {
            return Err(IngressError::Validation {
                field: format!("{field}.service.name"),
                message: "Service name is required".to_string(),
            });
        }

        let port = u16::try_from(port)
            .ok()
            .filter(|port| *port > 0)
            .ok_or_else(|| IngressError::Validation {
                field: format!("{field}.service.port.number"),
                message: format!("Port must be between 1 and 65535, got {port}"),
            })?;

        if format!("{service_name}:{port}").parse::<UriAuthority>().is_err() {
            return Err(IngressError::Validation {
                field: format!("{field}.service.name"),
                message: format!("'{service_name}' is not a valid host name"),
            });
        }

        Ok(Self { service_name, port })
    }

    fn from_manifest(backend: &ManifestBackend, field: &str) -> IngressResult<Self> {
        let service = match (&backend.service, &backend.resource) {
            (Some(service), _) => service,
            (None, Some(_)) => {
                return Err(IngressError::Malformed(format!(
                    "{field}: resource backends are not supported, a service backend is required"
                )));
            }
            (None, None) => {
                return Err(IngressError::Malformed(format!(
                    "{field}: backend has no service"
                )));
            }
        };

        let name = service.name.clone().unwrap_or_default();
        let port = service.port.as_ref().ok_or_else(|| IngressError::Validation {
            field: format!("{field}.service.port"),
            message: "Service port is required".to_string(),
        })?;

        match (port.number, &port.name) {
            (Some(number), _) => Self::checked(name, number, field),
            (None, Some(port_name)) => Err(IngressError::Validation {
                field: format!("{field}.service.port"),
                message: format!("Named port '{port_name}' cannot be resolved, use a port number"),
            }),
            (None, None) => Err(IngressError::Validation {
                field: format!("{field}.service.port.number"),
                message: "Service port number is required".to_string(),
            }),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn authority(&self) -> Authority {
        Authority(format!("{}:{}", self.service_name, self.port))
    }
}

/// Prefix to backend mapping inside a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    path_prefix: String,
    backend: Backend,
}

impl PathRule {
    pub fn new(path_prefix: impl Into<String>, backend: Backend) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            backend,
        }
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Plain string prefix test; an empty prefix matches every path.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.path_prefix)
    }
}

/// Host scoped group of path rules.
///
/// A rule with no paths never matches any request path. It still claims its
/// host, so later rules for the same host are not consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    host: String,
    paths: Vec<PathRule>,
}

impl Rule {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            paths: Vec::new(),
        }
    }

    /// Append a path rule; declaration order is evaluation order.
    pub fn path(mut self, path_prefix: impl Into<String>, backend: Backend) -> Self {
        self.paths.push(PathRule::new(path_prefix, backend));
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn paths(&self) -> &[PathRule] {
        &self.paths
    }

    /// Exact, case-sensitive comparison. The empty host matches any request.
    pub fn matches_host(&self, host: &str) -> bool {
        self.host.is_empty() || self.host == host
    }
}

/// Immutable routing table: ordered rules plus an optional default backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngressSpec {
    name: Option<String>,
    default_backend: Option<Backend>,
    rules: Vec<Rule>,
}

impl IngressSpec {
    pub fn builder() -> IngressSpecBuilder {
        IngressSpecBuilder::default()
    }

    /// Convert a deserialized manifest, checking shape and field values.
    pub fn from_manifest(manifest: &IngressManifest) -> IngressResult<Self> {
        if !manifest.is_ingress() {
            return Err(IngressError::Malformed(format!(
                "expected kind 'Ingress' in group 'networking.k8s.io', got kind '{}' with apiVersion '{}'",
                manifest.kind, manifest.api_version
            )));
        }

        let Some(spec) = &manifest.spec else {
            return Ok(Self {
                name: manifest.metadata.name.clone(),
                ..Self::default()
            });
        };

        let default_backend = spec
            .default_backend
            .as_ref()
            .map(|backend| Backend::from_manifest(backend, "spec.defaultBackend"))
            .transpose()?;

        let mut rules = Vec::with_capacity(spec.rules.len());
        for (rule_idx, rule) in spec.rules.iter().enumerate() {
            let mut parsed = Rule::new(rule.host.clone().unwrap_or_default());
            let paths = rule.http.as_ref().map(|http| http.paths.as_slice());
            for (path_idx, path) in paths.unwrap_or_default().iter().enumerate() {
                let field = format!("spec.rules[{rule_idx}].http.paths[{path_idx}].backend");
                let backend = Backend::from_manifest(&path.backend, &field)?;
                parsed = parsed.path(path.path.clone().unwrap_or_default(), backend);
            }
            rules.push(parsed);
        }

        Ok(Self {
            name: manifest.metadata.name.clone(),
            default_backend,
            rules,
        })
    }

    /// Parse an already structured object (e.g. decoded by another layer).
    pub fn from_value(value: serde_json::Value) -> IngressResult<Self> {
        let manifest: IngressManifest = serde_json::from_value(value)
            .map_err(|e| IngressError::Malformed(e.to_string()))?;
        Self::from_manifest(&manifest)
    }

    /// Parse YAML (or JSON, which is a YAML subset) manifest text.
    pub fn from_yaml_str(source: &str) -> IngressResult<Self> {
        let manifest: IngressManifest =
            serde_yaml::from_str(source).map_err(|e| IngressError::Malformed(e.to_string()))?;
        Self::from_manifest(&manifest)
    }

    /// `metadata.name` of the source manifest, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn default_backend(&self) -> Option<&Backend> {
        self.default_backend.as_ref()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// True when no request can ever be routed (no rules, no default backend).
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.default_backend.is_none()
    }

    /// Every backend referenced, in declaration order, default first.
    pub fn backends(&self) -> impl Iterator<Item = &Backend> {
        self.default_backend.iter().chain(
            self.rules
                .iter()
                .flat_map(|rule| rule.paths.iter().map(PathRule::backend)),
        )
    }
}

/// Builder for [`IngressSpec`] used by embedders and tests.
#[derive(Debug, Default)]
pub struct IngressSpecBuilder {
    name: Option<String>,
    default_backend: Option<Backend>,
    rules: Vec<Rule>,
}

impl IngressSpecBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn default_backend(mut self, backend: Backend) -> Self {
        self.default_backend = Some(backend);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> IngressSpec {
        IngressSpec {
            name: self.name,
            default_backend: self.default_backend,
            rules: self.rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn service(name: &str, port: i64) -> serde_json::Value {
        json!({ "service": { "name": name, "port": { "number": port } } })
    }

    #[test]
    fn test_from_value_path_based() {
        let spec = IngressSpec::from_value(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": { "name": "test" },
            "spec": {
                "rules": [{
                    "host": "foo.bar.com",
                    "http": { "paths": [
                        { "path": "/foo", "backend": service("svc-a", 8080) },
                        { "path": "/bar", "backend": service("svc-b", 9090) }
                    ]}
                }]
            }
        }))
        .unwrap();

        assert_eq!(spec.name(), Some("test"));
        assert!(spec.default_backend().is_none());
        assert_eq!(spec.rules().len(), 1);

        let rule = &spec.rules()[0];
        assert_eq!(rule.host(), "foo.bar.com");
        assert_eq!(rule.paths()[0].path_prefix(), "/foo");
        assert_eq!(rule.paths()[0].backend().authority().as_str(), "svc-a:8080");
        assert_eq!(rule.paths()[1].backend().authority().as_str(), "svc-b:9090");
    }

    #[test]
    fn test_missing_path_and_host_default_to_empty() {
        let spec = IngressSpec::from_value(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "spec": { "rules": [{ "http": { "paths": [{ "backend": service("svc", 80) }] } }] }
        }))
        .unwrap();

        let rule = &spec.rules()[0];
        assert_eq!(rule.host(), "");
        assert_eq!(rule.paths()[0].path_prefix(), "");
    }

    #[test]
    fn test_rule_without_http_has_no_paths() {
        let spec = IngressSpec::from_value(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "spec": { "rules": [{ "host": "foo.bar.com" }] }
        }))
        .unwrap();

        assert_eq!(spec.rules().len(), 1);
        assert!(spec.rules()[0].paths().is_empty());
    }

    #[test]
    fn test_missing_spec_is_empty() {
        let spec = IngressSpec::from_yaml_str(
            "apiVersion: networking.k8s.io/v1\nkind: Ingress\nmetadata:\n  name: test\n",
        )
        .unwrap();
        assert!(spec.is_empty());
        assert_eq!(spec.name(), Some("test"));
    }

    #[test]
    fn test_wrong_kind_is_malformed() {
        let err = IngressSpec::from_value(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "spec": {}
        }))
        .unwrap_err();
        assert!(matches!(err, IngressError::Malformed(_)));
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let err = IngressSpec::from_value(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "spec": { "rules": "not-a-list" }
        }))
        .unwrap_err();
        assert!(matches!(err, IngressError::Malformed(_)));

        let err = IngressSpec::from_yaml_str("just a string").unwrap_err();
        assert!(matches!(err, IngressError::Malformed(_)));
    }

    #[test]
    fn test_resource_backend_is_malformed() {
        let err = IngressSpec::from_value(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "spec": { "defaultBackend": { "resource": { "kind": "StorageBucket", "name": "b" } } }
        }))
        .unwrap_err();
        assert!(matches!(err, IngressError::Malformed(_)));
    }

    #[test]
    fn test_missing_service_name_is_invalid() {
        let err = IngressSpec::from_value(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "spec": { "defaultBackend": { "service": { "port": { "number": 80 } } } }
        }))
        .unwrap_err();
        match err {
            IngressError::Validation { field, .. } => {
                assert_eq!(field, "spec.defaultBackend.service.name");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_and_oversized_ports_are_invalid() {
        for port in [0, -1, 65536] {
            let err = IngressSpec::from_value(json!({
                "apiVersion": "networking.k8s.io/v1",
                "kind": "Ingress",
                "spec": { "rules": [{ "host": "a", "http": { "paths": [
                    { "path": "/", "backend": service("svc", port) }
                ]}}]}
            }))
            .unwrap_err();
            match err {
                IngressError::Validation { field, .. } => assert_eq!(
                    field,
                    "spec.rules[0].http.paths[0].backend.service.port.number"
                ),
                other => panic!("expected validation error for port {port}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_named_port_is_invalid() {
        let err = IngressSpec::from_value(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "spec": { "defaultBackend": { "service": { "name": "svc", "port": { "name": "http" } } } }
        }))
        .unwrap_err();
        assert!(matches!(err, IngressError::Validation { .. }));
    }

    #[test]
    fn test_backend_new_validates() {
        assert!(Backend::new("svc", 80).is_ok());
        assert!(Backend::new("", 80).is_err());
        assert!(Backend::new("svc", 0).is_err());
        assert!(Backend::new("bad host", 80).is_err());
    }

    #[test]
    fn test_builder_and_backends_order() {
        let spec = IngressSpec::builder()
            .default_backend(Backend::new("fallback", 80).unwrap())
            .rule(
                Rule::new("foo.bar.com")
                    .path("/foo", Backend::new("a", 1).unwrap())
                    .path("/bar", Backend::new("b", 2).unwrap()),
            )
            .build();

        let authorities: Vec<String> = spec
            .backends()
            .map(|backend| backend.authority().to_string())
            .collect();
        assert_eq!(authorities, vec!["fallback:80", "a:1", "b:2"]);
        assert!(!spec.is_empty());
    }

    #[test]
    fn test_host_matching_is_exact() {
        let rule = Rule::new("foo.bar.com");
        assert!(rule.matches_host("foo.bar.com"));
        assert!(!rule.matches_host("FOO.bar.com"));
        assert!(!rule.matches_host("foo.bar.com:8080"));
        assert!(Rule::new("").matches_host("anything"));
    }
}
