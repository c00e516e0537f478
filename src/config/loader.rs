use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::{config::models::ServerConfig, core::IngressSpec};

/// Load configuration from a file using the config crate
/// Supports multiple formats: YAML, JSON, TOML, etc.
pub async fn load_config(config_path: &str) -> Result<ServerConfig> {
    load_config_sync(config_path)
}

/// Load configuration synchronously
pub fn load_config_sync(config_path: &str) -> Result<ServerConfig> {
    let config_path = Path::new(config_path);

    // Determine file format based on extension
    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        _ => FileFormat::Yaml,
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let server_config: ServerConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(server_config)
}

/// Resolve the ingress manifest location relative to the config file.
pub fn resolve_ingress_path(config_path: &str, config: &ServerConfig) -> PathBuf {
    let ingress_path = Path::new(&config.ingress_path);
    if ingress_path.is_absolute() {
        return ingress_path.to_path_buf();
    }
    Path::new(config_path)
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(ingress_path)
}

/// Read and parse an ingress manifest (YAML or JSON).
///
/// Malformed or invalid manifests are returned as errors; the caller must not
/// start serving with a partially built rule set.
pub async fn load_ingress(path: impl AsRef<Path>) -> Result<IngressSpec> {
    let path = path.as_ref();
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read ingress manifest {}", path.display()))?;

    IngressSpec::from_yaml_str(&source)
        .with_context(|| format!("Failed to parse ingress manifest {}", path.display()))
}
