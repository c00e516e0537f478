use std::net::SocketAddr;

use eyre::Result;

use crate::config::models::{LoggingConfig, ServerConfig, UpstreamConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Server configuration validator
pub struct ServerConfigValidator;

impl ServerConfigValidator {
    /// Validate the entire server configuration, collecting every failure
    pub fn validate(config: &ServerConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if config.ingress_path.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "ingress_path".to_string(),
            });
        }

        errors.extend(Self::validate_upstream_config(&config.upstream));

        if let Err(e) = Self::validate_logging_config(&config.logging) {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_upstream_config(config: &UpstreamConfig) -> Vec<ValidationError> {
        [
            ("upstream.connect_timeout_secs", config.connect_timeout_secs),
            ("upstream.response_timeout_secs", config.response_timeout_secs),
        ]
        .into_iter()
        .filter(|(_, value)| *value == 0)
        .map(|(field, _)| ValidationError::InvalidField {
            field: field.to_string(),
            message: "Must be greater than 0".to_string(),
        })
        .collect()
    }

    fn validate_logging_config(config: &LoggingConfig) -> ValidationResult<()> {
        if tracing_subscriber::EnvFilter::try_new(&config.level).is_err() {
            return Err(ValidationError::InvalidField {
                field: "logging.level".to_string(),
                message: format!("'{}' is not a valid log filter", config.level),
            });
        }
        Ok(())
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> ServerConfig {
        ServerConfig::builder()
            .listen_addr("127.0.0.1:8080")
            .ingress_path("ingress.yaml")
            .build()
            .unwrap()
    }

    #[test]
    fn validate_accepts_minimal_config() {
        assert!(ServerConfigValidator::validate(&minimal_valid_config()).is_ok());
    }

    #[test]
    fn validate_rejects_bad_listen_address() {
        let mut config = minimal_valid_config();
        config.listen_addr = "localhost".to_string();

        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid listen address"));
    }

    #[test]
    fn validate_rejects_zero_timeouts() {
        let mut config = minimal_valid_config();
        config.upstream.connect_timeout_secs = 0;
        config.upstream.response_timeout_secs = 0;

        let err = ServerConfigValidator::validate(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Found 2 validation errors"));
        assert!(message.contains("upstream.connect_timeout_secs"));
        assert!(message.contains("upstream.response_timeout_secs"));
    }

    #[test]
    fn validate_rejects_empty_ingress_path() {
        let mut config = minimal_valid_config();
        config.ingress_path = "  ".to_string();

        assert!(ServerConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = minimal_valid_config();
        config.logging.level = "[[[".to_string();

        assert!(ServerConfigValidator::validate(&config).is_err());
    }
}
