//! Configuration loading from environment-style sources.

use std::collections::HashMap;

use config::{Config, Environment};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::schema::{BackendConfig, Options};
use crate::config::validation::{validate_config, ValidationError};

/// Where configuration variables are read from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The process environment.
    #[default]
    Process,
    /// An explicit set of variables, keyed by upper-case variable name.
    Map(HashMap<String, String>),
}

impl EnvSource {
    fn environment(&self) -> Environment {
        match self {
            EnvSource::Process => Environment::default(),
            EnvSource::Map(vars) => Environment::default().source(Some(
                vars.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<config::Map<String, String>>(),
            )),
        }
    }
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn deserialize<T: DeserializeOwned>(source: &EnvSource) -> Result<T, ConfigError> {
    let raw = Config::builder()
        .add_source(source.environment())
        .build()?;
    Ok(raw.try_deserialize()?)
}

/// Load and validate the backend configuration.
pub fn load_backend_config(source: &EnvSource) -> Result<BackendConfig, ConfigError> {
    let config: BackendConfig = deserialize(source)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load process options. Every option has a default.
pub fn load_options(source: &EnvSource) -> Result<Options, ConfigError> {
    deserialize(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;
    use std::time::Duration;

    fn vars(pairs: &[(&str, &str)]) -> EnvSource {
        EnvSource::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("CLIENT_ID", "client"),
            ("CLIENT_SECRET", "secret"),
            ("TOKEN_ENDPOINT", "http://auth.local/token"),
            ("EMS_PUBLISH_URL", "http://ems.local/events"),
            ("EVENT_TYPE_PREFIX", "sap.kyma.custom"),
            ("BEB_NAMESPACE", "/default/kyma/id"),
        ]
    }

    #[test]
    fn test_load_with_defaults() {
        let config = load_backend_config(&vars(&required())).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.informer_sync_timeout, Duration::from_secs(60));
        assert!(config.application_crd_enabled);
        assert_eq!(config.event_type_prefix, "sap.kyma.custom");
        assert_eq!(config.namespace, "/default/kyma/id");
    }

    #[test]
    fn test_load_overrides() {
        let mut pairs = required();
        pairs.push(("INGRESS_PORT", "9999"));
        pairs.push(("REQUEST_TIMEOUT", "250ms"));
        pairs.push(("APPLICATION_CRD_ENABLED", "false"));
        let config = load_backend_config(&vars(&pairs)).unwrap();
        assert_eq!(config.port, 9999);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert!(!config.application_crd_enabled);
    }

    #[test]
    fn test_missing_required_field() {
        let pairs: Vec<_> = required()
            .into_iter()
            .filter(|(k, _)| *k != "EMS_PUBLISH_URL")
            .collect();
        let err = load_backend_config(&vars(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_malformed_values() {
        for (key, value) in [
            ("INGRESS_PORT", "eighty"),
            ("REQUEST_TIMEOUT", "soon"),
            ("APPLICATION_CRD_ENABLED", "maybe"),
        ] {
            let mut pairs = required();
            pairs.push((key, value));
            assert!(
                load_backend_config(&vars(&pairs)).is_err(),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }

    #[test]
    fn test_semantic_errors_surface() {
        let mut pairs = required();
        pairs.retain(|(k, _)| *k != "EMS_PUBLISH_URL");
        pairs.push(("EMS_PUBLISH_URL", "::nope::"));
        let err = load_backend_config(&vars(&pairs)).unwrap_err();
        assert!(err.to_string().contains("EMS_PUBLISH_URL"));
    }

    #[test]
    fn test_load_options() {
        let opts = load_options(&vars(&[
            ("APP_LOG_FORMAT", "console"),
            ("MAX_REQUEST_SIZE", "1024"),
        ]))
        .unwrap();
        assert_eq!(opts.log_format, LogFormat::Console);
        assert_eq!(opts.max_request_size, 1024);
        assert_eq!(opts.metrics_address, "0.0.0.0:9090");
    }
}
