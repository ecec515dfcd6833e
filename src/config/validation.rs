//! Configuration validation.
//!
//! Serde covers syntax and presence; this module covers semantics. All
//! errors are collected so a broken deployment is fixed in one round.

use std::fmt;

use crate::config::schema::BackendConfig;

/// A single semantic problem in the loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a backend configuration.
pub fn validate_config(config: &BackendConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("CLIENT_ID", &config.client_id),
        ("CLIENT_SECRET", &config.client_secret),
        ("EVENT_TYPE_PREFIX", &config.event_type_prefix),
        ("BEB_NAMESPACE", &config.namespace),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        }
    }

    if let Err(msg) = check_http_url(&config.publish_url) {
        errors.push(ValidationError::new("EMS_PUBLISH_URL", msg));
    }
    if let Err(msg) = check_http_url(&config.token_endpoint) {
        errors.push(ValidationError::new("TOKEN_ENDPOINT", msg));
    }

    if config.request_timeout.is_zero() {
        errors.push(ValidationError::new("REQUEST_TIMEOUT", "must be greater than zero"));
    }
    if config.informer_sync_timeout.is_zero() {
        errors.push(ValidationError::new(
            "INFORMER_SYNC_TIMEOUT",
            "must be greater than zero",
        ));
    }
    if config.max_idle_conns_per_host > config.max_idle_conns {
        errors.push(ValidationError::new(
            "MAX_IDLE_CONNS_PER_HOST",
            format!("must not exceed MAX_IDLE_CONNS ({})", config.max_idle_conns),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(raw: &str) -> Result<(), String> {
    let parsed = url::Url::parse(raw).map_err(|e| format!("invalid URL '{}': {}", raw, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn valid() -> BackendConfig {
        BackendConfig {
            port: 8080,
            client_id: "id".into(),
            client_secret: "secret".into(),
            token_endpoint: "https://auth.local/oauth/token".into(),
            publish_url: "https://ems.local/events".into(),
            max_idle_conns: 100,
            max_idle_conns_per_host: 2,
            request_timeout: Duration::from_secs(5),
            event_type_prefix: "sap.kyma.custom".into(),
            namespace: "/default/kyma/id".into(),
            application_crd_enabled: true,
            informer_sync_timeout: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.publish_url = "not a url".into();
        config.event_type_prefix = "  ".into();
        config.request_timeout = Duration::ZERO;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["EVENT_TYPE_PREFIX", "EMS_PUBLISH_URL", "REQUEST_TIMEOUT"]);
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = valid();
        config.token_endpoint = "ftp://auth.local/token".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "TOKEN_ENDPOINT");
        assert!(errors[0].message.contains("ftp"));
    }

    #[test]
    fn test_idle_conns_per_host_bounded() {
        let mut config = valid();
        config.max_idle_conns = 1;
        config.max_idle_conns_per_host = 5;
        assert!(validate_config(&config).is_err());
    }
}
