//! Configuration schema definitions.
//!
//! Every field is sourced from an environment-style variable. Serde field
//! names are the lowercased variable names because the `config` crate
//! lowercases keys coming from its `Environment` source.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backend configuration for publishing to EventMesh.
///
/// Loaded once during `Commander::init` and never mutated afterwards.
#[derive(Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Ingress port the receiver binds to (0 lets the OS pick one).
    #[serde(rename = "ingress_port", default = "default_port")]
    pub port: u16,

    /// OAuth2 client id.
    pub client_id: String,

    /// OAuth2 client secret.
    pub client_secret: String,

    /// OAuth2 token endpoint.
    pub token_endpoint: String,

    /// EventMesh publish URL.
    #[serde(rename = "ems_publish_url")]
    pub publish_url: String,

    /// Maximum idle connections kept in the pool across all hosts.
    #[serde(default = "default_max_idle_conns")]
    pub max_idle_conns: usize,

    /// Maximum idle connections kept per backend host.
    #[serde(default = "default_max_idle_conns_per_host")]
    pub max_idle_conns_per_host: usize,

    /// Timeout for a single publish request.
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Event type prefix, e.g. `sap.kyma.custom`.
    pub event_type_prefix: String,

    /// EventMesh namespace, used as the source of every published event.
    #[serde(rename = "beb_namespace")]
    pub namespace: String,

    /// Resolve application names through Application custom resources.
    #[serde(default = "default_application_crd_enabled")]
    pub application_crd_enabled: bool,

    /// Upper bound for the startup wait on the subscription cache.
    #[serde(with = "humantime_serde", default = "default_informer_sync_timeout")]
    pub informer_sync_timeout: Duration,
}

fn default_port() -> u16 {
    8080
}

fn default_max_idle_conns() -> usize {
    100
}

fn default_max_idle_conns_per_host() -> usize {
    2
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_application_crd_enabled() -> bool {
    true
}

fn default_informer_sync_timeout() -> Duration {
    Duration::from_secs(60)
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("port", &self.port)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_endpoint", &self.token_endpoint)
            .field("publish_url", &self.publish_url)
            .field("max_idle_conns", &self.max_idle_conns)
            .field("max_idle_conns_per_host", &self.max_idle_conns_per_host)
            .field("request_timeout", &self.request_timeout)
            .field("event_type_prefix", &self.event_type_prefix)
            .field("namespace", &self.namespace)
            .field("application_crd_enabled", &self.application_crd_enabled)
            .field("informer_sync_timeout", &self.informer_sync_timeout)
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Console,
}

/// Process-level options that are not part of the backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Options {
    /// Maximum accepted request body in bytes.
    pub max_request_size: usize,

    /// Bind address for the Prometheus endpoint.
    pub metrics_address: String,

    /// Log format.
    #[serde(rename = "app_log_format")]
    pub log_format: LogFormat,

    /// Default log level when `RUST_LOG` is not set.
    #[serde(rename = "app_log_level")]
    pub log_level: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_request_size: 64 * 1024,
            metrics_address: "0.0.0.0:9090".to_string(),
            log_format: LogFormat::Json,
            log_level: "info".to_string(),
        }
    }
}
