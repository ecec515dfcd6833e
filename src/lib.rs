//! EventMesh publisher sidecar library.

pub mod cloudevents;
pub mod cluster;
pub mod config;
pub mod eventtype;
pub mod handler;
pub mod health;
pub mod legacy;
pub mod lifecycle;
pub mod oauth;
pub mod observability;
pub mod receiver;
pub mod sender;
pub mod subscribed;

pub use crate::config::{BackendConfig, EnvSource, Options};
pub use crate::lifecycle::{Commander, CommanderError, LifecycleContext, StopHandle};
