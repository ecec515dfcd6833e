//! Ingress listener for the publish handler.

pub mod listener;

pub use listener::{HttpMessageReceiver, ServeError};
