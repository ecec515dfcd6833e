//! Forwarding events to the backend.

pub mod eventmesh;

use async_trait::async_trait;
use thiserror::Error;

use crate::cloudevents::CloudEvent;
use crate::oauth::AuthError;

pub use eventmesh::EventMeshSender;

/// The backend's answer to a publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendAck {
    pub status: u16,
    pub body: String,
}

impl SendAck {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("publish request failed: {0}")]
    Request(#[source] reqwest::Error),
}

/// Delivers a CloudEvent to the backend. Does not retry.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, event: &CloudEvent) -> Result<SendAck, SendError>;

    /// Where events are sent, used as a metrics label.
    fn url(&self) -> &str;
}
