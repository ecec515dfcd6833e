//! EventMesh publish client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::cloudevents::{CloudEvent, STRUCTURED_CONTENT_TYPE};
use crate::oauth::AuthClient;
use crate::sender::{MessageSender, SendAck, SendError};

/// POSTs structured CloudEvents to the EventMesh publish URL.
#[derive(Debug, Clone)]
pub struct EventMeshSender {
    url: String,
    client: Arc<AuthClient>,
}

impl EventMeshSender {
    pub fn new(url: impl Into<String>, client: Arc<AuthClient>) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl MessageSender for EventMeshSender {
    async fn send(&self, event: &CloudEvent) -> Result<SendAck, SendError> {
        let body = serde_json::to_vec(event)?;
        let token = self.client.bearer_token().await?;

        let response = self
            .client
            .http()
            .post(&self.url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, STRUCTURED_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(SendError::Request)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // next send fetches a fresh token
            self.client.invalidate_token().await;
        }
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    event_id = %event.id,
                    status = status.as_u16(),
                    error = %e,
                    "Failed to read EventMesh response body"
                );
                String::new()
            }
        };

        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            status = status.as_u16(),
            "Event sent"
        );
        Ok(SendAck {
            status: status.as_u16(),
            body,
        })
    }

    fn url(&self) -> &str {
        &self.url
    }
}
