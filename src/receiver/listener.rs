//! TCP listener for the ingress port.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;
use thiserror::Error;

/// Error type for serving the ingress port.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Receives publish requests on all interfaces at a fixed port.
///
/// Port 0 binds an ephemeral port chosen by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpMessageReceiver {
    port: u16,
}

impl HttpMessageReceiver {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn address(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    /// Bind the ingress port.
    pub async fn bind(&self) -> Result<TcpListener, ServeError> {
        let addr = self.address();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServeError::Bind { addr, source })?;

        let local_addr = listener
            .local_addr()
            .map_err(|source| ServeError::Bind { addr, source })?;
        tracing::info!(address = %local_addr, "Receiver bound");

        Ok(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let listener = HttpMessageReceiver::new(0).bind().await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_conflict() {
        let taken = TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let err = HttpMessageReceiver::new(port).bind().await.unwrap_err();
        assert!(matches!(err, ServeError::Bind { .. }));
    }
}
