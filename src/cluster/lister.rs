//! Interfaces for cluster access and cache-backed lookups.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::cluster::model::{Application, Subscription};
use crate::cluster::sync::CacheSyncError;
use crate::lifecycle::LifecycleContext;

/// Failure to obtain cluster configuration or a client for it.
#[derive(Debug, Error)]
pub enum ClusterAccessError {
    #[error("failed to load cluster config: {0}")]
    Config(String),

    #[error("failed to create client for {resource}: {message}")]
    Client { resource: String, message: String },
}

/// Read-only lookups over an informer's local cache.
pub trait Lister<T>: Send + Sync {
    /// Every cached object.
    fn list(&self) -> Vec<T>;

    /// The object with the given key, if cached.
    fn get(&self, key: &str) -> Option<T>;
}

/// A cache that mirrors a set of cluster objects.
#[async_trait]
pub trait Informer<T>: Send + Sync {
    /// Begin populating the cache. Stops when `ctx` is cancelled.
    fn start(&self, ctx: &LifecycleContext);

    /// Resolve once the initial object set is in the cache.
    async fn wait_for_sync(&self) -> Result<(), CacheSyncError>;

    /// A lister over the cache. Reads before sync may see a partial set.
    fn lister(&self) -> Arc<dyn Lister<T>>;
}

/// Dynamic-client access to the resources the publisher reads.
pub trait ClusterAccess: Send + Sync {
    fn application_informer(&self) -> Result<Arc<dyn Informer<Application>>, ClusterAccessError>;

    fn subscription_informer(&self) -> Result<Arc<dyn Informer<Subscription>>, ClusterAccessError>;
}

/// Produces cluster access from the ambient cluster configuration.
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ClusterAccess>, ClusterAccessError>;
}
