//! Informer cache sync gate.
//!
//! Startup blocks here until the application and subscription caches are
//! populated. The wait
//! is bounded: a cache that never syncs fails startup instead of hanging,
//! and cancellation of the lifecycle context aborts the wait.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::cluster::lister::{Informer, Lister};
use crate::lifecycle::LifecycleContext;

/// Failure while waiting for an informer cache.
#[derive(Debug, Error)]
pub enum CacheSyncError {
    #[error("informer cache did not sync within {0:?}")]
    Timeout(Duration),

    #[error("cache sync aborted by shutdown")]
    Cancelled,

    #[error("informer failed before sync: {0}")]
    Failed(String),
}

/// A lister whose backing cache has completed its initial sync.
///
/// Only obtainable from [`wait_for_cache_sync`].
pub struct SyncedLister<T> {
    inner: Arc<dyn Lister<T>>,
}

impl<T> Clone for SyncedLister<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> SyncedLister<T> {
    pub fn list(&self) -> Vec<T> {
        self.inner.list()
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.inner.get(key)
    }
}

impl<T> Lister<T> for SyncedLister<T> {
    fn list(&self) -> Vec<T> {
        self.inner.list()
    }

    fn get(&self, key: &str) -> Option<T> {
        self.inner.get(key)
    }
}

/// Start `informer` and wait until its cache synced.
pub async fn wait_for_cache_sync<T>(
    informer: &dyn Informer<T>,
    timeout: Duration,
    ctx: &LifecycleContext,
) -> Result<SyncedLister<T>, CacheSyncError> {
    informer.start(ctx);

    tokio::select! {
        result = tokio::time::timeout(timeout, informer.wait_for_sync()) => match result {
            Ok(Ok(())) => Ok(SyncedLister { inner: informer.lister() }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CacheSyncError::Timeout(timeout)),
        },
        _ = ctx.cancelled() => Err(CacheSyncError::Cancelled),
    }
}
