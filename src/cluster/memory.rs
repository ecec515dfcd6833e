//! In-memory informers and cluster access.
//!
//! The test double for the kube-backed implementation; also usable when
//! the library is embedded without an API server.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;

use crate::cluster::lister::{ClusterAccess, ClusterAccessError, ClusterConnector, Informer, Lister};
use crate::cluster::model::{Application, Named, Subscription};
use crate::cluster::sync::CacheSyncError;
use crate::lifecycle::LifecycleContext;

/// A thread-safe object cache keyed by [`Named::key`].
pub struct MemoryStore<T> {
    inner: Arc<DashMap<String, T>>,
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }
}

impl<T: Named + Clone + Send + Sync + 'static> MemoryStore<T> {
    pub fn new(objects: Vec<T>) -> Self {
        let store = Self::default();
        for object in objects {
            store.upsert(object);
        }
        store
    }

    /// Insert or replace an object.
    pub fn upsert(&self, object: T) {
        self.inner.insert(object.key(), object);
    }

    /// Remove an object by key.
    pub fn remove(&self, key: &str) -> Option<T> {
        self.inner.remove(key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T: Named + Clone + Send + Sync + 'static> Lister<T> for MemoryStore<T> {
    fn list(&self) -> Vec<T> {
        let mut items: Vec<(String, T)> = self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items.into_iter().map(|(_, v)| v).collect()
    }

    fn get(&self, key: &str) -> Option<T> {
        self.inner.get(key).map(|r| r.value().clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SyncBehavior {
    OnStart,
    Never,
    Fail(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SyncState {
    Pending,
    Synced,
    Failed(String),
}

/// An informer over a [`MemoryStore`] with scripted sync behaviour.
pub struct MemoryInformer<T> {
    store: MemoryStore<T>,
    behavior: SyncBehavior,
    state: watch::Sender<SyncState>,
}

impl<T: Named + Clone + Send + Sync + 'static> MemoryInformer<T> {
    fn with_behavior(objects: Vec<T>, behavior: SyncBehavior) -> Self {
        let (state, _) = watch::channel(SyncState::Pending);
        Self {
            store: MemoryStore::new(objects),
            behavior,
            state,
        }
    }

    /// Reports synced as soon as it is started.
    pub fn synced(objects: Vec<T>) -> Self {
        Self::with_behavior(objects, SyncBehavior::OnStart)
    }

    /// Never reports synced.
    pub fn never_synced() -> Self {
        Self::with_behavior(Vec::new(), SyncBehavior::Never)
    }

    /// Fails as soon as it is started.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Vec::new(), SyncBehavior::Fail(message.into()))
    }

    /// The backing store, for adding or removing objects.
    pub fn store(&self) -> MemoryStore<T> {
        self.store.clone()
    }

    /// Whether `start` has been called and the cache reported synced.
    pub fn is_synced(&self) -> bool {
        *self.state.borrow() == SyncState::Synced
    }
}

#[async_trait]
impl<T: Named + Clone + Send + Sync + 'static> Informer<T> for MemoryInformer<T> {
    fn start(&self, _ctx: &LifecycleContext) {
        match &self.behavior {
            SyncBehavior::OnStart => {
                self.state.send_replace(SyncState::Synced);
            }
            SyncBehavior::Never => {}
            SyncBehavior::Fail(message) => {
                self.state.send_replace(SyncState::Failed(message.clone()));
            }
        }
    }

    async fn wait_for_sync(&self) -> Result<(), CacheSyncError> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|s| *s != SyncState::Pending)
            .await
            .map_err(|_| CacheSyncError::Failed("informer dropped".to_string()))?
            .clone();
        match state {
            SyncState::Failed(message) => Err(CacheSyncError::Failed(message)),
            _ => Ok(()),
        }
    }

    fn lister(&self) -> Arc<dyn Lister<T>> {
        Arc::new(self.store.clone())
    }
}

/// Cluster access backed by in-memory informers.
pub struct MemoryCluster {
    applications: Arc<MemoryInformer<Application>>,
    subscriptions: Arc<MemoryInformer<Subscription>>,
}

impl MemoryCluster {
    pub fn new(
        applications: Arc<MemoryInformer<Application>>,
        subscriptions: Arc<MemoryInformer<Subscription>>,
    ) -> Self {
        Self {
            applications,
            subscriptions,
        }
    }
}

impl ClusterAccess for MemoryCluster {
    fn application_informer(&self) -> Result<Arc<dyn Informer<Application>>, ClusterAccessError> {
        Ok(self.applications.clone())
    }

    fn subscription_informer(&self) -> Result<Arc<dyn Informer<Subscription>>, ClusterAccessError> {
        Ok(self.subscriptions.clone())
    }
}

/// Connector handing out a fixed [`MemoryCluster`], or a fixed failure.
pub struct MemoryConnector {
    cluster: Option<Arc<MemoryCluster>>,
    failure: Option<String>,
}

impl MemoryConnector {
    pub fn new(cluster: MemoryCluster) -> Self {
        Self {
            cluster: Some(Arc::new(cluster)),
            failure: None,
        }
    }

    /// A connector whose `connect` always fails.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            cluster: None,
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl ClusterConnector for MemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn ClusterAccess>, ClusterAccessError> {
        match (&self.cluster, &self.failure) {
            (Some(cluster), _) => Ok(cluster.clone()),
            (None, Some(message)) => Err(ClusterAccessError::Config(message.clone())),
            (None, None) => Err(ClusterAccessError::Config("no cluster configured".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_operations() {
        let store = MemoryStore::new(vec![Application::new("b"), Application::new("a")]);
        assert_eq!(store.len(), 2);

        let names: Vec<_> = store.list().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["a", "b"]);

        store.upsert(Application::new("a").with_label("application-type", "commerce"));
        assert_eq!(store.get("a").unwrap().type_or_name(), "commerce");
        assert_eq!(store.len(), 2);

        assert!(store.remove("b").is_some());
        assert!(store.get("b").is_none());
    }

    #[test]
    fn test_informer_syncs_on_start() {
        let informer = MemoryInformer::synced(vec![Application::new("a")]);
        assert!(!informer.is_synced());
        informer.start(&LifecycleContext::new());
        assert!(informer.is_synced());
    }

    #[tokio::test]
    async fn test_unreachable_connector() {
        let connector = MemoryConnector::unreachable("no kubeconfig");
        let err = connector.connect().await.err().unwrap();
        assert!(err.to_string().contains("no kubeconfig"));
    }
}
