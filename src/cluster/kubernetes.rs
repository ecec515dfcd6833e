//! Kubernetes-backed informers built on `kube`'s reflector.
//!
//! Applications and Subscriptions are read as dynamic objects so the
//! publisher does not depend on their generated types.

use std::pin::pin;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::StreamExt;
use kube::api::{Api, DynamicObject};
use kube::core::{ApiResource, GroupVersionKind};
use kube::runtime::reflector::{self, store::Writer, Store};
use kube::runtime::{watcher, WatchStreamExt};
use kube::Client;

use crate::cluster::lister::{ClusterAccess, ClusterAccessError, ClusterConnector, Informer, Lister};
use crate::cluster::model::{Application, Named, Subscription, SubscriptionSpec};
use crate::cluster::sync::CacheSyncError;
use crate::lifecycle::LifecycleContext;

fn application_resource() -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk("applicationconnector.kyma-project.io", "v1alpha1", "Application"),
        "applications",
    )
}

fn subscription_resource() -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk("eventing.kyma-project.io", "v1alpha2", "Subscription"),
        "subscriptions",
    )
}

/// Convert a dynamic Application object.
pub fn to_application(obj: &DynamicObject) -> Option<Application> {
    Some(Application {
        name: obj.metadata.name.clone()?,
        labels: obj.metadata.labels.clone().unwrap_or_default(),
    })
}

/// Convert a dynamic Subscription object. Objects with an unreadable spec
/// are skipped.
pub fn to_subscription(obj: &DynamicObject) -> Option<Subscription> {
    let name = obj.metadata.name.clone()?;
    let namespace = obj.metadata.namespace.clone().unwrap_or_default();
    let spec = match obj.data.get("spec") {
        Some(raw) => match serde_json::from_value::<SubscriptionSpec>(raw.clone()) {
            Ok(spec) => spec,
            Err(e) => {
                tracing::warn!(name = %name, namespace = %namespace, error = %e, "Skipping subscription with invalid spec");
                return None;
            }
        },
        None => SubscriptionSpec::default(),
    };
    Some(Subscription {
        name,
        namespace,
        spec,
    })
}

/// Connects with the in-cluster config or the local kubeconfig.
#[derive(Debug, Default)]
pub struct KubeConnector;

#[async_trait]
impl ClusterConnector for KubeConnector {
    async fn connect(&self) -> Result<Arc<dyn ClusterAccess>, ClusterAccessError> {
        let client = Client::try_default()
            .await
            .map_err(|e| ClusterAccessError::Config(e.to_string()))?;
        Ok(Arc::new(KubeCluster { client }))
    }
}

/// Dynamic-client access to a live cluster.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ClusterAccess for KubeCluster {
    fn application_informer(&self) -> Result<Arc<dyn Informer<Application>>, ClusterAccessError> {
        Ok(Arc::new(KubeInformer::new(
            self.client.clone(),
            application_resource(),
            to_application,
        )))
    }

    fn subscription_informer(&self) -> Result<Arc<dyn Informer<Subscription>>, ClusterAccessError> {
        Ok(Arc::new(KubeInformer::new(
            self.client.clone(),
            subscription_resource(),
            to_subscription,
        )))
    }
}

type Convert<T> = fn(&DynamicObject) -> Option<T>;

/// A reflector-backed informer over all namespaces.
pub struct KubeInformer<T> {
    api: Api<DynamicObject>,
    resource: ApiResource,
    reader: Store<DynamicObject>,
    writer: Mutex<Option<Writer<DynamicObject>>>,
    convert: Convert<T>,
}

impl<T> KubeInformer<T> {
    pub fn new(client: Client, resource: ApiResource, convert: Convert<T>) -> Self {
        let writer = Writer::new(resource.clone());
        let reader = writer.as_reader();
        Self {
            api: Api::all_with(client, &resource),
            resource,
            reader,
            writer: Mutex::new(Some(writer)),
            convert,
        }
    }
}

#[async_trait]
impl<T: Named + Send + Sync + 'static> Informer<T> for KubeInformer<T> {
    fn start(&self, ctx: &LifecycleContext) {
        let writer = match self.writer.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(writer) = writer else {
            tracing::debug!(resource = %self.resource.plural, "Informer already started");
            return;
        };

        let api = self.api.clone();
        let ctx = ctx.clone();
        let resource = self.resource.plural.clone();
        tokio::spawn(async move {
            let stream = reflector::reflector(writer, watcher(api, watcher::Config::default()))
                .default_backoff()
                .applied_objects();
            let mut stream = pin!(stream);
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => break,
                    item = stream.next() => match item {
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(resource = %resource, error = %e, "Watch error");
                        }
                        None => break,
                    },
                }
            }
            tracing::debug!(resource = %resource, "Informer stopped");
        });
    }

    async fn wait_for_sync(&self) -> Result<(), CacheSyncError> {
        self.reader
            .wait_until_ready()
            .await
            .map_err(|e| CacheSyncError::Failed(format!("{}: {}", self.resource.plural, e)))
    }

    fn lister(&self) -> Arc<dyn Lister<T>> {
        Arc::new(KubeLister {
            store: self.reader.clone(),
            convert: self.convert,
        })
    }
}

struct KubeLister<T> {
    store: Store<DynamicObject>,
    convert: Convert<T>,
}

impl<T: Named + Send + Sync> Lister<T> for KubeLister<T> {
    fn list(&self) -> Vec<T> {
        let mut items: Vec<T> = self
            .store
            .state()
            .iter()
            .filter_map(|obj| (self.convert)(obj))
            .collect();
        items.sort_by_key(|item| item.key());
        items
    }

    fn get(&self, key: &str) -> Option<T> {
        self.store
            .state()
            .iter()
            .filter_map(|obj| (self.convert)(obj))
            .find(|item| item.key() == key)
    }
}
