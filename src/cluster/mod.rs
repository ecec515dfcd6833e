//! Read-only views over cluster resources.
//!
//! # Data Flow
//! ```text
//! ClusterConnector::connect()      (cluster config; failure is fatal)
//!     → ClusterAccess               (dynamic client)
//!     → Informer<Application>       (optional, behind APPLICATION_CRD_ENABLED)
//!     → Informer<Subscription>
//!         → sync.rs gate            (bounded wait, yields SyncedLister)
//!         → ApplicationLister::synced, subscribed::Processor
//! ```
//!
//! # Design Decisions
//! - The pipeline only ever reads; listers expose `list`/`get`, nothing else
//! - Absence of the application lister is a variant, not a null
//! - Listers are only handed to the pipeline after their cache synced

pub mod application;
pub mod kubernetes;
pub mod lister;
pub mod memory;
pub mod model;
pub mod sync;

pub use application::ApplicationLister;
pub use lister::{ClusterAccess, ClusterAccessError, ClusterConnector, Informer, Lister};
pub use model::{
    Application, Named, Subscription, SubscriptionSpec, TypeMatching, APPLICATION_TYPE_LABEL,
};
pub use sync::{wait_for_cache_sync, CacheSyncError, SyncedLister};
