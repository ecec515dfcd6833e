//! Optional application lookup.

use std::sync::Arc;

use crate::cluster::lister::Lister;
use crate::cluster::model::Application;
use crate::cluster::sync::SyncedLister;

/// Application lookup, present only when Application CRD support is on.
#[derive(Clone, Default)]
pub enum ApplicationLister {
    Present(Arc<dyn Lister<Application>>),
    #[default]
    Absent,
}

impl ApplicationLister {
    /// Lookup over an application cache that finished its initial sync.
    pub fn synced(lister: SyncedLister<Application>) -> Self {
        ApplicationLister::Present(Arc::new(lister))
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ApplicationLister::Present(_))
    }
}

impl std::fmt::Debug for ApplicationLister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationLister::Present(_) => f.write_str("ApplicationLister::Present"),
            ApplicationLister::Absent => f.write_str("ApplicationLister::Absent"),
        }
    }
}
