//! Rewrites inbound CloudEvents into the shape EventMesh accepts.

use std::sync::Arc;

use thiserror::Error;

use crate::cloudevents::event::{CloudEvent, InvalidEvent};
use crate::cluster::ApplicationLister;
use crate::eventtype::{clean_name, BackendCleaner, CleanError};

/// Extension that carries the type the client originally sent.
pub const ORIGINAL_TYPE_EXTENSION: &str = "originaltype";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Clean(#[from] CleanError),

    #[error(transparent)]
    Invalid(#[from] InvalidEvent),
}

/// Builds `prefix.application.businessObject.operation.version` types.
///
/// The application segment comes from the Application whose name matches
/// the event source, via its type label when set. Without a lister, or when
/// no Application matches, the cleaned source is used.
pub struct EventMeshBuilder {
    prefix: String,
    namespace: String,
    cleaner: Arc<dyn BackendCleaner>,
    applications: ApplicationLister,
}

impl EventMeshBuilder {
    pub fn new(
        prefix: impl Into<String>,
        namespace: impl Into<String>,
        cleaner: Arc<dyn BackendCleaner>,
        applications: ApplicationLister,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            namespace: namespace.into(),
            cleaner,
            applications,
        }
    }

    pub fn build(&self, event: &CloudEvent) -> Result<CloudEvent, BuildError> {
        let source = self.cleaner.clean_source(&event.source)?;
        let event_type = self.cleaner.clean_event_type(&event.event_type)?;

        let application = match &self.applications {
            ApplicationLister::Present(lister) => lister
                .get(&event.source)
                .map(|app| clean_name(app.type_or_name()))
                .filter(|name| !name.is_empty())
                .unwrap_or(source),
            ApplicationLister::Absent => source,
        };

        let final_type = format!("{}.{}.{}", self.prefix, application, event_type);

        let mut built = event.clone();
        built.event_type = final_type;
        built.source = self.namespace.clone();
        built
            .extensions
            .insert(ORIGINAL_TYPE_EXTENSION.to_string(), event.event_type.clone().into());
        built.validate()?;

        tracing::debug!(
            original_type = %event.event_type,
            event_type = %built.event_type,
            "Built EventMesh event"
        );
        Ok(built)
    }
}

impl std::fmt::Debug for EventMeshBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventMeshBuilder")
            .field("prefix", &self.prefix)
            .field("namespace", &self.namespace)
            .field("applications", &self.applications)
            .finish()
    }
}
