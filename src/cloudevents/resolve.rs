//! Chooses the cleaning rule for an inbound CloudEvent.

use std::sync::Arc;

use crate::cloudevents::builder::{BuildError, EventMeshBuilder, ORIGINAL_TYPE_EXTENSION};
use crate::cloudevents::event::CloudEvent;
use crate::eventtype::EventTypeCleaner;

/// Resolves the final type and source of an inbound event.
///
/// Types that already carry the prefix are re-derived with the
/// application-aware cleaner. Everything else goes through the EventMesh
/// builder.
pub struct EventResolver {
    prefix: String,
    namespace: String,
    cleaner: Arc<dyn EventTypeCleaner>,
    builder: EventMeshBuilder,
}

impl EventResolver {
    pub fn new(
        prefix: impl Into<String>,
        namespace: impl Into<String>,
        cleaner: Arc<dyn EventTypeCleaner>,
        builder: EventMeshBuilder,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            namespace: namespace.into(),
            cleaner,
            builder,
        }
    }

    fn is_prefixed(&self, event_type: &str) -> bool {
        event_type
            .strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }

    pub fn resolve(&self, event: &CloudEvent) -> Result<CloudEvent, BuildError> {
        if !self.is_prefixed(&event.event_type) {
            return self.builder.build(event);
        }

        let mut resolved = event.clone();
        resolved.event_type = self.cleaner.clean(&event.event_type)?;
        resolved.source = self.namespace.clone();
        resolved
            .extensions
            .insert(ORIGINAL_TYPE_EXTENSION.to_string(), event.event_type.clone().into());
        resolved.validate()?;
        Ok(resolved)
    }
}

impl std::fmt::Debug for EventResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventResolver")
            .field("prefix", &self.prefix)
            .field("builder", &self.builder)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ApplicationLister;
    use crate::eventtype::{Cleaner, EventMeshCleaner};

    fn resolver() -> EventResolver {
        let prefix = "sap.kyma.custom";
        let namespace = "/default/kyma/id";
        EventResolver::new(
            prefix,
            namespace,
            Arc::new(Cleaner::new(prefix, ApplicationLister::Absent)),
            EventMeshBuilder::new(
                prefix,
                namespace,
                Arc::new(EventMeshCleaner::new()),
                ApplicationLister::Absent,
            ),
        )
    }

    #[test]
    fn test_prefixed_type_uses_application_cleaner() {
        let event = CloudEvent::new("1", "anything", "sap.kyma.custom.my-app.order.created.v1");
        let resolved = resolver().resolve(&event).unwrap();
        assert_eq!(resolved.event_type, "sap.kyma.custom.myapp.order.created.v1");
        assert_eq!(resolved.source, "/default/kyma/id");
    }

    #[test]
    fn test_plain_type_uses_builder() {
        let event = CloudEvent::new("1", "kyma", "order.created.v1");
        let resolved = resolver().resolve(&event).unwrap();
        assert_eq!(resolved.event_type, "sap.kyma.custom.kyma.order.created.v1");
    }

    #[test]
    fn test_resolution_is_deterministic_across_threads() {
        let resolver = resolver();
        let event = CloudEvent::new("1", "my-app", "Order-Item.created.v1");
        let expected = resolver.resolve(&event).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| resolver.resolve(&event).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_prefix_must_end_at_segment_boundary() {
        let event = CloudEvent::new("1", "kyma", "sap.kyma.customer.created.v1");
        let resolved = resolver().resolve(&event).unwrap();
        assert_eq!(resolved.event_type, "sap.kyma.custom.kyma.sapkymacustomer.created.v1");
    }
}
