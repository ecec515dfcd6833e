//! Cleaning rules for EventMesh.

use crate::eventtype::clean::{clean_name, clean_segments, CleanError};

/// Cleans a CloudEvent's source and type separately.
pub trait BackendCleaner: Send + Sync {
    fn clean_source(&self, source: &str) -> Result<String, CleanError>;

    fn clean_event_type(&self, event_type: &str) -> Result<String, CleanError>;
}

/// EventMesh accepts types shaped `businessObject.operation.version`, each
/// segment alphanumeric.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventMeshCleaner;

impl EventMeshCleaner {
    pub fn new() -> Self {
        Self
    }
}

impl BackendCleaner for EventMeshCleaner {
    fn clean_source(&self, source: &str) -> Result<String, CleanError> {
        let cleaned = clean_name(source);
        if cleaned.is_empty() {
            return Err(CleanError::Empty("source"));
        }
        Ok(cleaned)
    }

    fn clean_event_type(&self, event_type: &str) -> Result<String, CleanError> {
        let cleaned = clean_segments(event_type);
        let segments: Vec<&str> = cleaned.split('.').filter(|s| !s.is_empty()).collect();
        if segments.len() < 3 {
            return Err(CleanError::InvalidFormat(format!(
                "'{}' needs businessObject.operation.version",
                event_type
            )));
        }

        let last = segments.len() - 1;
        Ok(format!(
            "{}.{}.{}",
            segments[..last - 1].concat(),
            segments[last - 1],
            segments[last]
        ))
    }
}
