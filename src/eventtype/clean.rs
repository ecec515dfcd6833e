//! Application-aware event type cleaning.

use thiserror::Error;

use crate::cluster::ApplicationLister;
use crate::eventtype::parse::{build, parse};

/// Why an event type could not be cleaned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanError {
    #[error("event type does not start with prefix '{0}'")]
    MissingPrefix(String),

    #[error("invalid event type format: {0}")]
    InvalidFormat(String),

    #[error("{0} is empty after cleaning")]
    Empty(&'static str),
}

/// A rule that turns a raw event type into its cleaned form.
pub trait EventTypeCleaner: Send + Sync {
    fn clean(&self, event_type: &str) -> Result<String, CleanError>;
}

/// Keep ASCII alphanumerics only.
pub fn clean_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Keep ASCII alphanumerics and segment separators.
pub(crate) fn clean_segments(event_type: &str) -> String {
    event_type
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect()
}

/// Cleans fully prefixed event types.
///
/// The application segment is replaced by the matching Application's type
/// label or name when a lister is present; otherwise the raw segment is
/// kept. The application segment is then stripped of non-alphanumerics and
/// the whole type of anything but alphanumerics and dots.
#[derive(Debug, Clone)]
pub struct Cleaner {
    prefix: String,
    applications: ApplicationLister,
}

impl Cleaner {
    pub fn new(prefix: impl Into<String>, applications: ApplicationLister) -> Self {
        Self {
            prefix: prefix.into(),
            applications,
        }
    }
}

impl EventTypeCleaner for Cleaner {
    fn clean(&self, event_type: &str) -> Result<String, CleanError> {
        let parsed = parse(event_type, &self.prefix)?;

        let application = match &self.applications {
            ApplicationLister::Present(lister) => match lister.get(&parsed.application) {
                Some(app) => app.type_or_name().to_string(),
                None => {
                    tracing::debug!(application = %parsed.application, "Application not found, using name as is");
                    parsed.application
                }
            },
            ApplicationLister::Absent => parsed.application,
        };

        let application = clean_name(&application);
        if application.is_empty() {
            return Err(CleanError::Empty("application name"));
        }

        Ok(clean_segments(&build(
            &self.prefix,
            &application,
            &parsed.event,
            &parsed.version,
        )))
    }
}
