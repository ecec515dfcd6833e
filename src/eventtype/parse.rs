//! Parsing and building prefixed event types.

use crate::eventtype::clean::CleanError;

/// An event type split into its segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedType {
    pub application: String,
    /// `businessObject.operation`
    pub event: String,
    pub version: String,
}

/// Split `prefix.application.businessObject….operation.version`.
///
/// All segments between the application and the operation are merged into
/// one business-object segment.
pub fn parse(event_type: &str, prefix: &str) -> Result<ParsedType, CleanError> {
    let rest = event_type
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('.'))
        .ok_or_else(|| CleanError::MissingPrefix(prefix.to_string()))?;

    let parts: Vec<&str> = rest.split('.').collect();
    if parts.len() < 4 {
        return Err(CleanError::InvalidFormat(format!(
            "'{}' needs application.businessObject.operation.version",
            event_type
        )));
    }
    if parts.iter().any(|p| p.is_empty()) {
        return Err(CleanError::InvalidFormat(format!(
            "'{}' contains an empty segment",
            event_type
        )));
    }

    let last = parts.len() - 1;
    Ok(ParsedType {
        application: parts[0].to_string(),
        event: format!("{}.{}", parts[1..last - 1].concat(), parts[last - 1]),
        version: parts[last].to_string(),
    })
}

/// Join segments into an event type.
pub fn build(prefix: &str, application: &str, event: &str, version: &str) -> String {
    format!("{}.{}.{}.{}", prefix, application, event, version)
}
