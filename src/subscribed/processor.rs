//! Derives event types from Subscription objects.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cluster::{Subscription, SyncedLister, TypeMatching};
use crate::eventtype::{build, clean_name};

/// An event an application is subscribed to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct Event {
    pub name: String,
    pub version: String,
}

/// Response body of the subscribed-events route.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct EventsResponse {
    #[serde(rename = "eventsInfo")]
    pub events_info: Vec<Event>,
}

/// Reads subscriptions from a synced cache.
#[derive(Clone)]
pub struct Processor {
    subscriptions: SyncedLister<Subscription>,
    prefix: String,
}

impl Processor {
    pub fn new(subscriptions: SyncedLister<Subscription>, prefix: impl Into<String>) -> Self {
        Self {
            subscriptions,
            prefix: prefix.into(),
        }
    }

    /// Events subscribed for `application`, de-duplicated and sorted.
    pub fn extract_events(&self, application: &str) -> Vec<Event> {
        let prefix = format!("{}.{}.", self.prefix, clean_name(application)).to_lowercase();

        let mut events = BTreeSet::new();
        for subscription in self.subscriptions.list() {
            for event_type in &subscription.spec.types {
                let remainder = match subscription.spec.type_matching {
                    TypeMatching::Exact if subscription.spec.source == application => {
                        Some(event_type.as_str())
                    }
                    TypeMatching::Exact => None,
                    TypeMatching::Standard => strip_prefix_ignore_case(event_type, &prefix),
                };
                if let Some(event) = remainder.and_then(split_version) {
                    events.insert(event);
                }
            }
        }
        events.into_iter().collect()
    }

    /// Every event type currently subscribed to, in fully qualified form.
    ///
    /// Exact-matching types are qualified with the prefix and the cleaned
    /// subscription source.
    pub fn published_event_types(&self) -> Vec<String> {
        let mut types = BTreeSet::new();
        for subscription in self.subscriptions.list() {
            for event_type in &subscription.spec.types {
                match subscription.spec.type_matching {
                    TypeMatching::Standard => {
                        types.insert(event_type.clone());
                    }
                    TypeMatching::Exact => {
                        if let Some(event) = split_version(event_type) {
                            types.insert(build(
                                &self.prefix,
                                &clean_name(&subscription.spec.source),
                                &event.name,
                                &event.version,
                            ));
                        }
                    }
                }
            }
        }
        types.into_iter().collect()
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor").field("prefix", &self.prefix).finish()
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &value[prefix.len()..])
}

fn split_version(event_type: &str) -> Option<Event> {
    let (name, version) = event_type.rsplit_once('.')?;
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some(Event {
        name: name.to_string(),
        version: version.to_string(),
    })
}
