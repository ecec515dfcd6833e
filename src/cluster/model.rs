//! Cluster object models consumed by the publishing pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label that overrides an application's name in event types.
pub const APPLICATION_TYPE_LABEL: &str = "application-type";

/// Objects that can be looked up by key in a lister.
pub trait Named {
    /// Lookup key: `name` for cluster-scoped objects, `namespace/name`
    /// otherwise.
    fn key(&self) -> String;
}

/// An Application custom resource, reduced to what type resolution needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Application {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// The `application-type` label if set and non-blank, else the name.
    pub fn type_or_name(&self) -> &str {
        match self.labels.get(APPLICATION_TYPE_LABEL) {
            Some(t) if !t.trim().is_empty() => t,
            _ => &self.name,
        }
    }
}

impl Named for Application {
    fn key(&self) -> String {
        self.name.clone()
    }
}

/// How a subscription's types are matched against published events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeMatching {
    #[default]
    Standard,
    Exact,
}

/// The subset of a Subscription spec the publisher reads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub type_matching: TypeMatching,
}

/// A Subscription custom resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Subscription {
    pub name: String,
    pub namespace: String,
    pub spec: SubscriptionSpec,
}

impl Named for Subscription {
    fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_label_overrides_name() {
        let app = Application::new("varkes").with_label(APPLICATION_TYPE_LABEL, "commerce");
        assert_eq!(app.type_or_name(), "commerce");
        assert_eq!(Application::new("varkes").type_or_name(), "varkes");
    }

    #[test]
    fn test_blank_type_label_ignored() {
        let app = Application::new("varkes").with_label(APPLICATION_TYPE_LABEL, " ");
        assert_eq!(app.type_or_name(), "varkes");
    }

    #[test]
    fn test_spec_deserialization() {
        let spec: SubscriptionSpec = serde_json::from_value(serde_json::json!({
            "source": "commerce",
            "types": ["order.created.v1"],
            "typeMatching": "exact",
            "sink": "http://ignored"
        }))
        .unwrap();
        assert_eq!(spec.type_matching, TypeMatching::Exact);
        assert_eq!(spec.types, vec!["order.created.v1"]);

        let defaulted: SubscriptionSpec = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(defaulted.type_matching, TypeMatching::Standard);
    }
}
