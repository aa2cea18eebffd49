//! The normalized event record shared by every probe

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Which probe produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Vitals,
    NavigationTiming,
    Paint,
    Resource,
    LongTask,
    Visibility,
    Snapshot,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vitals => "vitals",
            Category::NavigationTiming => "navigation-timing",
            Category::Paint => "paint",
            Category::Resource => "resource",
            Category::LongTask => "long-task",
            Category::Visibility => "visibility",
            Category::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative bucket reported alongside a vitals metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rating {
    Good,
    NeedsImprovement,
    Poor,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Good => "good",
            Rating::NeedsImprovement => "needs-improvement",
            Rating::Poor => "poor",
        }
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(Rating::Good),
            "needs-improvement" => Ok(Rating::NeedsImprovement),
            "poor" => Ok(Rating::Poor),
            other => Err(format!("Unknown rating: {}", other)),
        }
    }
}

/// A single normalized measurement.
///
/// `category` and `name` are always present. Everything else is optional and
/// skipped during serialization when absent, so consumers never see `null`
/// placeholders. Build with [`Event::new`] and the `with_*` methods; once
/// handed to an emitter an event is not touched again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub category: Category,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl Event {
    pub fn new(category: Category, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
            value: None,
            rating: None,
            delta: None,
            id: None,
            url: None,
            navigation_type: None,
            timestamp: None,
            details: None,
        }
    }

    /// Non-finite values are dropped
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value).filter(|v| v.is_finite());
        self
    }

    pub fn with_rating(mut self, rating: Option<Rating>) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_delta(mut self, delta: Option<f64>) -> Self {
        self.delta = delta.filter(|d| d.is_finite());
        self
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn with_navigation_type(mut self, navigation_type: Option<String>) -> Self {
        self.navigation_type = navigation_type;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attach auxiliary fields. An empty set leaves `details` absent.
    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details.into_map();
        self
    }

    /// Look up a single auxiliary field
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref().and_then(|d| d.get(key))
    }
}

/// Builder for the open `details` mapping.
///
/// Only present values are inserted; non-finite numbers count as absent.
#[derive(Debug, Clone, Default)]
pub struct Details {
    fields: Map<String, Value>,
}

impl Details {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number(mut self, key: &str, value: Option<f64>) -> Self {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.fields.insert(key.to_string(), Value::from(v));
        }
        self
    }

    pub fn text(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(v) = value {
            self.fields.insert(key.to_string(), Value::from(v));
        }
        self
    }

    pub fn flag(mut self, key: &str, value: Option<bool>) -> Self {
        if let Some(v) = value {
            self.fields.insert(key.to_string(), Value::from(v));
        }
        self
    }

    pub fn json(mut self, key: &str, value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => {}
            Some(v) => {
                self.fields.insert(key.to_string(), v);
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn into_map(self) -> Option<Map<String, Value>> {
        if self.fields.is_empty() {
            None
        } else {
            Some(self.fields)
        }
    }
}
