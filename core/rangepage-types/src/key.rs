//! Key attribute values and scan positions.
//!
//! A [`ResumePoint`] is the store's notion of "where a forward scan left off":
//! an ordered list of named key components. It is produced by the store and
//! handed back unchanged on the next fetch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The value of a key attribute (partition key, sort key or index key).
///
/// Every integer sorts before every string, integers numerically and strings
/// lexicographically. This is the same cross-type order SQLite applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Int(i64),
    Text(String),
}

impl KeyValue {
    /// Reads a key value from a JSON value. Only integers and strings qualify.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Int),
            _ => None,
        }
    }

    /// Returns the JSON form of this key value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    /// Returns the text content, if this is a text key.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for KeyValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// One named component of a resume point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyComponent {
    pub name: String,
    pub value: KeyValue,
}

impl KeyComponent {
    pub fn new(name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A store-native scan position.
///
/// Component order is significant and names are unique; [`ResumePoint::push`]
/// ignores a component whose name is already present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumePoint(Vec<KeyComponent>);

impl ResumePoint {
    /// Creates an empty resume point.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a resume point from components, dropping duplicate names.
    #[must_use]
    pub fn from_components(components: impl IntoIterator<Item = KeyComponent>) -> Self {
        let mut point = Self::new();
        for component in components {
            point.push(component);
        }
        point
    }

    /// Appends a component unless one with the same name exists.
    pub fn push(&mut self, component: KeyComponent) {
        if self.get(&component.name).is_none() {
            self.0.push(component);
        }
    }

    /// Builder form of [`ResumePoint::push`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.push(KeyComponent::new(name, value));
        self
    }

    /// Looks up a component value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&KeyValue> {
        self.0.iter().find(|c| c.name == name).map(|c| &c.value)
    }

    /// Returns the components in order.
    #[must_use]
    pub fn components(&self) -> &[KeyComponent] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
