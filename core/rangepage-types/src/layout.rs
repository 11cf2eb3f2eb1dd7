use serde::{Deserialize, Serialize};

/// Describes which item attributes feed a [`Record`](crate::Record)'s known fields.
///
/// Every attribute not named here is carried in the record's opaque rest map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    /// Attribute holding the partition key.
    pub partition_key: String,
    /// Attribute holding the sort key.
    pub sort_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Nested list of sub-items, each with its own category/name attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_items: Option<SubItemLayout>,
}

impl FieldLayout {
    /// A layout with only the two key attributes.
    pub fn new(partition_key: &str, sort_key: &str) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
            category: None,
            name: None,
            status: None,
            sub_items: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, attribute: &str) -> Self {
        self.category = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, attribute: &str) -> Self {
        self.name = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, attribute: &str) -> Self {
        self.status = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn with_sub_items(mut self, sub_items: SubItemLayout) -> Self {
        self.sub_items = Some(sub_items);
        self
    }
}

/// Layout of the entries of a nested list attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubItemLayout {
    /// Attribute holding the list.
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SubItemLayout {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.into(),
            category: None,
            name: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, attribute: &str) -> Self {
        self.category = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, attribute: &str) -> Self {
        self.name = Some(attribute.into());
        self
    }
}
