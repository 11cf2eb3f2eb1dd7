//! Table and index key schemas.
//!
//! A table is keyed by (partition key, sort key). An index re-keys the same
//! items by another (partition key, sort key) pair; items lacking either index
//! attribute are not part of the index.

use crate::error::{StoreError, StoreResult};
use rangepage_types::{Item, KeyComponent, KeyValue, ResumePoint};
use serde::{Deserialize, Serialize};

/// Key layout of one table and its secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub partition_key: String,
    pub sort_key: String,
    #[serde(default)]
    pub indexes: Vec<IndexSchema>,
}

/// A secondary index over a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub name: String,
    pub partition_key: String,
    pub sort_key: String,
}

impl IndexSchema {
    pub fn new(name: &str, partition_key: &str, sort_key: &str) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
        }
    }
}

/// The (partition, sort) attribute pair a scan is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyAttributes<'a> {
    pub partition: &'a str,
    pub sort: &'a str,
}

impl TableSchema {
    pub fn new(name: &str, partition_key: &str, sort_key: &str) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
            indexes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_index(mut self, index: IndexSchema) -> Self {
        self.indexes.push(index);
        self
    }

    /// Rejects names the SQL backend cannot embed safely.
    pub fn validate(&self) -> StoreResult<()> {
        let table_ok = !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !table_ok {
            return Err(StoreError::InvalidData(format!(
                "table name must be [A-Za-z0-9_]+: {:?}",
                self.name
            )));
        }
        let attributes = [&self.partition_key, &self.sort_key]
            .into_iter()
            .chain(self.indexes.iter().flat_map(|i| [&i.partition_key, &i.sort_key]));
        for attribute in attributes {
            if attribute.is_empty() || attribute.contains(['"', '\'', '\\']) {
                return Err(StoreError::InvalidData(format!(
                    "invalid key attribute name: {attribute:?}"
                )));
            }
        }
        Ok(())
    }

    /// Key attributes of the table itself or of the named index.
    pub fn key_attributes(&self, index: Option<&str>) -> StoreResult<KeyAttributes<'_>> {
        match index {
            None => Ok(KeyAttributes {
                partition: &self.partition_key,
                sort: &self.sort_key,
            }),
            Some(name) => self
                .indexes
                .iter()
                .find(|i| i.name == name)
                .map(|i| KeyAttributes {
                    partition: &i.partition_key,
                    sort: &i.sort_key,
                })
                .ok_or_else(|| StoreError::UnknownIndex(name.to_string())),
        }
    }

    /// Attributes making up a resume point: scan partition key, scan sort key,
    /// then the table keys, without repeats.
    pub fn position_attributes(&self, index: Option<&str>) -> StoreResult<Vec<&str>> {
        let keys = self.key_attributes(index)?;
        let mut attributes: Vec<&str> = Vec::with_capacity(4);
        for attribute in [
            keys.partition,
            keys.sort,
            self.partition_key.as_str(),
            self.sort_key.as_str(),
        ] {
            if !attributes.contains(&attribute) {
                attributes.push(attribute);
            }
        }
        Ok(attributes)
    }

    /// Attributes a scan within one partition is ordered by, most significant first.
    pub fn scan_order(&self, index: Option<&str>) -> StoreResult<Vec<&str>> {
        let keys = self.key_attributes(index)?;
        let mut attributes = self.position_attributes(index)?;
        attributes.retain(|a| *a != keys.partition);
        Ok(attributes)
    }

    /// The resume point that continues a scan right after `item`.
    pub fn position_of(&self, item: &Item, index: Option<&str>) -> StoreResult<ResumePoint> {
        let mut point = ResumePoint::new();
        for attribute in self.position_attributes(index)? {
            let value = item
                .get(attribute)
                .and_then(KeyValue::from_json)
                .ok_or_else(|| {
                    StoreError::InvalidData(format!("item has no key attribute {attribute}"))
                })?;
            point.push(KeyComponent::new(attribute, value));
        }
        Ok(point)
    }

    /// Reorders `point` into this table/index's component order, or returns
    /// `None` if it was not produced by a scan of `partition` here.
    #[must_use]
    pub fn canonicalize(
        &self,
        point: &ResumePoint,
        index: Option<&str>,
        partition: &KeyValue,
    ) -> Option<ResumePoint> {
        let keys = self.key_attributes(index).ok()?;
        let attributes = self.position_attributes(index).ok()?;
        if point.len() != attributes.len() || point.get(keys.partition) != Some(partition) {
            return None;
        }
        attributes
            .into_iter()
            .map(|a| point.get(a).map(|v| KeyComponent::new(a, v.clone())))
            .collect::<Option<Vec<_>>>()
            .map(ResumePoint::from_components)
    }

    /// Ordering key of an item within a scan, or `None` if the item is not
    /// part of the table/index.
    #[must_use]
    pub fn scan_key_of_item(&self, item: &Item, index: Option<&str>) -> Option<Vec<KeyValue>> {
        self.scan_order(index)
            .ok()?
            .into_iter()
            .map(|attribute| item.get(attribute).and_then(KeyValue::from_json))
            .collect()
    }

    /// Ordering key encoded in a resume point.
    pub fn scan_key_of_point(
        &self,
        point: &ResumePoint,
        index: Option<&str>,
    ) -> StoreResult<Vec<KeyValue>> {
        self.scan_order(index)?
            .into_iter()
            .map(|attribute| {
                point.get(attribute).cloned().ok_or_else(|| {
                    StoreError::InvalidData(format!("resume point has no component {attribute}"))
                })
            })
            .collect()
    }

    /// Table primary key of an item.
    pub(crate) fn primary_key_of(&self, item: &Item) -> StoreResult<(KeyValue, KeyValue)> {
        let read = |attribute: &str| {
            item.get(attribute)
                .and_then(KeyValue::from_json)
                .ok_or_else(|| {
                    StoreError::InvalidData(format!(
                        "item for table {} has no valid {attribute}",
                        self.name
                    ))
                })
        };
        Ok((read(&self.partition_key)?, read(&self.sort_key)?))
    }
}
