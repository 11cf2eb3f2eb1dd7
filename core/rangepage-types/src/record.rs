//! Schema-less records with a fixed set of recognized fields.

use crate::key::KeyValue;
use crate::layout::{FieldLayout, SubItemLayout};
use crate::{Error, Result};
use serde_json::{Map, Value};

/// A raw store item: attribute name to JSON value.
pub type Item = Map<String, Value>;

/// A store item seen through a [`FieldLayout`].
///
/// The known fields are lifted out of the item; everything else stays in
/// `rest` and is written back unchanged by [`Record::into_item`]. A known text
/// field whose stored value is not a string is left in `rest`, so it never
/// matches a filter and still round-trips.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub partition_key: KeyValue,
    pub sort_key: KeyValue,
    pub category: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub sub_items: Option<Vec<SubItem>>,
    pub rest: Item,
}

impl Record {
    /// Reads a record out of a raw item.
    pub fn from_item(layout: &FieldLayout, mut item: Item) -> Result<Self> {
        let partition_key = take_key(&mut item, &layout.partition_key)?;
        let sort_key = take_key(&mut item, &layout.sort_key)?;
        let category = take_text(&mut item, layout.category.as_deref());
        let name = take_text(&mut item, layout.name.as_deref());
        let status = take_text(&mut item, layout.status.as_deref());

        let sub_items = layout.sub_items.as_ref().and_then(|sub| {
            match item.remove(&sub.field) {
                Some(Value::Array(entries)) => Some(
                    entries
                        .into_iter()
                        .map(|entry| SubItem::from_json(sub, entry))
                        .collect(),
                ),
                Some(other) => {
                    item.insert(sub.field.clone(), other);
                    None
                }
                None => None,
            }
        });

        Ok(Self {
            partition_key,
            sort_key,
            category,
            name,
            status,
            sub_items,
            rest: item,
        })
    }

    /// Writes the record back into a raw item.
    #[must_use]
    pub fn into_item(self, layout: &FieldLayout) -> Item {
        let mut item = self.rest;
        item.insert(layout.partition_key.clone(), self.partition_key.to_json());
        item.insert(layout.sort_key.clone(), self.sort_key.to_json());
        put_text(&mut item, layout.category.as_deref(), self.category);
        put_text(&mut item, layout.name.as_deref(), self.name);
        put_text(&mut item, layout.status.as_deref(), self.status);
        if let (Some(sub), Some(entries)) = (layout.sub_items.as_ref(), self.sub_items) {
            let list = entries.into_iter().map(|e| e.into_json(sub)).collect();
            item.insert(sub.field.clone(), Value::Array(list));
        }
        item
    }
}

/// One entry of a record's nested list.
#[derive(Debug, Clone, PartialEq)]
pub enum SubItem {
    /// An object entry with its recognized fields lifted out.
    Entry {
        category: Option<String>,
        name: Option<String>,
        rest: Item,
    },
    /// A non-object entry, carried as-is. Never matches a filter.
    Opaque(Value),
}

impl SubItem {
    /// Shorthand for an entry with no extra attributes.
    pub fn entry(category: Option<&str>, name: Option<&str>) -> Self {
        Self::Entry {
            category: category.map(str::to_string),
            name: name.map(str::to_string),
            rest: Item::new(),
        }
    }

    fn from_json(layout: &SubItemLayout, value: Value) -> Self {
        match value {
            Value::Object(mut fields) => {
                let category = take_text(&mut fields, layout.category.as_deref());
                let name = take_text(&mut fields, layout.name.as_deref());
                Self::Entry {
                    category,
                    name,
                    rest: fields,
                }
            }
            other => Self::Opaque(other),
        }
    }

    fn into_json(self, layout: &SubItemLayout) -> Value {
        match self {
            Self::Entry {
                category,
                name,
                rest,
            } => {
                let mut fields = rest;
                put_text(&mut fields, layout.category.as_deref(), category);
                put_text(&mut fields, layout.name.as_deref(), name);
                Value::Object(fields)
            }
            Self::Opaque(value) => value,
        }
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Entry { category, .. } => category.as_deref(),
            Self::Opaque(_) => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Entry { name, .. } => name.as_deref(),
            Self::Opaque(_) => None,
        }
    }
}

fn take_key(item: &mut Item, attribute: &str) -> Result<KeyValue> {
    let value = item
        .get(attribute)
        .ok_or_else(|| Error::MissingField(attribute.to_string()))?;
    let key = KeyValue::from_json(value).ok_or_else(|| Error::InvalidKey {
        field: attribute.to_string(),
        reason: format!("expected integer or string, found {value}"),
    })?;
    item.remove(attribute);
    Ok(key)
}

fn take_text(item: &mut Item, attribute: Option<&str>) -> Option<String> {
    let attribute = attribute?;
    if !item.get(attribute).is_some_and(Value::is_string) {
        return None;
    }
    match item.remove(attribute) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn put_text(item: &mut Item, attribute: Option<&str>, value: Option<String>) {
    if let (Some(attribute), Some(value)) = (attribute, value) {
        item.insert(attribute.to_string(), Value::String(value));
    }
}
