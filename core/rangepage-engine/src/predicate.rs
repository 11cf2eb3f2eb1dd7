//! Predicate evaluation over records and their nested lists.

use rangepage_types::{FilterScope, FilterSet, Record, SubItem};

/// Case-insensitive whole-word match: the lowercased `query` must equal one of
/// the whitespace-separated tokens of the lowercased `candidate`.
#[must_use]
pub fn matches_word(candidate: &str, query: &str) -> bool {
    let query = query.to_lowercase();
    candidate
        .to_lowercase()
        .split_whitespace()
        .any(|token| token == query)
}

/// A filter set bound to the scope its category and name filters apply to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    filters: FilterSet,
    scope: FilterScope,
}

impl Predicate {
    pub fn new(filters: FilterSet, scope: FilterScope) -> Self {
        Self {
            filters: filters.normalized(),
            scope,
        }
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns the record if it passes, with its nested list reduced to the
    /// matching entries under sub-item scope.
    #[must_use]
    pub fn apply(&self, mut record: Record) -> Option<Record> {
        if let Some(status) = &self.filters.status
            && record.status.as_deref() != Some(status.as_str())
        {
            return None;
        }

        match self.scope {
            FilterScope::Record => {
                self.fields_match(record.category.as_deref(), record.name.as_deref())
                    .then_some(record)
            }
            FilterScope::SubItems => {
                if self.filters.category.is_none() && self.filters.name.is_none() {
                    return Some(record);
                }
                let entries = record.sub_items.take()?;
                let kept: Vec<SubItem> = entries
                    .into_iter()
                    .filter(|entry| self.fields_match(entry.category(), entry.name()))
                    .collect();
                if kept.is_empty() {
                    return None;
                }
                record.sub_items = Some(kept);
                Some(record)
            }
        }
    }

    fn fields_match(&self, category: Option<&str>, name: Option<&str>) -> bool {
        let category_ok = match &self.filters.category {
            Some(wanted) => category == Some(wanted.as_str()),
            None => true,
        };
        let name_ok = match &self.filters.name {
            Some(query) => name.is_some_and(|n| matches_word(n, query)),
            None => true,
        };
        category_ok && name_ok
    }
}
