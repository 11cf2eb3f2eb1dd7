//! Listing profiles: what a listing looks like and how it picks its mode.

use rangepage_store::Equals;
use rangepage_types::{FieldLayout, FilterScope, FilterSet, ScanMode, SubItemLayout};
use serde::{Deserialize, Serialize};

/// How a listing derives its [`ScanMode`] from the filters present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModePolicy {
    /// Exhaustive as soon as any filter needs post-fetch evaluation.
    Strict,
    /// Exhaustive as soon as any filter is present, even a pushdown one.
    AnyFilter,
    /// Always bounded; post-fetch filters run inside the bounded loop with an
    /// over-fetch hint and may leave pages short.
    PostFilterBounded,
}

/// Static description of one listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingProfile {
    pub name: String,
    pub layout: FieldLayout,
    /// Secondary index the listing scans, if not the table itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    pub max_page_size: usize,
    /// Where category and name filters apply.
    pub filter_scope: FilterScope,
    pub mode_policy: ModePolicy,
}

impl ListingProfile {
    /// Products of one venue, keyed by product id.
    pub fn products() -> Self {
        Self {
            name: "products".into(),
            layout: FieldLayout::new("local_id", "producto_id")
                .with_category("categoria")
                .with_name("nombre"),
            index: None,
            max_page_size: 100,
            filter_scope: FilterScope::Record,
            mode_policy: ModePolicy::Strict,
        }
    }

    /// Orders of one venue, newest first, filtered on status and on the products inside.
    pub fn restaurant_orders() -> Self {
        Self {
            name: "restaurant_orders".into(),
            layout: FieldLayout::new("local_id", "created_at")
                .with_status("estado")
                .with_sub_items(
                    SubItemLayout::new("productos")
                        .with_category("categoria")
                        .with_name("nombre"),
                ),
            index: None,
            max_page_size: 1000,
            filter_scope: FilterScope::SubItems,
            mode_policy: ModePolicy::AnyFilter,
        }
    }

    /// One customer's orders across venues, through the `by_usuario_v2` index.
    pub fn order_history() -> Self {
        Self {
            name: "order_history".into(),
            layout: FieldLayout::new("correo", "created_at"),
            index: Some("by_usuario_v2".into()),
            max_page_size: 100,
            filter_scope: FilterScope::Record,
            mode_policy: ModePolicy::Strict,
        }
    }

    #[must_use]
    pub fn with_mode_policy(mut self, policy: ModePolicy) -> Self {
        self.mode_policy = policy;
        self
    }

    /// Keeps only the filters this listing has attributes for.
    #[must_use]
    pub fn applicable(&self, filters: FilterSet) -> FilterSet {
        let filters = filters.normalized();
        let sub = self.layout.sub_items.as_ref();
        let (has_category, has_name) = match self.filter_scope {
            FilterScope::Record => (self.layout.category.is_some(), self.layout.name.is_some()),
            FilterScope::SubItems => (
                sub.is_some_and(|s| s.category.is_some()),
                sub.is_some_and(|s| s.name.is_some()),
            ),
        };
        FilterSet {
            category: filters.category.filter(|_| has_category),
            name: filters.name.filter(|_| has_name),
            status: filters.status.filter(|_| self.layout.status.is_some()),
        }
    }

    /// The equality the store can evaluate during the fetch.
    #[must_use]
    pub fn pushdown(&self, filters: &FilterSet) -> Option<Equals> {
        if self.filter_scope != FilterScope::Record {
            return None;
        }
        let attribute = self.layout.category.as_deref()?;
        let value = filters.category.as_deref()?;
        Some(Equals::new(attribute, value))
    }

    /// True if some filter can only be evaluated after the fetch.
    #[must_use]
    pub fn needs_post_filter(&self, filters: &FilterSet) -> bool {
        filters.name.is_some()
            || filters.status.is_some()
            || (filters.category.is_some() && self.pushdown(filters).is_none())
    }

    /// The mode a request with these filters runs under.
    #[must_use]
    pub fn mode_for(&self, filters: &FilterSet) -> ScanMode {
        let exhaustive = match self.mode_policy {
            ModePolicy::Strict => self.needs_post_filter(filters),
            ModePolicy::AnyFilter => !filters.is_empty(),
            ModePolicy::PostFilterBounded => false,
        };
        if exhaustive {
            ScanMode::Exhaustive
        } else {
            ScanMode::Bounded
        }
    }
}
