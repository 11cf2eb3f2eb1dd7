mod common;

use common::item;
use pretty_assertions::assert_eq;
use rangepage_engine::{ListingProfile, Predicate, matches_word};
use rangepage_types::{FilterScope, FilterSet, Record, SubItem};
use serde_json::json;

fn product(categoria: &str, nombre: &str) -> Record {
    let layout = ListingProfile::products().layout;
    Record::from_item(
        &layout,
        item(json!({
            "local_id": "L1",
            "producto_id": "p1",
            "categoria": categoria,
            "nombre": nombre,
        })),
    )
    .unwrap()
}

fn order_with(productos: serde_json::Value) -> Record {
    let layout = ListingProfile::restaurant_orders().layout;
    Record::from_item(
        &layout,
        item(json!({
            "local_id": "L1",
            "created_at": "2024-05-01T12:00:00Z",
            "estado": "pendiente",
            "productos": productos,
        })),
    )
    .unwrap()
}

#[test]
fn name_match_is_whole_word_and_case_insensitive() {
    assert!(matches_word("Cold Brew", "brew"));
    assert!(matches_word("Cold Brew", "COLD"));
    assert!(matches_word("  café\tcon   leche ", "leche"));
    assert!(!matches_word("Brewery Special", "brew"));
    assert!(!matches_word("Cold Brew", "cold brew"));
    assert!(!matches_word("", "brew"));
}

#[test]
fn empty_filter_set_is_identity() {
    let predicate = Predicate::new(FilterSet::new().with_name(""), FilterScope::Record);
    assert!(predicate.is_identity());

    let record = product("bebidas", "Cold Brew");
    assert_eq!(predicate.apply(record.clone()), Some(record));
}

#[test]
fn record_scope_ands_category_and_name() {
    let both = Predicate::new(
        FilterSet::new().with_category("bebidas").with_name("brew"),
        FilterScope::Record,
    );
    assert!(both.apply(product("bebidas", "Cold Brew")).is_some());
    assert!(both.apply(product("comidas", "Cold Brew")).is_none());
    assert!(both.apply(product("bebidas", "Brewery Special")).is_none());
}

#[test]
fn category_is_exact_equality() {
    let predicate = Predicate::new(FilterSet::new().with_category("bebidas"), FilterScope::Record);
    assert!(predicate.apply(product("Bebidas", "Agua")).is_none());
    assert!(predicate.apply(product("bebidas", "Agua")).is_some());
}

#[test]
fn non_string_name_never_matches() {
    let layout = ListingProfile::products().layout;
    let record = Record::from_item(
        &layout,
        item(json!({"local_id": "L1", "producto_id": "p1", "nombre": 42})),
    )
    .unwrap();
    let predicate = Predicate::new(FilterSet::new().with_name("42"), FilterScope::Record);
    assert!(predicate.apply(record).is_none());
}

#[test]
fn sub_item_filter_keeps_only_matching_entries() {
    let record = order_with(json!([
        {"categoria": "drinks", "nombre": "Cold Brew", "cantidad": 2},
        {"categoria": "food", "nombre": "Lomo Saltado", "cantidad": 1},
    ]));
    let predicate = Predicate::new(FilterSet::new().with_category("drinks"), FilterScope::SubItems);

    let kept = predicate.apply(record).unwrap();
    let entries = kept.sub_items.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category(), Some("drinks"));
    assert_eq!(entries[0].name(), Some("Cold Brew"));
    match &entries[0] {
        SubItem::Entry { rest, .. } => assert_eq!(rest["cantidad"], 2),
        SubItem::Opaque(_) => panic!("expected an object entry"),
    }
}

#[test]
fn sub_item_category_and_name_must_hold_on_the_same_entry() {
    let record = order_with(json!([
        {"categoria": "drinks", "nombre": "Agua"},
        {"categoria": "food", "nombre": "Brew Burger"},
    ]));
    let predicate = Predicate::new(
        FilterSet::new().with_category("drinks").with_name("brew"),
        FilterScope::SubItems,
    );
    assert!(predicate.apply(record).is_none());
}

#[test]
fn record_without_sub_items_is_dropped_under_sub_item_filter() {
    let layout = ListingProfile::restaurant_orders().layout;
    let record = Record::from_item(
        &layout,
        item(json!({"local_id": "L1", "created_at": "2024-05-01", "estado": "pendiente"})),
    )
    .unwrap();
    let predicate = Predicate::new(FilterSet::new().with_name("brew"), FilterScope::SubItems);
    assert!(predicate.apply(record).is_none());
}

#[test]
fn opaque_entries_never_match() {
    let record = order_with(json!(["drinks", null, {"categoria": "drinks"}]));
    let predicate = Predicate::new(FilterSet::new().with_category("drinks"), FilterScope::SubItems);
    let kept = predicate.apply(record).unwrap().sub_items.unwrap();
    assert_eq!(kept, vec![SubItem::entry(Some("drinks"), None)]);
}

#[test]
fn status_applies_to_the_whole_record() {
    let record = order_with(json!([{"categoria": "drinks"}]));

    let listo = Predicate::new(FilterSet::new().with_status("listo"), FilterScope::SubItems);
    assert!(listo.apply(record.clone()).is_none());

    let pendiente = Predicate::new(
        FilterSet::new().with_status("pendiente"),
        FilterScope::SubItems,
    );
    let kept = pendiente.apply(record.clone()).unwrap();
    assert_eq!(kept, record);
}
