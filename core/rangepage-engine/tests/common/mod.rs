#![allow(dead_code)]

use async_trait::async_trait;
use rangepage_engine::{EngineConfig, ListingEngine};
use rangepage_store::{
    CountPage, IndexSchema, MemoryStore, PageQuery, PartitionStore, RawPage, StoreError,
    StoreResult, TableSchema,
};
use rangepage_types::Item;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn item(value: Value) -> Item {
    value.as_object().cloned().unwrap()
}

pub fn products_schema() -> TableSchema {
    TableSchema::new("productos", "local_id", "producto_id")
}

pub fn orders_schema() -> TableSchema {
    TableSchema::new("pedidos", "local_id", "created_at")
        .with_index(IndexSchema::new("by_usuario_v2", "correo", "created_at"))
}

/// `count` products in venue `L1`, ids `p01..`, alternating bebidas/comidas.
pub fn product_store(count: usize) -> MemoryStore {
    let store = MemoryStore::new(products_schema());
    for n in 1..=count {
        store
            .put(item(json!({
                "local_id": "L1",
                "producto_id": format!("p{n:02}"),
                "categoria": if n % 2 == 0 { "comidas" } else { "bebidas" },
                "nombre": format!("Producto {n}"),
                "precio": n * 100,
            })))
            .unwrap();
    }
    store
        .put(item(json!({
            "local_id": "L2",
            "producto_id": "p01",
            "categoria": "bebidas",
            "nombre": "Otro local",
        })))
        .unwrap();
    store
}

pub fn order(local: &str, created_at: &str, estado: &str, productos: Value) -> Item {
    item(json!({
        "local_id": local,
        "created_at": created_at,
        "correo": "ana@x.pe",
        "estado": estado,
        "productos": productos,
    }))
}

pub fn engine(store: impl PartitionStore + 'static) -> ListingEngine {
    ListingEngine::new(Arc::new(store), EngineConfig::default())
}

pub fn ids(items: &[rangepage_types::Record]) -> Vec<String> {
    items.iter().map(|r| r.sort_key.to_string()).collect()
}

/// Counts store calls and optionally fails one of them.
pub struct ScriptedStore<S> {
    inner: S,
    fail_on_query: Option<usize>,
    query_delay: Option<Duration>,
    pub queries: AtomicUsize,
    pub counts: AtomicUsize,
}

impl<S: PartitionStore> ScriptedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_on_query: None,
            query_delay: None,
            queries: AtomicUsize::new(0),
            counts: AtomicUsize::new(0),
        }
    }

    /// Fails the `n`th query (1-based).
    pub fn failing_on(mut self, n: usize) -> Self {
        self.fail_on_query = Some(n);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }
}

#[async_trait]
impl<S: PartitionStore> PartitionStore for ScriptedStore<S> {
    fn schema(&self) -> &TableSchema {
        self.inner.schema()
    }

    async fn query(&self, query: &PageQuery) -> StoreResult<RawPage> {
        let n = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.query_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on_query == Some(n) {
            return Err(StoreError::Unavailable("throttled".into()));
        }
        self.inner.query(query).await
    }

    async fn count(&self, query: &PageQuery) -> StoreResult<CountPage> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.inner.count(query).await
    }
}
