use pretty_assertions::assert_eq;
use rangepage_server::{
    AppState, ListingResponse, ServerConfig, StaticCredential, StaticCredentials, build_router,
    orders_schema, products_schema,
};
use async_trait::async_trait;
use rangepage_store::{
    CountPage, MemoryStore, PageQuery, PartitionStore, RawPage, SqliteStore, StoreResult,
    TableSchema,
};
use rangepage_types::{Item, ScanMode};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

fn item(value: Value) -> Item {
    value.as_object().cloned().unwrap()
}

fn seeded_products() -> MemoryStore {
    let store = MemoryStore::new(products_schema("productos"));
    for n in 1..=25 {
        store
            .put(item(json!({
                "local_id": "L1",
                "producto_id": format!("p{n:02}"),
                "categoria": if n % 5 == 0 { "postres" } else { "platos" },
                "nombre": if n == 7 { "Cold Brew".to_string() } else { format!("Plato {n}") },
                "precio": 10 + n,
            })))
            .unwrap();
    }
    store
}

fn seeded_orders() -> MemoryStore {
    let store = MemoryStore::new(orders_schema("pedidos"));
    let rows = [
        (
            "L1",
            "2024-05-01T09:00:00Z",
            "ana@x.pe",
            "pendiente",
            json!([
                {"categoria": "drinks", "nombre": "Chicha"},
                {"categoria": "food", "nombre": "Lomo"}
            ]),
        ),
        (
            "L1",
            "2024-05-02T09:00:00Z",
            "luis@x.pe",
            "listo",
            json!([{"categoria": "food", "nombre": "Ceviche"}]),
        ),
        (
            "L1",
            "2024-05-03T09:00:00Z",
            "ana@x.pe",
            "pendiente",
            json!([{"categoria": "drinks", "nombre": "Agua"}]),
        ),
        ("L2", "2024-05-04T09:00:00Z", "ana@x.pe", "listo", json!([])),
    ];
    for (local, created_at, correo, estado, productos) in rows {
        store
            .put(item(json!({
                "local_id": local,
                "created_at": created_at,
                "correo": correo,
                "estado": estado,
                "productos": productos,
            })))
            .unwrap();
    }
    store
}

/// Delegates to an inner store after sleeping on every call.
struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
}

#[async_trait]
impl PartitionStore for SlowStore {
    fn schema(&self) -> &TableSchema {
        self.inner.schema()
    }

    async fn query(&self, query: &PageQuery) -> StoreResult<RawPage> {
        tokio::time::sleep(self.delay).await;
        self.inner.query(query).await
    }

    async fn count(&self, query: &PageQuery) -> StoreResult<CountPage> {
        tokio::time::sleep(self.delay).await;
        self.inner.count(query).await
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        credentials: vec![
            StaticCredential {
                token: "tok-ana".into(),
                subject: "ana@x.pe".into(),
                role: "Cliente".into(),
            },
            StaticCredential {
                token: "tok-staff".into(),
                subject: "staff@x.pe".into(),
                role: "empleado".into(),
            },
        ],
        ..ServerConfig::default()
    }
}

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
async fn spawn_test_server() -> String {
    let config = test_config();
    let state = AppState::new(
        Arc::new(seeded_products()),
        Arc::new(seeded_orders()),
        Arc::new(StaticCredentials::new(config.credentials.clone())),
        &config,
    );
    serve(state).await
}

async fn serve(state: AppState) -> String {
    let app = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

async fn post(base: &str, path: &str, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

fn sort_keys(body: &ListingResponse, attribute: &str) -> Vec<String> {
    body.items
        .iter()
        .map(|i| i[attribute].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let base = spawn_test_server().await;
    let resp = reqwest::get(format!("{base}/api/v1/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn products_page_through_with_next_token() {
    let base = spawn_test_server().await;
    let mut token: Option<String> = None;
    let mut sizes = Vec::new();
    loop {
        let resp = post(
            &base,
            "/api/v1/products/list",
            json!({"local_id": "L1", "size": "10", "next_token": token}),
        )
        .await;
        assert_eq!(resp.status(), 200);
        let body: ListingResponse = resp.json().await.unwrap();
        assert_eq!(body.mode, ScanMode::Bounded);
        assert_eq!(body.page_size, 10);
        sizes.push(body.items.len());
        token = body.cursor;
        if token.is_none() {
            break;
        }
    }
    assert_eq!(sizes, vec![10, 10, 5]);
}

#[tokio::test]
async fn products_items_round_trip_unknown_fields() {
    let base = spawn_test_server().await;
    let resp = post(
        &base,
        "/api/v1/products/list",
        json!({"tenant_id": "L1", "limit": 1.9}),
    )
    .await;
    let body: ListingResponse = resp.json().await.unwrap();
    assert_eq!(body.page_size, 1);
    assert_eq!(
        Value::Object(body.items[0].clone()),
        json!({
            "local_id": "L1",
            "producto_id": "p25",
            "categoria": "postres",
            "nombre": "Plato 25",
            "precio": 35,
        })
    );
}

#[tokio::test]
async fn products_name_filter_returns_every_match() {
    let base = spawn_test_server().await;
    let resp = post(
        &base,
        "/api/v1/products/list",
        json!({"local_id": "L1", "nombre": "brew", "page_size": 2}),
    )
    .await;
    let body: ListingResponse = resp.json().await.unwrap();
    assert_eq!(body.mode, ScanMode::Exhaustive);
    assert_eq!(body.cursor, None);
    assert_eq!(sort_keys(&body, "producto_id"), vec!["p07"]);
}

#[tokio::test]
async fn products_total_block_is_reported() {
    let base = spawn_test_server().await;
    let resp = post(
        &base,
        "/api/v1/products/list",
        json!({
            "local_id": "L1",
            "categoria": "postres",
            "size": 2,
            "include_total": true,
            "page": 0,
        }),
    )
    .await;
    let body: ListingResponse = resp.json().await.unwrap();
    assert_eq!(body.total, Some(5));
    assert_eq!(body.total_pages, Some(3));
    assert_eq!(body.total_approximate, Some(false));
    assert_eq!(body.page, Some(0));
    assert_eq!(sort_keys(&body, "producto_id"), vec!["p25", "p20"]);

    let past = post(
        &base,
        "/api/v1/products/list",
        json!({
            "local_id": "L1",
            "categoria": "postres",
            "size": 2,
            "include_total": "true",
            "page": 5,
        }),
    )
    .await;
    let body: ListingResponse = past.json().await.unwrap();
    assert!(body.items.is_empty());
    assert_eq!(body.cursor, None);
    assert_eq!(body.total, Some(5));
}

#[tokio::test]
async fn missing_partition_is_a_bad_request() {
    let base = spawn_test_server().await;
    let resp = post(&base, "/api/v1/products/list", json!({"size": 5})).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("partition"));
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let base = spawn_test_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/v1/products/list"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn restaurant_orders_filter_sub_items() {
    let base = spawn_test_server().await;
    let resp = post(
        &base,
        "/api/v1/orders/restaurant",
        json!({"local_id": "L1", "categoria": "drinks"}),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: ListingResponse = resp.json().await.unwrap();
    assert_eq!(body.mode, ScanMode::Exhaustive);
    assert_eq!(
        sort_keys(&body, "created_at"),
        vec!["2024-05-03T09:00:00Z", "2024-05-01T09:00:00Z"]
    );
    assert_eq!(
        body.items[1]["productos"],
        json!([{"categoria": "drinks", "nombre": "Chicha"}])
    );
}

#[tokio::test]
async fn restaurant_orders_filter_on_status() {
    let base = spawn_test_server().await;
    let resp = post(
        &base,
        "/api/v1/orders/restaurant",
        json!({"local_id": "L1", "estado": "listo"}),
    )
    .await;
    let body: ListingResponse = resp.json().await.unwrap();
    assert_eq!(sort_keys(&body, "created_at"), vec!["2024-05-02T09:00:00Z"]);
}

#[tokio::test]
async fn order_history_uses_the_credential_subject() {
    let base = spawn_test_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/v1/orders/history"))
        .bearer_auth("tok-ana")
        .json(&json!({"correo": "luis@x.pe", "size": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: ListingResponse = resp.json().await.unwrap();
    assert_eq!(
        sort_keys(&body, "created_at"),
        vec!["2024-05-04T09:00:00Z", "2024-05-03T09:00:00Z"]
    );
    assert!(body.items.iter().all(|i| i["correo"] == "ana@x.pe"));
    assert!(body.cursor.is_some());
}

#[tokio::test]
async fn order_history_rejects_bad_credentials() {
    let base = spawn_test_server().await;
    let client = reqwest::Client::new();
    let url = format!("{base}/api/v1/orders/history");

    let missing = client.post(&url).json(&json!({})).send().await.unwrap();
    assert_eq!(missing.status(), 403);

    let unknown = client
        .post(&url)
        .bearer_auth("tok-nobody")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), 403);

    let wrong_role = client
        .post(&url)
        .bearer_auth("tok-staff")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_role.status(), 403);
}

#[tokio::test]
async fn sqlite_backed_listing_matches_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("listings.db");
    let products = SqliteStore::open(&path, products_schema("productos")).unwrap();
    products
        .put_all((1..=12).map(|n| {
            item(json!({
                "local_id": "L1",
                "producto_id": format!("p{n:02}"),
                "categoria": "platos",
                "nombre": format!("Plato {n}"),
            }))
        }))
        .unwrap();
    let orders = SqliteStore::open(&path, orders_schema("pedidos")).unwrap();

    let config = test_config();
    let state = AppState::new(
        Arc::new(products),
        Arc::new(orders),
        Arc::new(StaticCredentials::new(config.credentials.clone())),
        &config,
    );
    let base = serve(state).await;

    let first: ListingResponse = post(
        &base,
        "/api/v1/products/list",
        json!({"local_id": "L1", "size": 5}),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(
        sort_keys(&first, "producto_id"),
        vec!["p12", "p11", "p10", "p09", "p08"]
    );
    let second: ListingResponse = post(
        &base,
        "/api/v1/products/list",
        json!({"local_id": "L1", "size": 5, "cursor": first.cursor}),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(
        sort_keys(&second, "producto_id"),
        vec!["p07", "p06", "p05", "p04", "p03"]
    );
}

#[tokio::test]
async fn partition_and_page_size_aliases_may_appear_together() {
    let base = spawn_test_server().await;

    let resp = post(
        &base,
        "/api/v1/products/list",
        json!({"local_id": "L1", "tenant_id": "legacy", "size": 3}),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: ListingResponse = resp.json().await.unwrap();
    assert_eq!(sort_keys(&body, "producto_id"), vec!["p25", "p24", "p23"]);

    let resp = post(
        &base,
        "/api/v1/products/list",
        json!({"local_id": "L1", "size": 3, "limit": 5}),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: ListingResponse = resp.json().await.unwrap();
    assert_eq!(body.page_size, 3);
    assert_eq!(body.items.len(), 3);
}

#[tokio::test]
async fn tenant_id_is_used_when_local_id_is_null() {
    let base = spawn_test_server().await;
    let resp = post(
        &base,
        "/api/v1/products/list",
        json!({"local_id": null, "tenant_id": "L1", "size": 2}),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: ListingResponse = resp.json().await.unwrap();
    assert_eq!(sort_keys(&body, "producto_id"), vec!["p25", "p24"]);
}

#[tokio::test]
async fn non_string_cursor_starts_from_the_beginning() {
    let base = spawn_test_server().await;
    let resp = post(
        &base,
        "/api/v1/products/list",
        json!({"local_id": "L1", "size": 3, "next_token": 12345}),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: ListingResponse = resp.json().await.unwrap();
    assert_eq!(sort_keys(&body, "producto_id"), vec!["p25", "p24", "p23"]);
    assert!(body.cursor.is_some());
}

#[tokio::test]
async fn non_string_filters_are_ignored() {
    let base = spawn_test_server().await;
    let resp = post(
        &base,
        "/api/v1/products/list",
        json!({"local_id": "L1", "size": 4, "categoria": 7, "nombre": ["brew"]}),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: ListingResponse = resp.json().await.unwrap();
    assert_eq!(body.mode, ScanMode::Bounded);
    assert_eq!(
        sort_keys(&body, "producto_id"),
        vec!["p25", "p24", "p23", "p22"]
    );
}

#[tokio::test]
async fn slow_store_hits_the_request_deadline() {
    let config = ServerConfig {
        request_timeout_ms: 50,
        ..test_config()
    };
    let slow = SlowStore {
        inner: seeded_products(),
        delay: Duration::from_secs(5),
    };
    let state = AppState::new(
        Arc::new(slow),
        Arc::new(seeded_orders()),
        Arc::new(StaticCredentials::new(config.credentials.clone())),
        &config,
    );
    let base = serve(state).await;

    let resp = post(
        &base,
        "/api/v1/products/list",
        json!({"local_id": "L1", "size": 3}),
    )
    .await;
    assert_eq!(resp.status(), 504);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": "request timed out"}));
}
