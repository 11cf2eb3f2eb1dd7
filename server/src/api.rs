//! Wire types and handlers for the listing endpoints.

use crate::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use rangepage_engine::{EngineError, ListingEngine, ListingPage, ListingProfile, ListingRequest};
use rangepage_types::{FilterSet, Item, KeyValue, ScanMode, StopReason};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Body accepted by every listing endpoint. Unknown keys are ignored.
///
/// Each field may arrive under several names; when more than one is present
/// the first one listed on the field wins. Values of the wrong type are
/// treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ListingBody {
    /// `partition_key`, `local_id`, `tenant_id`.
    pub partition_key: Option<Value>,
    local_id: Option<Value>,
    tenant_id: Option<Value>,

    /// `category`, `categoria`.
    #[serde(deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    categoria: Option<String>,

    /// `name`, `nombre`.
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    nombre: Option<String>,

    /// `status`, `estado`.
    #[serde(deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    estado: Option<String>,

    /// `page_size`, `size`, `limit`.
    #[serde(deserialize_with = "lenient_int")]
    pub page_size: Option<i64>,
    #[serde(deserialize_with = "lenient_int")]
    size: Option<i64>,
    #[serde(deserialize_with = "lenient_int")]
    limit: Option<i64>,

    /// `cursor`, `next_token`.
    #[serde(deserialize_with = "lenient_text")]
    pub cursor: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    next_token: Option<String>,

    /// `want_total`, `include_total`.
    #[serde(deserialize_with = "lenient_bool")]
    pub want_total: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    include_total: Option<bool>,

    #[serde(deserialize_with = "lenient_int")]
    pub page: Option<i64>,
}

impl ListingBody {
    fn parse(bytes: &[u8]) -> Result<Self, ApiError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let body: Self = serde_json::from_slice(bytes)
            .map_err(|e| ApiError::BadRequest(format!("invalid body: {e}")))?;
        Ok(body.merged())
    }

    /// Folds every alias into its canonical field.
    fn merged(self) -> Self {
        Self {
            partition_key: self
                .partition_key
                .filter(|v| !v.is_null())
                .or(self.local_id.filter(|v| !v.is_null()))
                .or(self.tenant_id.filter(|v| !v.is_null())),
            category: self.category.or(self.categoria),
            name: self.name.or(self.nombre),
            status: self.status.or(self.estado),
            page_size: self.page_size.or(self.size).or(self.limit),
            cursor: self.cursor.or(self.next_token),
            want_total: self.want_total.or(self.include_total),
            page: self.page,
            ..Self::default()
        }
    }

    fn partition(&self) -> Option<KeyValue> {
        self.partition_key.as_ref().and_then(KeyValue::from_json)
    }

    fn into_request(self, partition: Option<KeyValue>) -> ListingRequest {
        ListingRequest {
            partition,
            filters: FilterSet {
                category: self.category,
                name: self.name,
                status: self.status,
            },
            page_size: self.page_size,
            cursor: self.cursor,
            want_total: self.want_total.unwrap_or(false),
            page: self.page.map(|p| p.max(0).unsigned_abs()),
        }
    }
}

fn truncate(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.trunc() as i64)
}

/// Integers, numeric strings and truncated fractions; anything else is absent.
fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    }))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Some(Value::String(s)) => {
            let s = s.trim().to_ascii_lowercase();
            Some(matches!(s.as_str(), "true" | "1" | "yes"))
        }
        _ => None,
    })
}

/// Strings as given; any other JSON value is absent.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// JSON shape of a listing result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingResponse {
    pub items: Vec<Item>,
    pub page_size: usize,
    pub cursor: Option<String>,
    pub mode: ScanMode,
    pub stop: StopReason,
    pub fetches: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_approximate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
}

impl ListingResponse {
    fn from_page(page: ListingPage, profile: &ListingProfile) -> Self {
        Self {
            items: page
                .items
                .into_iter()
                .map(|r| r.into_item(&profile.layout))
                .collect(),
            page_size: page.page_size,
            cursor: page.cursor,
            mode: page.mode,
            stop: page.stop,
            fetches: page.fetches,
            total: page.total.map(|t| t.total),
            total_pages: page.total.map(|t| t.total_pages),
            total_approximate: page.total.map(|t| t.approximate),
            page: page.page,
        }
    }
}

/// Request failures and their HTTP status.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    Engine(EngineError),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            Self::Forbidden(m) => (StatusCode::FORBIDDEN, m),
            Self::Engine(EngineError::InvalidInput(m)) => (StatusCode::BAD_REQUEST, m),
            Self::Engine(EngineError::Cancelled) => {
                (StatusCode::GATEWAY_TIMEOUT, "request timed out".to_string())
            }
            Self::Engine(e) => {
                error!("Listing failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Runs one listing under the configured deadline.
async fn run(
    state: &AppState,
    engine: &ListingEngine,
    profile: &ListingProfile,
    request: ListingRequest,
) -> Result<Json<ListingResponse>, ApiError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let deadline = state.request_timeout;
    let timer = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = tokio::time::sleep(deadline) => {
                warn!("Request deadline of {:?} reached", deadline);
                timer.cancel();
            }
            () = timer.cancelled() => {}
        }
    });

    let page = engine.list(profile, request, &cancel).await?;
    Ok(Json(ListingResponse::from_page(page, profile)))
}

pub(crate) async fn list_products(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ListingResponse>, ApiError> {
    let body = ListingBody::parse(&body)?;
    let partition = body.partition();
    let request = ListingBody {
        status: None,
        ..body
    }
    .into_request(partition);
    run(&state, &state.products, &state.product_profile, request).await
}

pub(crate) async fn list_restaurant_orders(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ListingResponse>, ApiError> {
    let body = ListingBody::parse(&body)?;
    let partition = body.partition();
    run(
        &state,
        &state.orders,
        &state.restaurant_profile,
        body.into_request(partition),
    )
    .await
}

pub(crate) async fn list_order_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ListingResponse>, ApiError> {
    let subject = authorize(&state, &headers).await?;
    let body = ListingBody::parse(&body)?;
    let request = ListingBody {
        category: None,
        name: None,
        status: None,
        ..body
    }
    .into_request(Some(KeyValue::Text(subject)));
    run(&state, &state.orders, &state.history_profile, request).await
}

/// Returns the credential subject of a bearer token carrying the client role.
async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Forbidden("missing bearer token".into()))?;

    let credential = state.credentials.validate(token).await;
    if !credential.valid {
        let reason = credential
            .error
            .unwrap_or_else(|| "invalid credential".into());
        debug!("Rejected credential: {}", reason);
        return Err(ApiError::Forbidden(reason));
    }
    let role_ok = credential
        .role
        .as_deref()
        .is_some_and(|r| r.eq_ignore_ascii_case(&state.client_role));
    if !role_ok {
        return Err(ApiError::Forbidden(
            "credential lacks the client role".into(),
        ));
    }
    credential
        .subject
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Forbidden("credential has no subject".into()))
}

pub(crate) async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
