//! Axum server and routes.

use audit_crypto::{decrypt_message, EncryptionError, Envelope, ORIGIN_APPLICATION};
use audit_types::{AuditEvent, AuditPage, AuditService, AuditServiceError, StoreError, ValidationError};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Request header carrying the continuation token on page reads.
pub const CONTINUATION_HEADER: &str = "ContinuationToken";

pub struct AppState {
    pub service: Arc<dyn AuditService>,
    /// Key for `/api/audit/envelope`; `None` answers 503 there.
    pub encryption_key: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/audit", post(handle_audit))
        .route("/api/audit/envelope", post(handle_envelope))
        .route(
            "/api/audit/:target_type/:target_id/:page_size",
            get(handle_page),
        )
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("could not decrypt envelope: {0}")]
    Encryption(#[from] EncryptionError),
    #[error("envelope ingest is not configured")]
    EnvelopeDisabled,
    #[error(transparent)]
    Service(#[from] AuditServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(e) => {
                let violations: Vec<serde_json::Value> = e
                    .violations()
                    .iter()
                    .map(|v| serde_json::json!({ "Field": v.field, "Message": v.message }))
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    serde_json::json!({ "Message": self.to_string(), "Violations": violations }),
                )
            }
            ApiError::Encryption(_) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "Message": self.to_string() }),
            ),
            ApiError::EnvelopeDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({ "Message": self.to_string() }),
            ),
            ApiError::Service(AuditServiceError::InvalidArgument(_))
            | ApiError::Service(AuditServiceError::Storage(StoreError::InvalidContinuation(_))) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "Message": self.to_string() }),
            ),
            ApiError::Service(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "Message": self.to_string() }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

async fn store_event(state: &AppState, event: &mut AuditEvent) -> Result<(), ApiError> {
    event.ensure_valid()?;
    state.service.audit(event).await?;
    tracing::debug!(
        operation = %event.operation_type,
        session_id = event.session_id.as_deref().unwrap_or_default(),
        "audit event stored"
    );
    Ok(())
}

async fn handle_audit(
    State(state): State<Arc<AppState>>,
    Json(mut event): Json<AuditEvent>,
) -> Result<Json<&'static str>, ApiError> {
    store_event(&state, &mut event).await?;
    Ok(Json("OK"))
}

async fn handle_envelope(
    State(state): State<Arc<AppState>>,
    Json(envelope): Json<Envelope>,
) -> Result<Json<&'static str>, ApiError> {
    let key = state
        .encryption_key
        .as_deref()
        .ok_or(ApiError::EnvelopeDisabled)?;
    let mut event: AuditEvent = decrypt_message(&envelope, key)?;
    tracing::debug!(
        origin = envelope.property(ORIGIN_APPLICATION).unwrap_or_default(),
        "decrypted audit envelope"
    );
    store_event(&state, &mut event).await?;
    Ok(Json("OK"))
}

/// Query-string key for the search filter, matched without regard to case.
pub const SEARCH_TERM_PARAM: &str = "searchTerm";

#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct PageQuery(Vec<(String, String)>);

impl PageQuery {
    pub fn search_term(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(SEARCH_TERM_PARAM))
            .map(|(_, value)| value.as_str())
    }
}

async fn handle_page(
    State(state): State<Arc<AppState>>,
    Path((target_type, target_id, page_size)): Path<(String, String, usize)>,
    Query(q): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Json<AuditPage>, ApiError> {
    let continuation = headers
        .get(CONTINUATION_HEADER)
        .and_then(|v| v.to_str().ok());
    let page = state
        .service
        .retrieve_page(
            &target_type,
            &target_id,
            q.search_term(),
            page_size,
            continuation,
        )
        .await?;
    Ok(Json(page))
}

async fn handle_health() -> &'static str {
    "ok"
}
