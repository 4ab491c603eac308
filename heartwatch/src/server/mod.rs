//! Ingress API.
//!
//! Endpoints:
//! - POST /register - Start tracking a session
//! - POST /ping - Heartbeat for a registered session
//! - POST /unregister - Stop tracking a session without notifying
//! - GET /health - Liveness and session count

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::models::{Embed, SessionMetadata, SessionRecord};
use crate::store::SessionStore;
use crate::sweeper::Clock;

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// Live sessions.
    pub store: Arc<SessionStore>,
    /// Source of heartbeat timestamps.
    pub clock: Arc<dyn Clock>,
}

// === Request/Response Types ===

/// Request to start tracking a session.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default, deserialize_with = "opaque_id")]
    pub session_id: Option<String>,
    /// Direct webhook URL or vault reference.
    #[serde(alias = "targetRef")]
    pub webhook_url: Option<String>,
    #[serde(default, deserialize_with = "opaque_id")]
    pub message_id: Option<String>,
    #[serde(default, deserialize_with = "opaque_id")]
    pub channel_id: Option<String>,
    pub embed: Option<Embed>,
    /// Everything else (username, displayName, placeId, jobId, ...).
    #[serde(flatten)]
    pub metadata: SessionMetadata,
}

/// Request naming an existing session.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[serde(default, deserialize_with = "opaque_id")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub sessions: usize,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Clients send ids as strings or bare numbers; numbers are kept as their
/// decimal text. Any other JSON type counts as absent.
fn opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

/// Present and non-empty.
fn required(value: Option<String>) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingFields)
}

impl RegisterRequest {
    /// Validate and turn into a record seen at `clock`'s now.
    fn into_record(self, clock: &dyn Clock) -> Result<SessionRecord, ApiError> {
        let session_id = required(self.session_id)?;
        let target_ref = required(self.webhook_url)?;
        let message_ref = required(self.message_id)?;

        Ok(SessionRecord::new(
            session_id,
            target_ref,
            message_ref,
            self.embed.unwrap_or_default(),
            clock.now(),
        )
        .with_channel(self.channel_id.filter(|c| !c.is_empty()))
        .with_metadata(self.metadata))
    }
}

// === Server Lifecycle ===

/// Build the ingress router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/ping", post(ping))
        .route("/unregister", post(unregister))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the ingress API until `shutdown` resolves.
pub async fn start_server<F>(addr: SocketAddr, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "heartwatch listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    Ok(())
}

// === Handlers ===

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(req) = payload.inspect_err(|e| warn!(error = %e, "unreadable register body"))?;
    let claimed = req.session_id.clone().unwrap_or_default();
    let record = req
        .into_record(state.clock.as_ref())
        .inspect_err(|e| warn!(session_id = %claimed, error = %e, "registration rejected"))?;
    let session_id = record.session_id.clone();
    state.store.register(record).await;

    info!(session_id = %session_id, "registered session");
    Ok(Json(OkResponse { ok: true }))
}

async fn ping(
    State(state): State<AppState>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let session_id = required_session_id(payload, "ping")?;
    state
        .store
        .refresh(&session_id, state.clock.now())
        .await
        .map_err(|e| {
            debug!(session_id = %session_id, error = %e, "ping for unknown session");
            ApiError::SessionNotFound
        })?;

    Ok(Json(OkResponse { ok: true }))
}

async fn unregister(
    State(state): State<AppState>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let session_id = required_session_id(payload, "unregister")?;
    if state.store.remove(&session_id).await.is_none() {
        debug!(session_id = %session_id, "unregister for unknown session");
        return Err(ApiError::SessionNotFound);
    }

    info!(session_id = %session_id, "unregistered session");
    Ok(Json(OkResponse { ok: true }))
}

/// Pull the required session id out of a ping or unregister body.
fn required_session_id(
    payload: Result<Json<SessionRequest>, JsonRejection>,
    endpoint: &'static str,
) -> Result<String, ApiError> {
    let Json(req) = payload.inspect_err(|e| warn!(endpoint, error = %e, "unreadable body"))?;
    required(req.session_id).inspect_err(|e| warn!(endpoint, error = %e, "request rejected"))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        sessions: state.store.len().await,
    })
}
