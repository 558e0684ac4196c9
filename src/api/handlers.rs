//! REST API handlers.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use tracing::debug;

use super::listener::DEFAULT_PORT;
use super::types::{
    ErrorResponse, HealthResponse, PageQuery, StateQuery, StateResponse, WriteStateRequest,
    WriteStateResponse,
};
use crate::page::{render_page, PageConfig};
use crate::session::SessionStore;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub page: Arc<PageConfig>,
    port: Arc<AtomicU16>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_store(Arc::new(SessionStore::new()), PageConfig::default())
    }

    pub fn with_store(store: Arc<SessionStore>, page: PageConfig) -> Self {
        Self {
            store,
            page: Arc::new(page),
            port: Arc::new(AtomicU16::new(DEFAULT_PORT)),
        }
    }

    /// Port the listener actually holds; used for URLs in served pages.
    pub fn port(&self) -> u16 {
        self.port.load(Ordering::Relaxed)
    }

    pub fn set_port(&self, port: u16) {
        self.port.store(port, Ordering::Relaxed);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn bad_request(error: ErrorResponse) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error))
}

/// Editor page for the session named by `?mcp=`.
pub async fn page(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Html<String> {
    let session_id = query.mcp.unwrap_or_default();
    Html(render_page(&state.page, &session_id, state.port()))
}

/// Read a session's current state.
pub async fn get_state(
    State(state): State<AppState>,
    Query(query): Query<StateQuery>,
) -> Result<Json<StateResponse>, ApiError> {
    let session_id = query
        .session_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| bad_request(ErrorResponse::session_id_required()))?;

    let current = state.store.read(&session_id);
    Ok(Json(StateResponse::from_state(current.as_deref())))
}

/// Write a new diagram into a session.
///
/// The body is parsed by hand so malformed JSON maps to a 400 with a
/// stable message instead of the extractor's rejection.
pub async fn post_state(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WriteStateResponse>, ApiError> {
    let req: WriteStateRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "rejecting state write with invalid body");
        bad_request(ErrorResponse::invalid_json())
    })?;

    let session_id = req
        .session_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| bad_request(ErrorResponse::session_id_required()))?;

    let version = state.store.write(&session_id, req.xml.unwrap_or_default());
    Ok(Json(WriteStateResponse::new(version)))
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Explicit 405 for methods axum would otherwise derive from `GET`.
pub async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET,POST")])
}

/// Fallback for unknown paths and unsupported methods on non-state paths.
pub async fn not_found() -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_new() {
        let state = AppState::new();
        assert!(state.store.is_empty());
        assert_eq!(state.port(), DEFAULT_PORT);

        state.set_port(6010);
        assert_eq!(state.clone().port(), 6010);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
        assert!(body.mcp);
    }

    #[tokio::test]
    async fn test_get_state_requires_session_id() {
        let state = AppState::new();
        let err = get_state(
            State(state),
            Query(StateQuery {
                session_id: Some(String::new()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1.error, "sessionId required");
    }

    #[tokio::test]
    async fn test_post_then_get() {
        let state = AppState::new();
        let body = Bytes::from(r#"{"sessionId":"s","xml":"<a/>"}"#);

        let Json(written) = post_state(State(state.clone()), body).await.unwrap();
        assert!(written.success);
        assert_eq!(written.version, 1);

        let Json(read) = get_state(
            State(state),
            Query(StateQuery {
                session_id: Some("s".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(read.xml.as_deref(), Some("<a/>"));
        assert_eq!(read.version, 1);
    }

    #[tokio::test]
    async fn test_post_without_xml_stores_empty_document() {
        let state = AppState::new();
        let body = Bytes::from(r#"{"sessionId":"s"}"#);

        let Json(written) = post_state(State(state.clone()), body).await.unwrap();
        assert_eq!(written.version, 1);
        assert_eq!(state.store.read("s").unwrap().xml, "");
    }

    #[tokio::test]
    async fn test_page_uses_bound_port() {
        let state = AppState::new();
        state.set_port(6013);

        let Html(html) = page(
            State(state),
            Query(PageQuery {
                mcp: Some("abc".into()),
            }),
        )
        .await;
        assert!(html.contains("http://localhost:6013/api/state"));
        assert!(html.contains(r#""sessionId":"abc""#));
    }
}
