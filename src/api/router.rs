//! API router configuration.

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_state, health, method_not_allowed, not_found, page, post_state, AppState,
};

/// Largest accepted request body. Diagram documents with embedded images
/// easily exceed axum's 2 MiB default.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Create the API router with a fresh in-memory store.
pub fn create_router() -> Router {
    create_router_with_state(AppState::new())
}

/// Create the API router with custom state.
///
/// The state and health endpoints are each mounted twice, once short and
/// once under `/api/mcp`, with identical behavior.
pub fn create_router_with_state(state: AppState) -> Router {
    // `get` would also answer HEAD; only GET and POST are served here.
    let state_route = get(get_state).post(post_state).head(method_not_allowed);
    let health_route = get(health).fallback(not_found);
    let page_route = get(page).fallback(not_found);

    Router::new()
        .route("/", page_route.clone())
        .route("/index.html", page_route)
        .route("/api/state", state_route.clone())
        .route("/api/mcp/state", state_route)
        .route("/api/health", health_route.clone())
        .route("/api/mcp/health", health_route)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(middleware::from_fn(preflight))
        .with_state(state)
}

/// Answer every `OPTIONS` request with `204` before routing.
async fn preflight(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }

    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}
