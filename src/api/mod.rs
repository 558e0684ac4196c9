//! HTTP layer for diagram-sync.
//!
//! ## Endpoints
//!
//! - `GET /`, `GET /index.html` - Editor page for `?mcp=<session id>`
//! - `GET /api/state`, `GET /api/mcp/state` - Read `?sessionId=` state
//! - `POST /api/state`, `POST /api/mcp/state` - Write `{sessionId, xml}`
//! - `GET /api/health`, `GET /api/mcp/health` - Health check
//! - `OPTIONS *` - CORS preflight, always `204`
//!
//! ## Example
//!
//! ```no_run
//! use diagram_sync::api::{ServerConfig, SyncServer};
//!
//! #[tokio::main]
//! async fn main() -> diagram_sync::Result<()> {
//!     let mut server = SyncServer::new(ServerConfig::default());
//!     let port = server.start().await?;
//!     println!("listening on {port}");
//!     tokio::signal::ctrl_c().await?;
//!     server.stop().await
//! }
//! ```

pub mod handlers;
pub mod listener;
pub mod router;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use handlers::AppState;
pub use listener::{bind_with_retry, DEFAULT_PORT, DEFAULT_PORT_RANGE};
pub use router::{create_router, create_router_with_state};
pub use server::{ServerConfig, SyncServer, DEFAULT_SHUTDOWN_GRACE};
pub use types::{
    ErrorResponse, HealthResponse, PageQuery, StateQuery, StateResponse, WriteStateRequest,
    WriteStateResponse,
};
