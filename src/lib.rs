//! # diagram-sync
//!
//! Versioned diagram state shared between an AI agent and a browser editor.
//!
//! An agent writes diagram XML into a session over HTTP; the browser page
//! served by the same process polls that session, loads newer versions into
//! an embedded third-party editor, and pushes the user's edits back. The
//! server is a last-writer-wins blackboard: every write bumps a per-session
//! version counter and nothing is persisted across restarts.
//!
//! ## Features
//!
//! - **Session store**: in-memory, versioned, with age-based eviction
//! - **Port negotiation**: walks upward from the preferred port when it is busy
//! - **State API**: CORS-permissive JSON endpoints mounted under two prefixes
//! - **Editor page**: iframe host plus a push/poll synchronization script
//!
//! ## Quick Start
//!
//! ```no_run
//! use diagram_sync::{ServerConfig, SyncServer};
//!
//! #[tokio::main]
//! async fn main() -> diagram_sync::Result<()> {
//!     diagram_sync::logging::try_init(None).ok();
//!
//!     let mut server = SyncServer::new(ServerConfig::default());
//!     let port = server.start().await?;
//!
//!     let version = server.store().write("demo", "<mxGraphModel/>");
//!     println!("open http://localhost:{port}/?mcp=demo (version {version})");
//!
//!     tokio::signal::ctrl_c().await?;
//!     server.stop().await
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod page;
pub mod session;

// Re-export commonly used types
pub use api::{ServerConfig, SyncServer};
pub use config::Config;
pub use error::{DiagramSyncError, Result};
pub use page::{ClientAction, ClientSync, PageConfig, SurfaceEvent, SurfaceState};
pub use session::{DiagramState, ExpirySweeper, SessionStore};
