//! Editor page served to the browser.
//!
//! The page hosts the third-party rendering surface in an iframe and runs a
//! small script that keeps it in sync with the session store: it pushes
//! local edits and polls for versions written by the agent.

pub mod client;
mod render;

pub use client::{ClientAction, ClientSync, SurfaceEvent, SurfaceState};
pub use render::{origin_of, render_page, PageConfig, DEFAULT_EMBED_URL, DEFAULT_POLL_INTERVAL};
