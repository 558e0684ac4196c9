//! Session state module.
//!
//! Sessions are keyed by caller-supplied ids and hold the latest diagram
//! XML with a per-session version counter. Stale sessions are reclaimed by
//! the [`ExpirySweeper`].

mod store;
mod sweeper;

pub use store::{DiagramState, SessionStore};
pub use sweeper::{ExpirySweeper, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
