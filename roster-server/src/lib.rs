//! HTTP service wrapping the reviewer assignment engine: configuration,
//! SQLite-backed directory store, and the axum API surface.

pub mod api;
pub mod config;
pub mod sqlite;

use roster_core::Engine;

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Version string surfaced by `/health`.
pub fn service_version() -> &'static str {
    built_info::PKG_VERSION
}

/// Shared state handed to every handler.
pub struct AppState {
    pub engine: Engine,
}
