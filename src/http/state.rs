//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::FullRepository;

/// Shared application state passed to all handlers.
///
/// The repository handle is injected at startup; handlers never reach for a
/// global, which keeps integration tests free to build a router over their
/// own in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn FullRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self { repository }
    }
}
