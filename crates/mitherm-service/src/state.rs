//! Shared application state for the HTTP layer.

use std::sync::Arc;

use mitherm_core::ReadingStore;
use mitherm_types::SessionMode;

/// State handed to every HTTP handler.
///
/// The store is shared with the running sensor session; the mode is fixed
/// for the process lifetime and selects the response shape.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Latest reading and status, updated by the session.
    pub store: Arc<ReadingStore>,
    /// The mode the session was started in.
    pub mode: SessionMode,
}

impl AppState {
    /// Create the application state.
    pub fn new(store: Arc<ReadingStore>, mode: SessionMode) -> Arc<Self> {
        Arc::new(Self { store, mode })
    }
}
