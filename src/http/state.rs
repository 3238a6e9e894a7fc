//! Application state for the HTTP server.

use std::sync::Arc;

use chrono::FixedOffset;

use crate::db::repository::ScheduleRepository;
use crate::provider::TextGenerator;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for schedule persistence
    pub repository: Arc<dyn ScheduleRepository>,
    /// Text-generation provider for the AI creation path
    pub generator: Arc<dyn TextGenerator>,
    /// UTC offset the today/this-week windows are computed in
    pub display_offset: FixedOffset,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        repository: Arc<dyn ScheduleRepository>,
        generator: Arc<dyn TextGenerator>,
        display_offset: FixedOffset,
    ) -> Self {
        Self {
            repository,
            generator,
            display_offset,
        }
    }
}
