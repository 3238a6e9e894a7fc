//! Route table and middleware for the REST API.
//!
//! Handlers live in `handlers`; this module only decides which path and
//! method reaches which handler and which tower layers wrap the whole app.

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Assemble the application router around shared [`AppState`].
///
/// Schedule endpoints sit under `/api`; `/health` stays at the root for load
/// balancers. Responses are compressed and traced, and CORS is wide open.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/schedules",
            post(handlers::generate_schedules)
                .get(handlers::list_schedules)
                .delete(handlers::delete_all_schedules),
        )
        .route("/schedules/today", get(handlers::today_schedules))
        .route("/schedules/this-week", get(handlers::this_week_schedules))
        .route(
            "/schedules/{id}",
            get(handlers::get_schedule)
                .put(handlers::update_schedule)
                .delete(handlers::delete_schedule),
        )
        .route("/schedules/{id}/done", put(handlers::mark_done))
        .route("/schedules/{id}/undone", put(handlers::mark_undone));

    // With `Router::layer` the last layer added is outermost: CORS answers
    // preflights before anything else runs, tracing sees uncompressed
    // responses.
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;
    use crate::provider::{ProviderError, TextGenerator};
    use async_trait::async_trait;
    use chrono::{Offset, Utc};
    use std::sync::Arc;

    struct NullGenerator;

    #[async_trait]
    impl TextGenerator for NullGenerator {
        fn name(&self) -> &str {
            "null"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            Err(ProviderError::EmptyResponse)
        }
    }

    #[test]
    fn test_router_builds_with_local_state() {
        let state = AppState::new(
            Arc::new(LocalRepository::new()),
            Arc::new(NullGenerator),
            Utc.fix(),
        );
        let _ = create_router(state);
    }
}
