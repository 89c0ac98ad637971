use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::BODY_SIZE_LIMIT;
use crate::handler::{self, AppState};

/// HTTP endpoint paths.
pub mod endpoints {
    pub const INDEX: &str = "/";
    pub const HEALTH: &str = "/health";
    pub const ENV: &str = "/env";
    pub const STATE: &str = "/state/:name";
    pub const STATES: &str = "/states";
    /// Prefix of a single item's path; listings render names under it.
    pub const STATE_PREFIX: &str = "/state/";
}

/// Build the axum router with all blobstate endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::INDEX, get(handler::index_handler))
        .route(endpoints::HEALTH, get(handler::health_handler))
        .route(endpoints::ENV, get(handler::env_handler))
        .route(
            endpoints::STATE,
            get(handler::get_state)
                .head(handler::head_state)
                .put(handler::put_state)
                .delete(handler::delete_state),
        )
        .route(endpoints::STATES, get(handler::list_states))
        .fallback(handler::fallback_handler)
        .layer(DefaultBodyLimit::max(BODY_SIZE_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
