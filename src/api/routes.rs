use crate::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(crate::api::handlers::health::health_check))
        .route(
            "/agent/research",
            post(crate::api::handlers::research::research_stream),
        )
        .route(
            "/agent/research/sync",
            post(crate::api::handlers::research::research_sync),
        )
}
