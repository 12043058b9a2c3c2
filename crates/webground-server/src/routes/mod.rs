// Export route modules
pub mod completions;
pub mod health;

use std::time::Duration;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderName, Method,
};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use webground::models::search::CITATION_HEADER;

use crate::state::AppState;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86400);

/// Answers every `OPTIONS` request itself, with or without an `Origin`
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([HeaderName::from_static(CITATION_HEADER)])
        .max_age(PREFLIGHT_MAX_AGE)
}

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(completions::routes(state))
        .merge(health::routes())
        .layer(cors())
}
