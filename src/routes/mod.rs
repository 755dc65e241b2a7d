//! Router assembly: common routes, `/api` resources, uploaded files, shared layers.

mod api;
mod common;

pub use api::api_routes;
pub use common::common_routes;

use crate::settings::UPLOAD_URL_PREFIX;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// The full application router.
pub fn app(state: AppState) -> Router {
    let upload_dir = state.settings.upload_dir.clone();
    let body_limit = state.settings.max_upload_bytes;
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", api_routes(state))
        .nest_service(UPLOAD_URL_PREFIX, ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
