//! HTTP surface: `/tables` and `/reservations`.

mod error;
mod reservations;
mod tables;

pub use error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get};
use tower_http::trace::TraceLayer;

use crate::engine::Engine;

pub type AppState = Arc<Engine>;

pub fn router(engine: AppState) -> Router {
    Router::new()
        .route("/tables", get(tables::list).post(tables::create))
        .route("/tables/{id}", delete(tables::delete))
        .route(
            "/reservations",
            get(reservations::list).post(reservations::create),
        )
        .route("/reservations/{id}", delete(reservations::delete))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}
