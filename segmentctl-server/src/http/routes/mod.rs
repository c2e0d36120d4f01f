//! Route handlers organized by resource

pub mod health;
pub mod segments;
pub mod users;

use std::sync::Arc;

use axum::Router;

use super::server::AppState;

/// Routes served under `/api/v1`
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(users::router())
        .merge(segments::router())
}
