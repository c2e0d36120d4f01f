//! Liveness endpoint, served outside `/api/v1`

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
pub struct Liveness {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

const LIVE: Liveness = Liveness {
    status: "ok",
    service: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
};

/// GET /health - answers without touching the store
async fn liveness() -> Json<Liveness> {
    Json(LIVE)
}

/// Mountable on any router state.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(liveness))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_service_and_version() {
        let Json(body) = liveness().await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.service, "segmentctl-server");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
