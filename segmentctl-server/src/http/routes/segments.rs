//! Segment endpoints and single-membership changes

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use segmentctl_core::SegmentName;

use super::users::UserResponse;
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, MembershipPath, ValidSegmentName};
use crate::http::server::AppState;
use crate::store::{Segment, SegmentWithCount};

/// Create segment request
#[derive(Deserialize)]
pub struct CreateSegmentRequest {
    pub name: String,
}

/// Segment response
#[derive(Serialize)]
pub struct SegmentResponse {
    pub name: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<i64>,
}

impl From<Segment> for SegmentResponse {
    fn from(s: Segment) -> Self {
        Self {
            name: s.name,
            created_at: s.created_at.to_rfc3339(),
            member_count: None,
        }
    }
}

impl From<SegmentWithCount> for SegmentResponse {
    fn from(s: SegmentWithCount) -> Self {
        Self {
            name: s.name,
            created_at: s.created_at.to_rfc3339(),
            member_count: Some(s.member_count),
        }
    }
}

/// GET /segments - list segments with member counts
async fn list_segments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SegmentResponse>>, ApiError> {
    let segments = state.store.list_segments().await?;
    Ok(Json(segments.into_iter().map(SegmentResponse::from).collect()))
}

/// POST /segments - create a segment
async fn create_segment(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateSegmentRequest>,
) -> Result<(StatusCode, Json<SegmentResponse>), ApiError> {
    let name = SegmentName::new(&req.name)?;
    let segment = state.store.create_segment(name).await?;
    tracing::info!(segment = %segment.name, "created segment");
    Ok((StatusCode::CREATED, Json(SegmentResponse::from(segment))))
}

/// GET /segments/{name}
async fn get_segment(
    State(state): State<Arc<AppState>>,
    ValidSegmentName(name): ValidSegmentName,
) -> Result<Json<SegmentResponse>, ApiError> {
    let segment = state.store.get_segment(&name).await?;
    Ok(Json(SegmentResponse::from(segment)))
}

/// DELETE /segments/{name} - memberships are removed with it
async fn delete_segment(
    State(state): State<Arc<AppState>>,
    ValidSegmentName(name): ValidSegmentName,
) -> Result<StatusCode, ApiError> {
    state.store.delete_segment(&name).await?;
    tracing::info!(segment = %name, "deleted segment");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /segments/{name}/users - members of a segment
async fn list_segment_users(
    State(state): State<Arc<AppState>>,
    ValidSegmentName(name): ValidSegmentName,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.store.segment_users(&name).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// PUT /segments/{name}/users/{id} - add one user (idempotent)
async fn add_user(
    State(state): State<Arc<AppState>>,
    path: MembershipPath,
) -> Result<StatusCode, ApiError> {
    state.store.add_membership(&path.segment, path.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /segments/{name}/users/{id} - remove one user (idempotent)
async fn remove_user(
    State(state): State<Arc<AppState>>,
    path: MembershipPath,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .remove_membership(&path.segment, path.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Segment routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/segments", get(list_segments).post(create_segment))
        .route("/segments/{name}", get(get_segment).delete(delete_segment))
        .route("/segments/{name}/users", get(list_segment_users))
        .route(
            "/segments/{name}/users/{id}",
            put(add_user).delete(remove_user),
        )
}
