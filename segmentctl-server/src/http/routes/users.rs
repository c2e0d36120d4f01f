//! User endpoints, including segment reconciliation

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use segmentctl_core::{MembershipRequest, SegmentName, UserFields, ValidationError};

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, UserId};
use crate::http::server::AppState;
use crate::store::{User, UserWithSegments};

/// Create/update user request
#[derive(Deserialize)]
pub struct UserRequest {
    /// Optional on update; must match the path id when present
    #[serde(default)]
    pub id: Option<i64>,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
}

impl UserRequest {
    fn fields(&self) -> Result<UserFields, ValidationError> {
        UserFields::new(&self.firstname, &self.lastname, &self.username)
    }
}

/// User response
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<String>>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            firstname: u.firstname,
            lastname: u.lastname,
            username: u.username,
            created_at: u.created_at.to_rfc3339(),
            segments: None,
        }
    }
}

impl From<UserWithSegments> for UserResponse {
    fn from(u: UserWithSegments) -> Self {
        Self {
            id: u.id,
            firstname: u.firstname,
            lastname: u.lastname,
            username: u.username,
            created_at: u.created_at.to_rfc3339(),
            segments: Some(u.segments),
        }
    }
}

/// Segment reconciliation request; either list may be omitted
#[derive(Deserialize)]
pub struct UpdateSegmentsRequest {
    #[serde(default)]
    pub segments_to_add: Vec<String>,
    #[serde(default)]
    pub segments_to_remove: Vec<String>,
}

/// Current segments of a user
#[derive(Serialize)]
pub struct UserSegmentsResponse {
    pub user_id: i64,
    pub segments: Vec<String>,
}

/// GET /users - list users with their segments
async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /users - create a user
async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<UserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.store.create_user(req.fields()?).await?;
    tracing::info!(user_id = user.id, "created user");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// GET /users/{id} - get a user with its segments
async fn get_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.store.get_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// PUT /users/{id} - replace display fields
async fn update_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
    ApiJson(req): ApiJson<UserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if req.id.is_some_and(|body_id| body_id != id) {
        return Err(ValidationError::InvalidFormat {
            field: "id",
            reason: "does not match the id in the path",
        }
        .into());
    }

    let user = state.store.update_user(id, req.fields()?).await?;
    Ok(Json(UserResponse::from(user)))
}

/// DELETE /users/{id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
) -> Result<StatusCode, ApiError> {
    state.store.delete_user(id).await?;
    tracing::info!(user_id = id, "deleted user");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/{id}/segments - current segment names
async fn get_user_segments(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
) -> Result<Json<UserSegmentsResponse>, ApiError> {
    let segments = state.store.user_segments(id).await?;
    Ok(Json(UserSegmentsResponse {
        user_id: id,
        segments: segments.into_iter().collect(),
    }))
}

/// PUT /users/{id}/segments - add and remove memberships in one transaction
async fn update_user_segments(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
    ApiJson(req): ApiJson<UpdateSegmentsRequest>,
) -> Result<StatusCode, ApiError> {
    let request = MembershipRequest::from_lists(
        validate_names(req.segments_to_add)?,
        validate_names(req.segments_to_remove)?,
    );

    let plan = state.store.update_user_segments(id, &request).await?;
    tracing::debug!(user_id = id, to_add = ?plan.to_add, to_remove = ?plan.to_remove, "segments applied");

    Ok(StatusCode::NO_CONTENT)
}

fn validate_names(names: Vec<String>) -> Result<Vec<String>, ValidationError> {
    names
        .iter()
        .map(|name| SegmentName::new(name).map(SegmentName::into_string))
        .collect()
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route(
            "/users/{id}/segments",
            get(get_user_segments).put(update_user_segments),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_names_rejects_blank() {
        let err = validate_names(vec!["ok".into(), " ".into()]).unwrap_err();
        assert!(matches!(err, ValidationError::Empty { .. }));
    }

    #[test]
    fn update_request_lists_default_to_empty() {
        let req: UpdateSegmentsRequest = serde_json::from_str(r#"{"segments_to_add": ["a"]}"#).unwrap();
        assert_eq!(req.segments_to_add, vec!["a"]);
        assert!(req.segments_to_remove.is_empty());
    }
}
