//! Custom Axum extractors

use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::http::request::Parts;

use segmentctl_core::{SegmentName, ValidationError};

use super::error::ApiError;

/// JSON body whose parse failures render as [`ApiError`]
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Extract a user id from a single-parameter path
pub struct UserId(pub i64);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        Ok(Self(parse_user_id(&raw)?))
    }
}

/// Extract and validate a segment name from a single-parameter path
pub struct ValidSegmentName(pub SegmentName);

impl<S> FromRequestParts<S> for ValidSegmentName
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(name): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                ApiError::Validation(ValidationError::Empty {
                    field: "segment name",
                })
            })?;

        Ok(Self(SegmentName::new(&name)?))
    }
}

/// Extract `/segments/{name}/users/{id}`
pub struct MembershipPath {
    pub segment: SegmentName,
    pub user_id: i64,
}

impl<S> FromRequestParts<S> for MembershipPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((name, raw_id)): Path<(String, String)> =
            Path::from_request_parts(parts, state).await.map_err(|_| {
                ApiError::Validation(ValidationError::Empty {
                    field: "segment name",
                })
            })?;

        Ok(Self {
            segment: SegmentName::new(&name)?,
            user_id: parse_user_id(&raw_id)?,
        })
    }
}

fn parse_user_id(raw: &str) -> Result<i64, ValidationError> {
    raw.parse::<i64>().map_err(|_| ValidationError::InvalidFormat {
        field: "id",
        reason: "must be an integer",
    })
}
