//! Mapping from domain errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use fhirlite_core::RecordError;

/// Error payload returned for every non-2xx response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or wrong `x-api-key` header.
    Unauthorized,
    Record(RecordError),
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        ApiError::Record(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "invalid or missing API key".into())
            }
            ApiError::Record(err) => match &err {
                RecordError::MalformedField { .. }
                | RecordError::InvalidField { .. }
                | RecordError::EmptyUpdate => (StatusCode::BAD_REQUEST, err.to_string()),
                RecordError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
                RecordError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                RecordError::Storage(source) => {
                    // The cause stays in the log; the wire gets an opaque line.
                    tracing::error!(error = %source, "storage failure while handling request");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal storage error".into(),
                    )
                }
            },
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_kind() {
        let cases = [
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                ApiError::Record(RecordError::EmptyUpdate),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Record(RecordError::Conflict("p1".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Record(RecordError::NotFound("p1".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Record(RecordError::Storage(sqlx::Error::PoolClosed)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
