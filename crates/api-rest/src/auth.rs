//! Shared-secret authentication.
//!
//! Every protected route requires the configured key in the `x-api-key`
//! header. The comparison is exact; there is no key hierarchy.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if provided != Some(state.api_key.as_str()) {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
