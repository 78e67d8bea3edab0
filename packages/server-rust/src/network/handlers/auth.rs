//! Login endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

use gatekey_core::{LoginRequest, LoginResponse, UserResponse};

use super::AppState;
use crate::error::ApiError;
use crate::validate;

/// Handles `POST /auth/login`.
///
/// The body is decoded by hand rather than through a rejection-based
/// extractor so a malformed body maps onto the service's own error
/// envelope.
pub async fn login_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LoginResponse>, ApiError> {
    let req: LoginRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::missing_request_data())?;
    validate::credentials(&req.email, &req.password)?;

    let (user, jwt) = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(LoginResponse {
        user: UserResponse::from(&user),
        jwt,
    }))
}
