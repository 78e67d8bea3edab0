//! Registration and profile endpoints.

use axum::body::Bytes;
use axum::extract::State;
use axum::Extension;
use axum::Json;

use gatekey_core::{ProfileResponse, RegistrationRequest, RegistrationResponse, UserResponse};

use super::AppState;
use crate::error::ApiError;
use crate::network::context::RequestContext;
use crate::validate;

/// Handles `POST /users/registration`.
pub async fn registration_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RegistrationResponse>, ApiError> {
    let req: RegistrationRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::missing_request_data())?;
    validate::credentials(&req.email, &req.password)?;

    let user = state.accounts.register(&req.email, &req.password).await?;
    Ok(Json(RegistrationResponse {
        user: UserResponse::from(&user),
    }))
}

/// Handles `GET /users/profile`. Private route: the auth middleware has
/// already verified the token and attached the identity.
pub async fn profile_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Some(identity) = ctx.identity() else {
        // Reachable only if the route was wired without the auth layer.
        tracing::debug!("request context carries no authenticated identity");
        return Err(ApiError::unauthenticated());
    };

    let user = state.accounts.profile(identity.user_id).await?;
    Ok(Json(ProfileResponse {
        user: UserResponse::from(&user),
    }))
}
