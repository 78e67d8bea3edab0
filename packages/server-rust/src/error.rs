//! Typed service errors and the single error-to-HTTP translation point.
//!
//! Business code returns [`ApiError`] values untouched; the pipeline
//! converts them to responses exactly once, here, via [`IntoResponse`].
//! Internal detail never reaches the client: it is logged at error
//! severity and the body carries only the generic envelope.

use std::collections::BTreeMap;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gatekey_core::ErrorBody;

/// Classification of an error, driving the HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed, missing, or failed-validation input.
    InvalidRequest,
    /// Missing/invalid/expired token, or bad login credentials.
    Unauthenticated,
    /// Authenticated but forbidden.
    Unauthorized,
    /// Resource or route absent.
    NotFound,
    /// Duplicate unique key.
    AlreadyExists,
    /// Domain invariant violated.
    FailedPrecondition,
    /// Anything else. Logged with full detail; the body reveals nothing.
    Internal,
}

/// A typed service error: machine-readable code, human message, and an
/// optional field-to-reason detail map for validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    pub details: Option<BTreeMap<String, String>>,
    /// Operator-facing detail, logged at translation time, never serialized.
    internal: Option<String>,
}

impl ApiError {
    fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            details: None,
            internal: None,
        }
    }

    /// Request body could not be decoded at all.
    #[must_use]
    pub fn missing_request_data() -> Self {
        Self::new(
            ErrorKind::InvalidRequest,
            "REQUEST_DATA.INVALID",
            "required request data is missing",
        )
    }

    /// Field-level validation failure with a field-to-reason detail map.
    #[must_use]
    pub fn invalid_request_with_details(details: BTreeMap<String, String>) -> Self {
        let mut err = Self::new(
            ErrorKind::InvalidRequest,
            "REQUEST_DATA.INVALID",
            "invalid request data",
        );
        err.details = Some(details);
        err
    }

    /// Failed login. Deliberately identical for every credential failure
    /// so callers cannot tell which factor was wrong.
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::Unauthenticated, "UNAUTHENTICATED", "invalid credentials")
    }

    /// Missing, malformed, or expired bearer token.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::new(
            ErrorKind::Unauthenticated,
            "UNAUTHENTICATED",
            "user not authenticated",
        )
    }

    /// Authenticated but not allowed to perform the operation.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(ErrorKind::Unauthorized, "UNAUTHORIZED", "access denied")
    }

    #[must_use]
    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, code, message)
    }

    #[must_use]
    pub fn already_exists(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyExists, code, message)
    }

    #[must_use]
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FailedPrecondition, "FAILED_PRECONDITION", message)
    }

    /// Internal failure. The cause is kept for the log line at the
    /// translation point; the client sees only the generic envelope.
    pub fn internal(cause: impl fmt::Display) -> Self {
        let mut err = Self::internal_generic();
        err.internal = Some(cause.to_string());
        err
    }

    /// The generic internal-error envelope without an attached cause,
    /// for callers that have already logged the failure themselves.
    #[must_use]
    pub fn internal_generic() -> Self {
        Self::new(ErrorKind::Internal, "INTERNAL", "internal server error")
    }

    /// HTTP status for this error's kind.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::InvalidRequest => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::AlreadyExists | ErrorKind::FailedPrecondition => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(detail) = &self.internal {
            tracing::error!(code = %self.code, detail = %detail, "internal error");
        }
        let status = self.status();
        let body = ErrorBody {
            error_type: self.code,
            message: self.message,
            details: self.details,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_table() {
        assert_eq!(
            ApiError::missing_request_data().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::invalid_credentials().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::unauthenticated().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden().status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("X", "y").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::already_exists("X", "y").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::failed_precondition("y").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::internal("boom").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn credential_failures_are_indistinguishable() {
        // Every login failure path must produce the exact same error value.
        assert_eq!(ApiError::invalid_credentials(), ApiError::invalid_credentials());
    }

    #[test]
    fn internal_cause_is_not_part_of_the_envelope() {
        let err = ApiError::internal("connection refused");
        assert_eq!(err.code, "INTERNAL");
        assert_eq!(err.message, "internal server error");
        assert!(err.details.is_none());
    }

    #[tokio::test]
    async fn response_body_matches_wire_contract() {
        let response = ApiError::unauthenticated().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            bytes.as_ref(),
            br#"{"type":"UNAUTHENTICATED","message":"user not authenticated","details":null}"#
        );
    }
}
