//! Request and response wire types for the HTTP API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::user::UserResponse;

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login response: the account plus a signed bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub jwt: String,
}

/// Body of `POST /users/registration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
}

/// Successful registration response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub user: UserResponse,
}

/// Response of `GET /users/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
}

/// The error body returned on every non-2xx response.
///
/// `error_type` is a stable machine-readable code (e.g.
/// `USER.ALREADY_EXISTS`); `message` is human-readable; `details` carries
/// a field-to-reason map for validation failures and is `null` otherwise.
/// `BTreeMap` keeps the serialized key order deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    pub details: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_serializes_type_key() {
        let body = ErrorBody {
            error_type: "UNAUTHENTICATED".to_string(),
            message: "user not authenticated".to_string(),
            details: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"type":"UNAUTHENTICATED","message":"user not authenticated","details":null}"#
        );
    }

    #[test]
    fn error_body_detail_order_is_deterministic() {
        let mut details = BTreeMap::new();
        details.insert("password".to_string(), "too weak".to_string());
        details.insert("email".to_string(), "must not be empty".to_string());
        let body = ErrorBody {
            error_type: "REQUEST_DATA.INVALID".to_string(),
            message: "invalid request data".to_string(),
            details: Some(details),
        };
        let json = serde_json::to_string(&body).unwrap();
        // BTreeMap serializes keys alphabetically: email before password.
        assert!(json.find("email").unwrap() < json.find("password").unwrap());
    }
}
