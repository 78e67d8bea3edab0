//! User domain model and its outward-facing representation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account as stored by the persistence gateway.
///
/// `password_hash` is `None` for accounts provisioned without a password
/// (e.g. imported or federated accounts); such accounts cannot log in
/// with credentials until a password is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Creates a new account with a freshly generated id and the current
    /// creation timestamp. The email is expected to be normalized already.
    #[must_use]
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash: Some(password_hash),
            first_name: None,
            last_name: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// The user representation returned over the API.
///
/// Never carries the password hash. `created_at` is rendered as an
/// RFC 3339 string with seconds precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_has_fresh_id_and_password() {
        let user = User::new("a@b.com".to_string(), "hash".to_string());
        assert!(!user.id.is_nil());
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.password_hash.as_deref(), Some("hash"));
        assert!(user.updated_at.is_none());
    }

    #[test]
    fn response_omits_password_hash() {
        let user = User::new("a@b.com".to_string(), "hash".to_string());
        let response = UserResponse::from(&user);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@b.com");
    }

    #[test]
    fn response_renders_rfc3339_created_at() {
        let user = User::new("a@b.com".to_string(), "hash".to_string());
        let response = UserResponse::from(&user);
        let parsed = DateTime::parse_from_rfc3339(&response.created_at).unwrap();
        assert_eq!(parsed.with_timezone(&Utc).timestamp(), user.created_at.timestamp());
    }

    #[test]
    fn response_uses_camel_case_keys() {
        let user = User::new("a@b.com".to_string(), "hash".to_string());
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("firstName").is_some());
    }
}
