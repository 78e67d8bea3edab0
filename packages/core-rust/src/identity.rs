//! Verified identity extracted from a bearer token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity payload embedded in (and recovered from) a bearer token.
///
/// Immutable once issued; a verified copy is attached to the request
/// context by the authentication middleware for handlers to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub user_id: Uuid,
    pub email: String,
}

impl TokenPayload {
    #[must_use]
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}
