//! Credential verification and bearer-token authentication.

use std::sync::Arc;

use gatekey_core::{TokenPayload, User};

use crate::error::ApiError;
use crate::password;
use crate::store::UserStore;
use crate::token::TokenService;

/// Orchestrates credential checks and token issuance/verification.
///
/// Every credential failure maps to the same external error; the log
/// lines below are the only place the paths diverge.
pub struct AuthFacade {
    store: Arc<dyn UserStore>,
    tokens: TokenService,
}

impl AuthFacade {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Verifies credentials and issues a bearer token.
    ///
    /// # Errors
    ///
    /// Returns the generic invalid-credentials error for an unknown
    /// email, an account without a password, or a password mismatch;
    /// persistence and signing failures surface as internal errors.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), ApiError> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.store.get_user_by_email(&email).await? else {
            tracing::debug!(%email, "login rejected: no account with this email");
            return Err(ApiError::invalid_credentials());
        };

        let Some(hashword) = user.password_hash.as_deref() else {
            tracing::debug!(
                %email,
                code = "USER.PASSWORD_NOT_SET",
                "login rejected: account has no password set"
            );
            return Err(ApiError::invalid_credentials());
        };

        if !password::verify(hashword, password) {
            tracing::debug!(%email, "login rejected: password mismatch");
            return Err(ApiError::invalid_credentials());
        }

        let payload = TokenPayload::new(user.id, user.email.clone());
        let jwt = self.tokens.issue(&payload).map_err(ApiError::internal)?;
        Ok((user, jwt))
    }

    /// Verifies a bearer token and returns the embedded identity.
    ///
    /// # Errors
    ///
    /// Any verification failure maps to the generic unauthenticated
    /// error.
    pub fn verify_token(&self, token: &str) -> Result<TokenPayload, ApiError> {
        self.tokens.verify(token).map_err(|_| ApiError::unauthenticated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryUserStore;

    async fn facade_with_user(password_hash: Option<String>) -> (AuthFacade, User) {
        let store = Arc::new(MemoryUserStore::new());
        let mut user = User::new("a@b.com".to_string(), String::new());
        user.password_hash = password_hash;
        store.save_user(&user).await.unwrap();
        let tokens = TokenService::new("test-secret", "1h", "gatekey").unwrap();
        (AuthFacade::new(store, tokens), user)
    }

    #[tokio::test]
    async fn login_succeeds_with_correct_credentials() {
        let hashed = password::hash("Password123!").unwrap();
        let (facade, user) = facade_with_user(Some(hashed)).await;

        let (logged_in, jwt) = facade.login("a@b.com", "Password123!").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let identity = facade.verify_token(&jwt).unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.email, "a@b.com");
    }

    #[tokio::test]
    async fn login_normalizes_email_case() {
        let hashed = password::hash("Password123!").unwrap();
        let (facade, _user) = facade_with_user(Some(hashed)).await;
        assert!(facade.login("  A@B.COM ", "Password123!").await.is_ok());
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_yield_identical_errors() {
        let hashed = password::hash("Password123!").unwrap();
        let (facade, _user) = facade_with_user(Some(hashed)).await;

        let unknown = facade.login("nobody@b.com", "Password123!").await.unwrap_err();
        let mismatch = facade.login("a@b.com", "WrongPassword1!").await.unwrap_err();
        assert_eq!(unknown, mismatch);
    }

    #[tokio::test]
    async fn account_without_password_cannot_log_in() {
        let (facade, _user) = facade_with_user(None).await;
        let err = facade.login("a@b.com", "Password123!").await.unwrap_err();
        assert_eq!(err, ApiError::invalid_credentials());
    }

    #[tokio::test]
    async fn verify_token_maps_failures_to_unauthenticated() {
        let (facade, _user) = facade_with_user(None).await;
        let err = facade.verify_token("garbage").unwrap_err();
        assert_eq!(err, ApiError::unauthenticated());
        let err = facade.verify_token("").unwrap_err();
        assert_eq!(err, ApiError::unauthenticated());
    }
}
