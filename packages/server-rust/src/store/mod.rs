//! Persistence gateway for user accounts.

use async_trait::async_trait;
use uuid::Uuid;

use gatekey_core::User;

use crate::error::ApiError;

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryUserStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresUserStore;

/// Errors surfaced by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user store query failed: {0}")]
    Query(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::internal(err)
    }
}

/// Pluggable persistence backend for user accounts.
/// Implementations: `PostgreSQL` (production), `DashMap` (tests, dev).
///
/// Emails are stored case-normalized; callers pass lowercased values.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Durably persist a new account row.
    async fn save_user(&self, user: &User) -> Result<(), StoreError>;

    /// Whether an account with this email already exists.
    async fn is_email_taken(&self, email: &str) -> Result<bool, StoreError>;

    /// Load an account by email.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Load an account by id.
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Verify the backend is reachable.
    async fn check_health(&self) -> Result<(), StoreError>;

    /// Release resources and close connections.
    async fn close(&self);
}
