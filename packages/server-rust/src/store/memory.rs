//! In-memory [`UserStore`] backed by [`DashMap`].
//!
//! Provides concurrent access without external locking. Suitable for
//! tests and local development; nothing survives a restart.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use gatekey_core::User;

use super::{StoreError, UserStore};

/// In-memory account store keyed by user id.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<Uuid, User>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn is_email_taken(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.users.iter().any(|entry| entry.email == email))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.email == email)
            .map(|entry| entry.value().clone()))
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn check_health(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}
}
