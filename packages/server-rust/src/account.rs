//! Account registration and profile retrieval.
//!
//! Registration is complete once the user row is durably saved; the
//! registration event that follows is best-effort. A broker outage
//! costs the event, not the registration (operators reconcile by
//! replaying from the store if downstream consumers must catch up).

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use gatekey_core::{RegistrationEvent, User};

use crate::error::ApiError;
use crate::events::EventPublisher;
use crate::password;
use crate::store::UserStore;

/// Orchestrates account creation and profile lookups.
pub struct AccountService {
    store: Arc<dyn UserStore>,
    events: Arc<dyn EventPublisher>,
    registration_subject: String,
}

impl AccountService {
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        events: Arc<dyn EventPublisher>,
        registration_subject: String,
    ) -> Self {
        Self {
            store,
            events,
            registration_subject,
        }
    }

    /// Registers a new account: strength policy, duplicate check, hash,
    /// durable save, then best-effort event publication.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the password fails the policy, an
    /// already-exists error for a taken email, and internal errors for
    /// persistence or hashing failures. Event publication failures do
    /// not surface here.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let email = email.trim().to_lowercase();

        if !password::is_strong(password) {
            tracing::debug!(%email, "registration rejected: password fails the strength policy");
            let mut details = BTreeMap::new();
            details.insert(
                "password".to_string(),
                password::STRENGTH_REQUIREMENTS.to_string(),
            );
            return Err(ApiError::invalid_request_with_details(details));
        }

        if self.store.is_email_taken(&email).await? {
            tracing::debug!(%email, "registration rejected: email already registered");
            return Err(ApiError::already_exists(
                "USER.ALREADY_EXISTS",
                format!("user with the email '{email}' already exists"),
            ));
        }

        let hashword = password::hash(password).map_err(ApiError::internal)?;
        let user = User::new(email, hashword);
        self.store.save_user(&user).await?;

        self.publish_registration(&user).await;
        Ok(user)
    }

    /// Publishes the registration event. Failures are logged with the
    /// account context and never affect the caller.
    async fn publish_registration(&self, user: &User) {
        let event = RegistrationEvent {
            email: user.email.clone(),
            id: user.id,
        };
        let payload = match serde_json::to_vec(&event) {
            Ok(bytes) => Bytes::from(bytes),
            Err(err) => {
                tracing::error!(
                    user_id = %user.id,
                    email = %user.email,
                    error = %err,
                    "failed to encode registration event; skipping publication"
                );
                return;
            }
        };
        match self
            .events
            .publish(&self.registration_subject, payload)
            .await
        {
            Ok(()) => tracing::debug!(
                user_id = %user.id,
                email = %user.email,
                subject = %self.registration_subject,
                "published registration event"
            ),
            Err(err) => tracing::error!(
                user_id = %user.id,
                email = %user.email,
                error = %err,
                "failed to publish registration event"
            ),
        }
    }

    /// Loads the account behind a verified identity.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the account no longer exists.
    pub async fn profile(&self, user_id: Uuid) -> Result<User, ApiError> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("USER.NOT_FOUND", "user not found"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::ErrorKind;
    use crate::events::EventError;
    use crate::store::MemoryUserStore;

    /// Publisher double that records every publish call.
    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, Bytes)>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), EventError> {
            self.published
                .lock()
                .unwrap()
                .push((subject.to_string(), payload));
            Ok(())
        }

        async fn subscribe(&self, _subject: &str) -> Result<(), EventError> {
            Ok(())
        }
    }

    /// Publisher double whose publish always fails.
    struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(&self, subject: &str, _payload: Bytes) -> Result<(), EventError> {
            Err(EventError::Publish {
                subject: subject.to_string(),
                source: "broker unavailable".into(),
            })
        }

        async fn subscribe(&self, _subject: &str) -> Result<(), EventError> {
            Ok(())
        }
    }

    fn service_with(
        events: Arc<dyn EventPublisher>,
    ) -> (AccountService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let service = AccountService::new(
            Arc::clone(&store) as Arc<dyn UserStore>,
            events,
            "user.registered".to_string(),
        );
        (service, store)
    }

    #[tokio::test]
    async fn register_persists_user_and_publishes_event() {
        let publisher = Arc::new(RecordingPublisher::default());
        let (service, store) = service_with(Arc::clone(&publisher) as Arc<dyn EventPublisher>);

        let user = service.register("A@B.com", "Password123!").await.unwrap();
        assert_eq!(user.email, "a@b.com");
        assert!(store.is_email_taken("a@b.com").await.unwrap());

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "user.registered");
        let event: RegistrationEvent = serde_json::from_slice(&published[0].1).unwrap();
        assert_eq!(event.email, "a@b.com");
        assert_eq!(event.id, user.id);
    }

    #[tokio::test]
    async fn weak_password_is_rejected_with_password_detail() {
        let (service, store) = service_with(Arc::new(RecordingPublisher::default()));
        let err = service.register("a@b.com", "password").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRequest);
        assert!(err.details.unwrap().contains_key("password"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let (service, _store) = service_with(Arc::new(RecordingPublisher::default()));
        service.register("a@b.com", "Password123!").await.unwrap();

        let err = service.register("a@b.com", "Password123!").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        assert_eq!(err.code, "USER.ALREADY_EXISTS");
        assert_eq!(err.message, "user with the email 'a@b.com' already exists");
    }

    #[tokio::test]
    async fn duplicate_check_is_case_insensitive() {
        let (service, _store) = service_with(Arc::new(RecordingPublisher::default()));
        service.register("a@b.com", "Password123!").await.unwrap();
        let err = service.register("A@B.COM", "Password123!").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn publish_failure_does_not_fail_registration() {
        let (service, store) = service_with(Arc::new(FailingPublisher));
        let user = service.register("a@b.com", "Password123!").await.unwrap();
        assert!(store.get_user_by_id(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn profile_returns_stored_user_or_not_found() {
        let (service, _store) = service_with(Arc::new(RecordingPublisher::default()));
        let user = service.register("a@b.com", "Password123!").await.unwrap();

        let loaded = service.profile(user.id).await.unwrap();
        assert_eq!(loaded.id, user.id);

        let err = service.profile(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
