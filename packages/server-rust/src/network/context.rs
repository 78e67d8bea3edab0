//! Typed per-request context propagated through the middleware pipeline.
//!
//! Carried as an axum request extension. A fresh context is created at
//! the start of each request and discarded at its end; it is never
//! shared across requests.

use uuid::Uuid;

use gatekey_core::TokenPayload;

/// Per-request state: a correlation id, and the verified identity once
/// the authentication middleware has run.
#[derive(Debug, Clone)]
pub struct RequestContext {
    trace_id: Uuid,
    identity: Option<TokenPayload>,
}

impl RequestContext {
    #[must_use]
    pub fn new(trace_id: Uuid) -> Self {
        Self {
            trace_id,
            identity: None,
        }
    }

    /// Creates a context with a freshly generated trace id.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4())
    }

    #[must_use]
    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    /// The verified identity, present only after authentication.
    #[must_use]
    pub fn identity(&self) -> Option<&TokenPayload> {
        self.identity.as_ref()
    }

    /// Returns the context with the verified identity attached.
    #[must_use]
    pub fn with_identity(mut self, identity: TokenPayload) -> Self {
        self.identity = Some(identity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_contexts_have_unique_trace_ids() {
        assert_ne!(
            RequestContext::generate().trace_id(),
            RequestContext::generate().trace_id()
        );
    }

    #[test]
    fn identity_is_absent_until_attached() {
        let ctx = RequestContext::generate();
        assert!(ctx.identity().is_none());

        let identity = TokenPayload::new(Uuid::new_v4(), "a@b.com");
        let ctx = ctx.with_identity(identity.clone());
        assert_eq!(ctx.identity(), Some(&identity));
    }
}
