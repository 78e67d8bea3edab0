//! Server lifecycle with deferred startup.
//!
//! `new()` captures configuration and state, `start()` binds the TCP
//! listener, and `serve()` accepts connections until the shutdown future
//! resolves. The separation lets the binary log the bound port (which
//! may be OS-assigned) before traffic starts.

use std::future::Future;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::info;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::network::handlers::{
    health_handler, login_handler, profile_handler, registration_handler, AppState,
};
use crate::network::middleware::{
    build_cors_layer, AccessLogLayer, AuthLayer, PanicGuardLayer, TraceIdLayer,
};

/// Assembles the router with all routes and the middleware pipeline.
///
/// Routes:
/// - `POST /auth/login` -- public
/// - `POST /users/registration` -- public
/// - `GET /users/profile` -- private (bearer token)
/// - `GET /health` -- public
///
/// **Middleware ordering (outermost to innermost):**
/// 1. `TraceId` -- assigns the per-request trace id
/// 2. `PanicGuard` -- converts panics into internal-error responses
/// 3. `AccessLog` -- entry/exit logging with elapsed time
/// 4. `CORS` -- Cross-Origin Resource Sharing from configured origins
///
/// Bearer authentication wraps only the private routes.
#[must_use]
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let private = Router::new()
        .route("/users/profile", get(profile_handler))
        .route_layer(AuthLayer::new(state.auth.clone()));

    Router::new()
        .route("/auth/login", post(login_handler))
        .route("/users/registration", post(registration_handler))
        .route("/health", get(health_handler))
        .merge(private)
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceIdLayer)
                .layer(PanicGuardLayer)
                .layer(AccessLogLayer)
                .layer(build_cors_layer(cors_origins)),
        )
        .with_state(state)
}

/// Fallback for unknown routes, kept inside the error envelope contract.
async fn route_not_found() -> ApiError {
    ApiError::not_found("ROUTE.NOT_FOUND", "route not found")
}

/// Manages the HTTP server lifecycle.
pub struct ServerModule {
    host: String,
    port: u16,
    cors_origins: Vec<String>,
    listener: Option<TcpListener>,
    state: AppState,
}

impl ServerModule {
    /// Creates the module without binding any port.
    #[must_use]
    pub fn new(config: &AppConfig, state: AppState) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            cors_origins: config.cors_origins.clone(),
            listener: None,
            state,
        }
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the
    /// configured port when port 0 is used (OS-assigned).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until the shutdown future resolves.
    ///
    /// Consumes `self` because the listener is moved into the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server hits a fatal I/O error.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .expect("start() must be called before serve()");
        let router = build_router(self.state, &self.cors_origins);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use super::*;
    use crate::account::AccountService;
    use crate::auth::AuthFacade;
    use crate::events::{EventError, EventPublisher};
    use crate::store::{MemoryUserStore, UserStore};
    use crate::token::TokenService;
    use async_trait::async_trait;
    use bytes::Bytes;

    struct NullPublisher;

    #[async_trait]
    impl EventPublisher for NullPublisher {
        async fn publish(&self, _subject: &str, _payload: Bytes) -> Result<(), EventError> {
            Ok(())
        }

        async fn subscribe(&self, _subject: &str) -> Result<(), EventError> {
            Ok(())
        }
    }

    fn test_state() -> AppState {
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        let events: Arc<dyn EventPublisher> = Arc::new(NullPublisher);
        let tokens = TokenService::new("test-secret", "1h", "gatekey").unwrap();
        AppState {
            auth: Arc::new(AuthFacade::new(Arc::clone(&store), tokens)),
            accounts: Arc::new(AccountService::new(
                Arc::clone(&store),
                events,
                "user.registered".to_string(),
            )),
            store,
            start_time: Instant::now(),
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "postgres://unused".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiration: "1h".to_string(),
            jwt_issuer: "gatekey".to_string(),
            nats_url: "nats://unused".to_string(),
            registration_subject: "user.registered".to_string(),
            cors_origins: vec!["*".to_string()],
        }
    }

    #[test]
    fn build_router_creates_router() {
        let _router = build_router(test_state(), &["*".to_string()]);
    }

    #[test]
    fn new_creates_module_without_binding() {
        let module = ServerModule::new(&test_config(), test_state());
        assert!(module.listener.is_none());
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let mut module = ServerModule::new(&test_config(), test_state());
        let port = module.start().await.expect("start should succeed");
        assert!(port > 0, "OS-assigned port should be > 0");
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    #[should_panic(expected = "start() must be called before serve()")]
    async fn serve_panics_without_start() {
        let module = ServerModule::new(&test_config(), test_state());
        let _ = module.serve(std::future::pending::<()>()).await;
    }
}
