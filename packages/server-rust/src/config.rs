//! Environment-driven configuration for the server.
//!
//! Every knob is a CLI flag with an environment-variable fallback, so the
//! binary works both under an orchestrator (env) and on a developer
//! machine (flags).

use clap::Parser;

/// Top-level configuration for the gatekey server.
#[derive(Debug, Clone, Parser)]
#[command(name = "gatekey", version, about = "Account registration and authentication service")]
pub struct AppConfig {
    /// Bind address for the HTTP server.
    #[arg(long, env = "APP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on. 0 means OS-assigned.
    #[arg(long, env = "APP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Secret used to sign and verify bearer tokens.
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: String,

    /// Token lifetime as a duration string, e.g. "3600s", "15m", "1d".
    #[arg(long, env = "JWT_EXPIRATION_TIME", default_value = "1d")]
    pub jwt_expiration: String,

    /// Issuer claim embedded in every token.
    #[arg(long, env = "JWT_ISSUER", default_value = "gatekey")]
    pub jwt_issuer: String,

    /// NATS server URL for the event stream.
    #[arg(long, env = "NATS_URL", default_value = "nats://127.0.0.1:4222")]
    pub nats_url: String,

    /// Subject registration events are published to.
    #[arg(long, env = "NATS_EVENT_USER_REGISTRATION", default_value = "user.registered")]
    pub registration_subject: String,

    /// Allowed CORS origins. A single "*" allows any origin.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,
}
