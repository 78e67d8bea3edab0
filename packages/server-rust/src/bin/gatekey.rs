//! Service entry point: configuration, dependency wiring, and startup.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gatekey_server::account::AccountService;
use gatekey_server::auth::AuthFacade;
use gatekey_server::config::AppConfig;
use gatekey_server::events::{EventPublisher, NatsEventPublisher};
use gatekey_server::network::{AppState, ServerModule};
use gatekey_server::store::{PostgresUserStore, UserStore};
use gatekey_server::token::TokenService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = AppConfig::parse();

    // An unparseable token lifetime is a configuration error; fail here,
    // not on the first login.
    let tokens = TokenService::new(&config.jwt_secret, &config.jwt_expiration, &config.jwt_issuer)?;

    let postgres = PostgresUserStore::connect(&config.database_url).await?;
    postgres.ensure_schema().await?;
    let store: Arc<dyn UserStore> = Arc::new(postgres);

    let nats = Arc::new(NatsEventPublisher::connect(&config.nats_url).await?);
    let events: Arc<dyn EventPublisher> = Arc::clone(&nats) as Arc<dyn EventPublisher>;
    events.subscribe(&config.registration_subject).await?;

    let state = AppState {
        auth: Arc::new(AuthFacade::new(Arc::clone(&store), tokens)),
        accounts: Arc::new(AccountService::new(
            Arc::clone(&store),
            Arc::clone(&events),
            config.registration_subject.clone(),
        )),
        store: Arc::clone(&store),
        start_time: Instant::now(),
    };

    let mut server = ServerModule::new(&config, state);
    let port = server.start().await?;
    info!(host = %config.host, port, "gatekey listening");

    server.serve(shutdown_signal()).await?;

    nats.close().await;
    store.close().await;
    info!("shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
