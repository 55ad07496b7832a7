//! Registry entry-point: loads settings, prepares persistence, and serves the
//! REST API, the search page, and OpenAPI docs.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use umarell::inbound::http::health::HealthState;
use umarell::outbound::persistence::{DbPool, run_migrations};
use umarell::settings::ServerSettings;

use server::{ServerConfig, create_server};

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load().map_err(|err| startup_error("invalid settings", err))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| startup_error("invalid settings", err))?;
    let pubsub = settings
        .pubsub()
        .map_err(|err| startup_error("invalid settings", err))?;

    let mut config = ServerConfig::new(bind_addr).with_pubsub(pubsub);
    if let Some(pool_config) = settings.pool_config() {
        run_migrations(pool_config.database_url())
            .await
            .map_err(|err| startup_error("database migration failed", err))?;
        let pool = DbPool::new(pool_config)
            .await
            .map_err(|err| startup_error("database pool", err))?;
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(%bind_addr, topic = settings.topic(), "umarell registry listening");
    server.await
}
