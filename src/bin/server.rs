//! `dayflow-server`: the REST entry point.
//!
//! Boots in four steps: load the TOML/env configuration, connect the chosen
//! storage backend, construct the Groq-backed text generator, then serve the
//! axum router, optionally with the recurrence sweeper ticking in the
//! background.
//!
//! ```bash
//! # in-memory storage (default features)
//! GROQ_API_KEY=... cargo run --bin dayflow-server --features http-server
//!
//! # persistent storage
//! GROQ_API_KEY=... DATABASE_URL=postgres://localhost/dayflow \
//!     cargo run --bin dayflow-server --features "postgres-repo,http-server"
//! ```
//!
//! Runtime knobs: `DAYFLOW_CONFIG` points at the config file, `HOST`/`PORT`
//! override the bind address, `DATABASE_URL` overrides the file's database
//! URL, `RUST_LOG` sets the log filter, and `GROQ_API_KEY` must come from
//! the environment (it is never read from the file).

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use dayflow::config::AppConfig;
use dayflow::db::RepositoryFactory;
use dayflow::http::{create_router, AppState};
use dayflow::provider::GroqClient;
use dayflow::services;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// `HOST`/`PORT` beat the config file when set.
fn bind_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    let host = env::var("HOST").unwrap_or_else(|_| config.server.host.clone());
    let port = env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(config.server.port);
    Ok(format!("{}:{}", host, port).parse()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load()?;

    let repository = RepositoryFactory::from_app_config(&config).await?;
    info!("storage backend ready ({})", config.repository.repo_type);

    let generator = GroqClient::from_settings(&config.provider)?;
    info!("text generation ready (model {})", generator.model());

    if config.sweeper.enabled {
        let _sweeper = services::spawn_sweeper(
            Arc::clone(&repository),
            Duration::from_secs(config.sweeper.interval_secs),
            Duration::from_secs(config.sweeper.budget_secs),
        );
        info!(
            "recurrence sweeper running every {}s",
            config.sweeper.interval_secs
        );
    }

    let state = AppState::new(repository, Arc::new(generator), config.display_offset());
    let addr = bind_addr(&config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", addr);

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
