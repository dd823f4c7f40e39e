//! # Gestor API server binary
//!
//! ```bash
//! cargo run -p gestor-api
//!
//! # Override settings from the environment
//! GESTOR__SERVER__PORT=8080 GESTOR__DATABASE__PATH=./data/gestor.db cargo run -p gestor-api
//! RUST_LOG=gestor_api=debug,tower_http=debug cargo run -p gestor-api
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;

use gestor_api::startup;
use gestor_api::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting Gestor API server...");

    let settings = Settings::load()?;
    info!(
        port = settings.server.port,
        database = %settings.database.path,
        printing = settings.printing.enabled,
        "Configuration loaded"
    );

    startup::run(settings).await
}
