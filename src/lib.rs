pub mod add_patient; // Intake form validation + submission state machine
pub mod api; // JSON API over the patient repository
pub mod backend; // PatientBackend trait: SQLite and HTTP implementations
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;
pub mod search; // Patient filter
pub mod store; // Observable patient collection

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

/// Open the database, serve the API and wait for Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let app_config = config::AppConfig::from_env()?;
    let core = Arc::new(core_state::CoreState::open(&app_config.database_path)?);

    let server = api::start_api_server(core, app_config.bind_addr).await?;
    tracing::info!(url = %server.session.base_url(), "Serving patient API");

    let signal = tokio::signal::ctrl_c().await;
    server.stop().await;
    signal.map_err(StartupError::Signal)
}
