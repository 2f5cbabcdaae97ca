//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the clinic REST API with OpenAPI/Swagger UI.
//!
//! ## Intended use
//! Useful for development when you want to run the API crate on its own. The workspace's main
//! `clinic-run` binary serves the same router.

use api_rest::{router, AppState};
use clinic_core::{CoreConfig, FileStore, FormService};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the clinic REST API server
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Data directory (default: "clinic_data")
/// - `CLINIC_CONFIG_NAMESPACE`: Prefix of the visibility configuration keys (default: "clinic")
/// - `API_KEY`: When set, required in the `x-api-key` header of every non-health request
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = CoreConfig::from_env_values(
        std::env::var("CLINIC_DATA_DIR").ok(),
        std::env::var("CLINIC_CONFIG_NAMESPACE").ok(),
    )?;
    let api_key = std::env::var("API_KEY").ok().filter(|key| !key.is_empty());

    tracing::info!(
        "-- Starting clinic REST API on {} (data in {})",
        addr,
        cfg.data_dir().display()
    );

    let store = Arc::new(FileStore::new(Arc::new(cfg)));
    let service = Arc::new(FormService::new(store));
    let app = router(AppState::new(service, api_key));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
