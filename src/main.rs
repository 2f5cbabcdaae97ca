use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use api_shared::HealthService;
use clinic_core::{CoreConfig, EntityKind, FileStore, FormService};

/// Main entry point for the clinic records application
///
/// Resolves configuration once, warms the visibility cache for every entity kind and serves the
/// REST API (with Swagger UI at `/swagger-ui`) until interrupted.
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Directory for records, schedules and configuration (default: "clinic_data")
/// - `CLINIC_CONFIG_NAMESPACE`: Prefix of the visibility configuration keys (default: "clinic")
/// - `API_KEY`: When set, required in the `x-api-key` header of every non-health request
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic=info".parse()?)
                .add_directive("clinic_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr: SocketAddr = std::env::var("CLINIC_REST_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".into())
        .parse()?;
    let cfg = CoreConfig::from_env_values(
        std::env::var("CLINIC_DATA_DIR").ok(),
        std::env::var("CLINIC_CONFIG_NAMESPACE").ok(),
    )?;
    let api_key = std::env::var("API_KEY").ok().filter(|key| !key.is_empty());
    if api_key.is_none() {
        tracing::warn!("API_KEY not set; the REST API is open");
    }

    tracing::info!("++ Starting clinic REST on {}", rest_addr);
    tracing::info!(
        "++ Data directory {} (namespace {})",
        cfg.data_dir().display(),
        cfg.config_namespace()
    );

    let store = Arc::new(FileStore::new(Arc::new(cfg)));
    let service = Arc::new(FormService::new(store));

    for kind in EntityKind::ALL {
        if let Err(e) = service.visibility(kind).await {
            tracing::warn!("visibility for {} not loaded at startup: {}", kind, e);
        }
    }

    let app = router(AppState::new(service, api_key));
    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    tracing::info!("{}", HealthService::check_health().message);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    Ok(())
}
