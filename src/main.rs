use std::path::PathBuf;
use std::sync::Arc;

use api_rest::{AppState, router};
use report_core::constants::DEFAULT_REPORT_DATA_DIR;
use report_core::{CoreConfig, io_timeout_from_env_value, resolve_template_dir};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the report server
///
/// Resolves configuration once from the environment and serves the REST API.
///
/// # Environment Variables
/// - `REPORT_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `REPORT_DATA_DIR`: Directory for saved reports (default: "report_data")
/// - `REPORT_TEMPLATE_DIR`: Template catalog directory (default: bundled `crates/core/templates`)
/// - `REPORT_IO_TIMEOUT_MS`: Bound on template fetches and report loads/saves (default: 10000)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("report_run=info".parse()?)
                .add_directive("report_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("REPORT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let report_data_dir = std::env::var("REPORT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_REPORT_DATA_DIR));
    let template_dir =
        resolve_template_dir(std::env::var("REPORT_TEMPLATE_DIR").ok().map(PathBuf::from))?;
    let io_timeout = io_timeout_from_env_value(std::env::var("REPORT_IO_TIMEOUT_MS").ok())?;

    let cfg = Arc::new(CoreConfig::new(report_data_dir, template_dir, io_timeout)?);

    tracing::info!("++ Starting report REST on {}", rest_addr);
    tracing::info!(
        "++ Templates from {}, reports in {}",
        cfg.template_dir().display(),
        cfg.reports_dir().display()
    );

    let app = router(AppState::new(cfg));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
