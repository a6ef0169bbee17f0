use std::{fs::File, net::SocketAddr, path::Path, path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use supportfund::{Store, core::HttpClientOptions};
use supportfund_ksepa::KsepaPlugin;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt as _, util::SubscriberInitExt};

mod render;
mod web;

#[derive(Parser, Debug)]
#[command(
    name = "supportfund",
    about = "Crawls social economy support notices and serves them as a web page.",
    version
)]
struct SupportFundOptions {
    /// The address the web server listens on.
    #[arg(
        short = 'b',
        long = "bind",
        env = "SUPPORTFUND_BIND",
        default_value = "127.0.0.1:8000"
    )]
    bind: SocketAddr,

    /// The SQLite database file. Created if missing.
    #[arg(
        short = 'd',
        long = "database",
        env = "SUPPORTFUND_DATABASE",
        default_value = "./support_fund.db"
    )]
    database: PathBuf,

    /// Skip TLS certificate validation when fetching the notice list.
    #[arg(long = "accept-invalid-certs", env = "SUPPORTFUND_ACCEPT_INVALID_CERTS")]
    accept_invalid_certs: bool,

    /// Request timeout in seconds for fetching the notice list. No timeout by default.
    #[arg(short = 't', long = "timeout", env = "SUPPORTFUND_TIMEOUT")]
    timeout: Option<u64>,

    /// The directory for JSON ingest and error reports.
    #[arg(long = "report-dir", env = "SUPPORTFUND_REPORT_DIR", default_value = "./reports")]
    report_dir: PathBuf,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let options = SupportFundOptions::parse();
    setup_tracing(&options.report_dir)?;

    color_eyre::install()?;

    let store = Store::open(&options.database).await?;
    let source = KsepaPlugin::new(&HttpClientOptions {
        accept_invalid_certs: options.accept_invalid_certs,
        timeout: options.timeout.map(Duration::from_secs),
        ..Default::default()
    })?;

    let app = web::router(web::AppState::new(store.clone(), source));

    let listener = tokio::net::TcpListener::bind(options.bind).await?;
    tracing::info!("HTTP server listening on {}", options.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Database closed");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down the web server"),
        Err(e) => {
            tracing::error!("Failed to listen for the shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}

fn setup_tracing(report_dir: &Path) -> eyre::Result<()> {
    std::fs::create_dir_all(report_dir)?;

    let stdout_log = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_level(true)
        .with_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    let ingest_report_file = File::create(report_dir.join("ingest_report.json"))
        .map_err(|e| eyre::eyre!("Failed to create ingest report file: {e}"))?;
    let ingest_report_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_span_list(false)
        .with_writer(Arc::new(ingest_report_file))
        .with_filter(filter::filter_fn(|metadata| {
            metadata.target() == "ingest_update"
        }));

    let error_report_file = File::create(report_dir.join("error_report.json"))
        .map_err(|e| eyre::eyre!("Failed to create error report file: {e}"))?;
    let error_report_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(Arc::new(error_report_file))
        .with_filter(LevelFilter::ERROR);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(ingest_report_layer)
        .with(error_report_layer)
        .init();
    Ok(())
}
