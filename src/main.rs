//! Application entry point for the `farm-mrv` service.
//!
//! Startup sequence:
//! - Load configuration from environment variables or `.env`
//! - Initialize structured logging/tracing
//! - Wire providers (real clients where configured, synthetic otherwise)
//! - Mount the API routes via the `routes` gateway
//! - Bind the Axum HTTP server and serve requests
//!
//! # Environment Variables
//! - `LISTEN_PORT` (optional) – HTTP port (default: 8080)
//! - `MRV_USE_SYNTHETIC` (optional) – serve every provider synthetically
//! - `MRV_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `MRV_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! Provider endpoints and credentials are documented in `config`.
use std::{env, net::SocketAddr};

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use farm_mrv::{config, routes, MrvAggregator};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let aggregator = MrvAggregator::from_config(&cfg)?;
    tracing::info!("Providers: {:?}", aggregator.sources().describe());

    let app: Router = routes::router(aggregator);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.listen_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// - Color output: `FORCE_COLOR=1|true|yes` forces it on, `0|false|no` forces
///   it off, anything else auto-detects a TTY
/// - Span events via `MRV_SPAN_EVENTS`: `"full"`, `"enter_exit"`, or
///   close-only by default
/// - Level via `RUST_LOG` when set, else `MRV_LOG_LEVEL` (default `debug`)
///
/// Call once at startup; the subscriber is installed globally.
fn init_tracing() {
    // ---
    let span_events = match env::var("MRV_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("MRV_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
