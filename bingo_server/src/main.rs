//! Care-home bingo server.
//!
//! Runs one actor per session behind an HTTP/WebSocket API, backed by the
//! in-memory store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use bingo_server::{
    api::{self, AppState},
    config::ServerConfig,
    demo, logging, metrics,
};
use care_bingo::{
    WinVerifier, card::CardManager, session::SessionManager, store::InMemoryStore,
};
use log::info;
use pico_args::Arguments;
use tokio::sync::watch;

const HELP: &str = "\
Run a care-home bingo server

USAGE:
  bingo_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --metrics    IP:PORT     Prometheus exporter address [default: env METRICS_BIND, disabled if unset]

FLAGS:
  --demo                   Seed demo sessions and cards
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND             Prometheus exporter address
  CLAIM_WINDOW_MINUTES     Minutes after a session ends that claims are accepted [default: 30]
  AUTO_ACTIVATE            Start sessions at their scheduled time [default: true]
  SESSION_TICK_MS          Schedule check interval [default: 1000]
  SESSION_INBOX_CAPACITY   Queued commands per session [default: 100]
  SUBSCRIBER_BUFFER        Queued events per viewer [default: 32]
  SEED_DEMO                Same as --demo
  RUST_LOG                 Log filter [default: info]
";

struct Args {
    bind: Option<SocketAddr>,
    metrics: Option<SocketAddr>,
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        metrics: pargs.opt_value_from_str("--metrics")?,
        demo: pargs.contains("--demo"),
    };

    let config = ServerConfig::from_env(args.bind, args.metrics, args.demo)?;
    config.validate()?;

    logging::init();
    info!("Starting bingo server at {}", config.bind);

    // Ctrl+C and SIGTERM both trigger a graceful shutdown.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(true);
    })?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics at http://{}/metrics", addr);
    }

    let store = Arc::new(InMemoryStore::new());
    let sessions = Arc::new(SessionManager::new(store.clone(), config.session.clone()));
    let cards = Arc::new(CardManager::new(store.clone(), store));
    let verifier = Arc::new(WinVerifier::new(cards.clone(), sessions.clone()));

    if config.seed_demo {
        demo::seed(&sessions, &cards)
            .await
            .context("Failed to seed demo data")?;
    }

    let session_count = sessions.session_count().await;
    metrics::active_sessions(session_count);
    info!("Server ready with {} session(s)", session_count);

    let app = api::create_router(AppState {
        sessions: sessions.clone(),
        cards,
        verifier,
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    sessions.shutdown().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow_and_update() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
}
