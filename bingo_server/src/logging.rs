//! Structured logging configuration.
//!
//! The bingo library logs through the `log` facade; the server installs a
//! `tracing` subscriber that also captures those records, so both end up in
//! one structured stream.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,hyper=warn,tower_http=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use bingo_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    // Registers the `log` bridge as well.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a win claim outcome with structured fields
///
/// # Arguments
///
/// * `session_id` - Session the claim was made against
/// * `card` - Card identifier or verification code as submitted
/// * `outcome` - `winner`, `not_winner`, or an error kind such as `claim_expired`
pub fn log_claim(session_id: i64, card: &str, outcome: &str) {
    tracing::info!(
        session_id = session_id,
        card = card,
        outcome = outcome,
        "Win claim evaluated"
    );
}

/// Log an operator action on a session
pub fn log_operator_action(session_id: i64, action: &str, called: usize) {
    tracing::info!(
        session_id = session_id,
        action = action,
        called = called,
        "Operator action"
    );
}
