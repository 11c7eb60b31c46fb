//! HTTP/WebSocket API for the bingo server.
//!
//! A thin layer over the bingo core: handlers translate JSON to manager
//! calls and map [`care_bingo::BingoError`] to HTTP statuses. Session state
//! lives in one actor task per session; viewers follow it over `/ws`.
//!
//! # Modules
//!
//! - [`sessions`]: Scheduling and operator controls (activate, call, complete)
//! - [`cards`]: Card generation, print/order flags, and win verification
//! - [`websocket`]: Live session updates for displays and operator consoles
//! - [`request_id`]: Request correlation and per-route request counts
//! - [`error`]: Error to HTTP status mapping
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use bingo_server::api::{AppState, create_router};
//! use care_bingo::{
//!     WinVerifier,
//!     card::CardManager,
//!     session::{SessionConfig, SessionManager},
//!     store::InMemoryStore,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryStore::new());
//! let sessions = Arc::new(SessionManager::new(store.clone(), SessionConfig::default()));
//! let cards = Arc::new(CardManager::new(store.clone(), store));
//! let verifier = Arc::new(WinVerifier::new(cards.clone(), sessions.clone()));
//!
//! let app = create_router(AppState { sessions, cards, verifier });
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is permissive; lounge displays are served from other origins.

pub mod cards;
pub mod error;
pub mod request_id;
pub mod sessions;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use care_bingo::{WinVerifier, card::CardManager, session::SessionManager};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::metrics;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub cards: Arc<CardManager>,
    pub verifier: Arc<WinVerifier>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET  /health                              - Health check
/// GET  /api/v1/sessions                     - List sessions
/// POST /api/v1/sessions                     - Schedule a session
/// GET  /api/v1/sessions/next                - Next scheduled session
/// GET  /api/v1/sessions/active              - Session in progress
/// GET  /api/v1/sessions/{id}                - Session snapshot
/// POST /api/v1/sessions/{id}/activate       - Start early
/// POST /api/v1/sessions/{id}/call-number    - Draw a ball
/// POST /api/v1/sessions/{id}/complete       - End or cancel
/// GET  /api/v1/cards?session_id=            - List cards
/// POST /api/v1/cards/generate               - Generate 1-100 cards
/// POST /api/v1/cards/print                  - Mark printed
/// POST /api/v1/cards/order                  - Mark ordered
/// POST /api/v1/cards/verify                 - Verify by identifier
/// POST /api/v1/cards/verify-code            - Verify by verification code
/// GET  /ws                                  - Live session updates
/// ```
pub fn create_router(state: AppState) -> Router {
    let root_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    let session_routes = Router::new()
        .route(
            "/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route("/sessions/next", get(sessions::next_session))
        .route("/sessions/active", get(sessions::active_session))
        .route("/sessions/{session_id}", get(sessions::get_session))
        .route(
            "/sessions/{session_id}/activate",
            post(sessions::activate_session),
        )
        .route(
            "/sessions/{session_id}/call-number",
            post(sessions::call_number),
        )
        .route(
            "/sessions/{session_id}/complete",
            post(sessions::complete_session),
        );

    let card_routes = Router::new()
        .route("/cards", get(cards::list_cards))
        .route("/cards/generate", post(cards::generate_cards))
        .route("/cards/print", post(cards::print_cards))
        .route("/cards/order", post(cards::order_cards))
        .route("/cards/verify", post(cards::verify_card))
        .route("/cards/verify-code", post(cards::verify_code));

    Router::new().merge(session_routes).merge(card_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","active_sessions":3,"timestamp":"2025-06-06T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let session_count = state.sessions.session_count().await;
    metrics::active_sessions(session_count);

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "active_sessions": session_count,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
