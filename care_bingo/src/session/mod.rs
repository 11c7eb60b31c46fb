//! Live game sessions with an async actor per session.
//!
//! This module implements:
//! - `GameSession`: the `scheduled -> active -> completed` state machine
//! - `SessionActor`: single writer for one session, so draws never race
//! - `SessionBroadcaster`: non-blocking fan-out of every transition
//! - `SessionManager`: spawns actors and answers catalogue queries
//!
//! ## Architecture
//!
//! Each session runs in its own Tokio task with an mpsc inbox. Operations
//! on one session are applied in arrival order; different sessions share no
//! mutable state and proceed in parallel.
//!
//! ## Example
//!
//! ```
//! use care_bingo::session::{SessionConfig, SessionManager};
//! use care_bingo::store::InMemoryStore;
//! use care_bingo::win::WinPattern;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), care_bingo::BingoError> {
//! let manager = SessionManager::new(Arc::new(InMemoryStore::new()), SessionConfig::default());
//! let session = manager
//!     .create_session(
//!         "Friday Bingo",
//!         chrono::Utc::now() + chrono::Duration::hours(1),
//!         WinPattern::Standard,
//!     )
//!     .await?;
//!
//! manager.activate(session.id).await?;
//! let call = manager.call_next_number(session.id).await?;
//! assert_eq!(call.session.called_numbers, vec![call.ball]);
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod broadcaster;
pub mod config;
pub mod manager;
pub mod messages;
pub mod models;
mod state_machine;

pub use actor::{SessionActor, SessionHandle};
pub use broadcaster::{
    SessionBroadcaster, SessionEvent, SessionEventKind, SubscriberId, Subscription,
};
pub use config::SessionConfig;
pub use manager::{MAX_TITLE_LEN, SessionManager};
pub use messages::{NumberCall, SessionMessage};
pub use models::{GameSession, NewSession, SessionId, SessionStatus, Transition};
