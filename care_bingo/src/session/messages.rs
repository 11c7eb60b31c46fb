//! Session actor message types.

use serde::Serialize;
use tokio::sync::oneshot;

use super::broadcaster::{SubscriberId, Subscription};
use super::models::GameSession;
use crate::card::Ball;
use crate::error::BingoResult;

/// Messages that can be sent to a SessionActor
#[derive(Debug)]
pub enum SessionMessage {
    /// Operator starts the session early
    Activate {
        response: oneshot::Sender<BingoResult<GameSession>>,
    },

    /// Draw the next ball
    CallNextNumber {
        response: oneshot::Sender<BingoResult<NumberCall>>,
    },

    /// End the session, or cancel it if it never started
    Complete {
        response: oneshot::Sender<BingoResult<GameSession>>,
    },

    /// Get current session state
    GetSnapshot {
        response: oneshot::Sender<GameSession>,
    },

    /// Register for state change events
    Subscribe {
        response: oneshot::Sender<Subscription>,
    },

    /// Stop receiving state change events
    Unsubscribe { subscriber_id: SubscriberId },

    /// Internal: check the schedule now instead of waiting for the timer
    Tick,

    /// Stop the actor
    Shutdown,
}

/// Result of a successful draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberCall {
    pub ball: Ball,
    pub session: GameSession,
}
