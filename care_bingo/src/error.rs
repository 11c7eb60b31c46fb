//! Error types shared by every bingo operation.

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::card::{BALL_COUNT, CardId};
use crate::session::{SessionId, SessionStatus, Transition};

/// What a failed lookup was searching for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupTarget {
    Session(SessionId),
    Card(CardId),
    Identifier(String),
    VerificationCode(String),
}

impl fmt::Display for LookupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupTarget::Session(id) => write!(f, "session {id}"),
            LookupTarget::Card(id) => write!(f, "card {id}"),
            LookupTarget::Identifier(identifier) => write!(f, "card {identifier}"),
            LookupTarget::VerificationCode(code) => write!(f, "card with code {code}"),
        }
    }
}

/// Errors produced by card generation, number calling and win verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BingoError {
    /// Out-of-range batch size, malformed pattern or ball label
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// State machine operation attempted from a state that does not allow it
    #[error("session {session_id} cannot {action} while {from}")]
    InvalidTransition {
        session_id: SessionId,
        from: SessionStatus,
        action: Transition,
    },

    /// Every ball has already been called
    #[error("all {count} numbers have been called in session {0}", count = BALL_COUNT)]
    ExhaustedPool(SessionId),

    /// Win claim arrived after the claim window closed
    #[error("claim window for session {session_id} closed at {deadline}")]
    ClaimExpired {
        session_id: SessionId,
        deadline: DateTime<Utc>,
    },

    /// Card or session lookup miss
    #[error("{0} not found")]
    NotFound(LookupTarget),

    /// Card was issued for a different session than the one claimed against
    #[error("card {identifier} is not registered for session {claimed_session}")]
    WrongSession {
        identifier: String,
        card_session: Option<SessionId>,
        claimed_session: SessionId,
    },

    /// Claim against a session that has not started calling numbers
    #[error("session {0} has not started")]
    SessionNotLive(SessionId),

    /// The session actor has shut down
    #[error("session {0} is no longer running")]
    SessionUnavailable(SessionId),

    /// Persistence collaborator failure
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl BingoError {
    /// Stable snake_case tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            BingoError::InvalidArgument(_) => "invalid_argument",
            BingoError::InvalidTransition { .. } => "invalid_transition",
            BingoError::ExhaustedPool(_) => "exhausted_pool",
            BingoError::ClaimExpired { .. } => "claim_expired",
            BingoError::NotFound(_) => "not_found",
            BingoError::WrongSession { .. } => "wrong_session",
            BingoError::SessionNotLive(_) => "session_not_live",
            BingoError::SessionUnavailable(_) => "session_unavailable",
            BingoError::StorageUnavailable(_) => "storage_unavailable",
        }
    }

    /// Get a client-safe error message.
    ///
    /// Storage failures are reduced to a generic message so backend details
    /// never reach the UI.
    pub fn client_message(&self) -> String {
        match self {
            BingoError::StorageUnavailable(_) => {
                "Storage is temporarily unavailable, please try again".to_string()
            }
            _ => self.to_string(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        BingoError::InvalidArgument(message.into())
    }
}

/// Result type for bingo operations
pub type BingoResult<T> = Result<T, BingoError>;
