//! Game session models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::card::Ball;
use crate::win::WinPattern;

/// Session ID type
pub type SessionId = i64;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Active,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Scheduled => write!(f, "scheduled"),
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A state machine operation, used when reporting a rejected transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Activate,
    CallNumber,
    Complete,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Activate => write!(f, "activate"),
            Transition::CallNumber => write!(f, "call a number"),
            Transition::Complete => write!(f, "complete"),
        }
    }
}

/// One bingo session and its authoritative call history.
///
/// `called_numbers` is append-only while active and holds no duplicates.
/// `activated_at` and `end_time` are each set at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: SessionId,
    pub title: String,
    pub scheduled_start: DateTime<Utc>,
    pub status: SessionStatus,
    pub called_numbers: Vec<Ball>,
    pub winning_pattern: WinPattern,
    /// When numbers started being called; `None` for a session cancelled before it began
    #[serde(default)]
    pub activated_at: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl GameSession {
    pub fn from_new(id: SessionId, new: NewSession, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            scheduled_start: new.scheduled_start,
            status: SessionStatus::Scheduled,
            called_numbers: Vec::new(),
            winning_pattern: new.winning_pattern,
            activated_at: None,
            end_time: None,
            created_at,
        }
    }

    /// Most recently called ball
    pub fn last_called(&self) -> Option<Ball> {
        self.called_numbers.last().copied()
    }
}

/// Request to schedule a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub title: String,
    pub scheduled_start: DateTime<Utc>,
    #[serde(default)]
    pub winning_pattern: WinPattern,
}

impl NewSession {
    pub fn new(
        title: impl Into<String>,
        scheduled_start: DateTime<Utc>,
        winning_pattern: WinPattern,
    ) -> Self {
        Self {
            title: title.into(),
            scheduled_start,
            winning_pattern,
        }
    }
}
