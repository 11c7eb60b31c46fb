//! Persistence collaborator traits.
//!
//! The core never assumes a storage backend. Managers and actors receive these
//! traits as `Arc<dyn ...>`; any failure surfaces as `StorageUnavailable` and
//! is never retried here.

use async_trait::async_trait;

use crate::card::{BingoCard, CardDraft, CardId, CardMark};
use crate::error::BingoResult;
use crate::session::{GameSession, NewSession, SessionId};

/// Trait for session repository operations
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Assign an ID and store a newly scheduled session
    async fn insert_session(&self, new: NewSession) -> BingoResult<GameSession>;

    /// Find session by ID
    async fn load_session(&self, id: SessionId) -> BingoResult<Option<GameSession>>;

    /// Overwrite a stored session
    async fn save_session(&self, session: &GameSession) -> BingoResult<()>;

    /// Every stored session, in no particular order
    async fn list_sessions(&self) -> BingoResult<Vec<GameSession>>;
}

/// Trait for card repository operations
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Store a card unless its identifier or verification code is taken.
    ///
    /// Returns `None` on collision. The check and the insert are atomic.
    async fn create_if_unique(&self, draft: CardDraft) -> BingoResult<Option<BingoCard>>;

    /// Find card by ID
    async fn load_card(&self, id: CardId) -> BingoResult<Option<BingoCard>>;

    /// Apply a flag change to the stored card and return the card as stored.
    ///
    /// Returns `None` for an unknown ID. The read and the write are atomic,
    /// so concurrent marks never undo each other.
    async fn mark_card(&self, id: CardId, mark: CardMark) -> BingoResult<Option<BingoCard>>;

    /// Find card by its human-readable identifier
    async fn find_by_identifier(&self, identifier: &str) -> BingoResult<Option<BingoCard>>;

    /// Find card by its numeric verification code
    async fn find_by_verification_code(&self, code: &str) -> BingoResult<Option<BingoCard>>;

    /// Cards ordered by ID, optionally only those issued for one session
    async fn list_cards(&self, session_id: Option<SessionId>) -> BingoResult<Vec<BingoCard>>;
}
