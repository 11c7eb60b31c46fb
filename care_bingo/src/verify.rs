//! Win claim verification, the one place card data and session data meet.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::card::{BingoCard, CardManager};
use crate::error::{BingoError, BingoResult};
use crate::session::{SessionId, SessionManager};
use crate::win::{self, Line, WinPattern};

/// Outcome of a claim that passed every precondition.
///
/// `is_valid == false` means "not a winner"; every other rejection is a
/// [`BingoError`] so callers can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinClaim {
    pub is_valid: bool,
    pub pattern: WinPattern,
    pub card: BingoCard,
    pub session_id: SessionId,
    /// Lines completed on the card, for the standard pattern
    pub completed_lines: Vec<Line>,
    pub evaluated_at: DateTime<Utc>,
}

/// Checks claimed cards against live session state
pub struct WinVerifier {
    cards: Arc<CardManager>,
    sessions: Arc<SessionManager>,
}

impl WinVerifier {
    pub fn new(cards: Arc<CardManager>, sessions: Arc<SessionManager>) -> Self {
        Self { cards, sessions }
    }

    /// Verify a claim made now using the card's printed identifier
    pub async fn verify_by_identifier(
        &self,
        identifier: &str,
        session_id: SessionId,
        claimed: Option<WinPattern>,
    ) -> BingoResult<WinClaim> {
        self.verify_by_identifier_at(identifier, session_id, claimed, Utc::now())
            .await
    }

    pub async fn verify_by_identifier_at(
        &self,
        identifier: &str,
        session_id: SessionId,
        claimed: Option<WinPattern>,
        at: DateTime<Utc>,
    ) -> BingoResult<WinClaim> {
        let card = self.cards.find_by_identifier(identifier).await?;
        self.verify(card, session_id, claimed, at).await
    }

    /// Verify a claim made now using the card's verification code
    pub async fn verify_by_code(
        &self,
        code: &str,
        session_id: SessionId,
        claimed: Option<WinPattern>,
    ) -> BingoResult<WinClaim> {
        self.verify_by_code_at(code, session_id, claimed, Utc::now())
            .await
    }

    pub async fn verify_by_code_at(
        &self,
        code: &str,
        session_id: SessionId,
        claimed: Option<WinPattern>,
        at: DateTime<Utc>,
    ) -> BingoResult<WinClaim> {
        let card = self.cards.find_by_verification_code(code).await?;
        self.verify(card, session_id, claimed, at).await
    }

    /// Checks, in order: session exists, card belongs to it, claimed pattern
    /// matches, session has started, claim is inside the window, and finally
    /// the pattern against the called numbers.
    async fn verify(
        &self,
        card: BingoCard,
        session_id: SessionId,
        claimed: Option<WinPattern>,
        at: DateTime<Utc>,
    ) -> BingoResult<WinClaim> {
        let session = self.sessions.get_snapshot(session_id).await?;

        if card.session_id != Some(session_id) {
            log::info!(
                "Rejected claim for {}: issued for {:?}, claimed against {}",
                card.identifier,
                card.session_id,
                session_id
            );
            return Err(BingoError::WrongSession {
                identifier: card.identifier,
                card_session: card.session_id,
                claimed_session: session_id,
            });
        }

        if let Some(claimed) = claimed
            && claimed != session.winning_pattern
        {
            return Err(BingoError::invalid_argument(format!(
                "session {} is played for {}, not {}",
                session_id, session.winning_pattern, claimed
            )));
        }

        if let Err(err) = session.check_claim_window(at, self.sessions.config().claim_window()) {
            log::info!("Rejected claim for {}: {}", card.identifier, err);
            return Err(err);
        }

        let called = session.called_set();
        let pattern = session.winning_pattern;
        let is_valid = win::evaluate(&card.numbers, &called, pattern);
        let completed_lines = match pattern {
            WinPattern::Standard => win::completed_lines(&card.numbers, &called),
            _ => Vec::new(),
        };

        let card = if is_valid {
            self.cards.record_win(card, at).await?
        } else {
            card
        };

        log::info!(
            "Claim for {} in session {}: {} ({} ball(s) called)",
            card.identifier,
            session_id,
            if is_valid { "winner" } else { "not a winner" },
            called.len()
        );

        Ok(WinClaim {
            is_valid,
            pattern,
            card,
            session_id,
            completed_lines,
            evaluated_at: at,
        })
    }
}
