//! Card manager: generation against the card store, status flags and lookups.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::{
    generator::CardGenerator,
    models::{BingoCard, CardDraft, CardId, CardMark, OwnerId},
};
use crate::error::{BingoError, BingoResult, LookupTarget};
use crate::session::SessionId;
use crate::store::{CardRepository, SessionRepository};

/// How many fresh identifiers a single card may try before giving up
pub const MAX_ALLOCATION_ATTEMPTS: usize = 16;

/// Card manager coordinating the generator with the card store
pub struct CardManager {
    cards: Arc<dyn CardRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl CardManager {
    /// Create a new card manager
    ///
    /// # Arguments
    ///
    /// * `cards` - Card store
    /// * `sessions` - Session store, used to check that bound sessions exist
    pub fn new(cards: Arc<dyn CardRepository>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { cards, sessions }
    }

    /// Generate and store a batch of cards
    ///
    /// # Arguments
    ///
    /// * `count` - Number of cards, 1..=100
    /// * `session_id` - Session the cards are issued for, if any
    /// * `owner_id` - Requesting user or facility, if any
    ///
    /// # Returns
    ///
    /// * `BingoResult<Vec<BingoCard>>` - Exactly `count` stored cards
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `count` out of range
    /// * `NotFound` - `session_id` does not name a session
    /// * `StorageUnavailable` - Store failure, or no unique identifier could be allocated
    pub async fn generate_cards(
        &self,
        count: usize,
        session_id: Option<SessionId>,
        owner_id: Option<OwnerId>,
    ) -> BingoResult<Vec<BingoCard>> {
        let drafts = CardGenerator::new().generate(count, session_id, owner_id)?;

        if let Some(id) = session_id
            && self.sessions.load_session(id).await?.is_none()
        {
            return Err(BingoError::NotFound(LookupTarget::Session(id)));
        }

        let mut cards = Vec::with_capacity(drafts.len());
        for draft in drafts {
            cards.push(self.store_unique(draft).await?);
        }

        log::info!(
            "Generated {} card(s) for session {:?}, owner {:?}",
            cards.len(),
            session_id,
            owner_id
        );

        Ok(cards)
    }

    /// Insert a draft, redrawing its identifier and code until the store accepts it
    async fn store_unique(&self, mut draft: CardDraft) -> BingoResult<BingoCard> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            if let Some(card) = self.cards.create_if_unique(draft.clone()).await? {
                return Ok(card);
            }

            log::debug!(
                "Card identity {} / {} already taken (attempt {})",
                draft.identifier,
                draft.verification_code,
                attempt
            );
            CardGenerator::new().redraw_identity(&mut draft);
        }

        Err(BingoError::StorageUnavailable(format!(
            "no unique card identifier after {MAX_ALLOCATION_ATTEMPTS} attempts"
        )))
    }

    /// Mark cards as printed. Unknown IDs are skipped.
    pub async fn mark_printed(&self, card_ids: &[CardId]) -> BingoResult<Vec<BingoCard>> {
        self.update_flags(card_ids, CardMark::Printed).await
    }

    /// Mark cards as ordered. Unknown IDs are skipped.
    pub async fn mark_ordered(&self, card_ids: &[CardId]) -> BingoResult<Vec<BingoCard>> {
        self.update_flags(card_ids, CardMark::Ordered).await
    }

    async fn update_flags(
        &self,
        card_ids: &[CardId],
        mark: CardMark,
    ) -> BingoResult<Vec<BingoCard>> {
        let mut updated = Vec::with_capacity(card_ids.len());

        for &id in card_ids {
            match self.cards.mark_card(id, mark).await? {
                Some(card) => updated.push(card),
                None => log::debug!("Skipping unknown card {}", id),
            }
        }

        Ok(updated)
    }

    /// Record a verified win on a card. The first win timestamp is kept.
    ///
    /// Only the winner flag is written; the returned card reflects every
    /// flag as stored, not the possibly older copy passed in.
    pub async fn record_win(&self, card: BingoCard, at: DateTime<Utc>) -> BingoResult<BingoCard> {
        let stored = self
            .cards
            .mark_card(card.id, CardMark::Winner(at))
            .await?
            .ok_or(BingoError::NotFound(LookupTarget::Card(card.id)))?;

        if !card.is_winner && stored.win_claimed_at == Some(at) {
            log::info!("Card {} recorded as winner", stored.identifier);
        }
        Ok(stored)
    }

    pub async fn get_card(&self, id: CardId) -> BingoResult<BingoCard> {
        self.cards
            .load_card(id)
            .await?
            .ok_or(BingoError::NotFound(LookupTarget::Card(id)))
    }

    pub async fn find_by_identifier(&self, identifier: &str) -> BingoResult<BingoCard> {
        let identifier = identifier.trim();
        self.cards
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| BingoError::NotFound(LookupTarget::Identifier(identifier.to_string())))
    }

    pub async fn find_by_verification_code(&self, code: &str) -> BingoResult<BingoCard> {
        let code = code.trim();
        self.cards
            .find_by_verification_code(code)
            .await?
            .ok_or_else(|| BingoError::NotFound(LookupTarget::VerificationCode(code.to_string())))
    }

    /// List cards, optionally only those issued for one session
    pub async fn list_cards(&self, session_id: Option<SessionId>) -> BingoResult<Vec<BingoCard>> {
        self.cards.list_cards(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NewSession;
    use crate::store::InMemoryStore;
    use crate::win::WinPattern;

    fn manager() -> (CardManager, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (CardManager::new(store.clone(), store.clone()), store)
    }

    #[tokio::test]
    async fn test_generate_cards_stores_every_card() {
        let (manager, _) = manager();
        let cards = manager.generate_cards(25, None, Some(1)).await.unwrap();

        assert_eq!(cards.len(), 25);
        assert_eq!(manager.list_cards(None).await.unwrap().len(), 25);
        assert!(cards.iter().all(|c| !c.is_printed && !c.is_winner));
    }

    #[tokio::test]
    async fn test_generate_cards_for_unknown_session() {
        let (manager, _) = manager();
        let err = manager.generate_cards(1, Some(42), None).await.unwrap_err();
        assert_eq!(err, BingoError::NotFound(LookupTarget::Session(42)));
    }

    #[tokio::test]
    async fn test_generate_cards_bound_to_session() {
        let (manager, store) = manager();
        let session = store
            .insert_session(NewSession::new("Afternoon", Utc::now(), WinPattern::Standard))
            .await
            .unwrap();

        manager.generate_cards(3, Some(session.id), None).await.unwrap();
        manager.generate_cards(2, None, None).await.unwrap();

        assert_eq!(manager.list_cards(Some(session.id)).await.unwrap().len(), 3);
        assert_eq!(manager.list_cards(None).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_mark_printed_skips_unknown_ids() {
        let (manager, _) = manager();
        let cards = manager.generate_cards(2, None, None).await.unwrap();

        let printed = manager.mark_printed(&[cards[0].id, 9_999]).await.unwrap();
        assert_eq!(printed.len(), 1);
        assert!(printed[0].is_printed && printed[0].is_issued);

        let reloaded = manager.get_card(cards[0].id).await.unwrap();
        assert!(reloaded.is_printed);
        assert!(!manager.get_card(cards[1].id).await.unwrap().is_printed);
    }

    #[tokio::test]
    async fn test_lookup_by_identifier_and_code() {
        let (manager, _) = manager();
        let card = manager.generate_cards(1, None, None).await.unwrap().remove(0);

        let by_identifier = manager.find_by_identifier(&card.identifier).await.unwrap();
        let by_code = manager
            .find_by_verification_code(&format!(" {} ", card.verification_code))
            .await
            .unwrap();
        assert_eq!(by_identifier.id, card.id);
        assert_eq!(by_code.id, card.id);

        let err = manager.find_by_identifier("GBL-0000000").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_record_win_on_stale_copy_keeps_other_flags() {
        let (manager, _) = manager();
        let card = manager.generate_cards(1, None, None).await.unwrap().remove(0);

        manager.mark_printed(&[card.id]).await.unwrap();
        let winner = manager.record_win(card.clone(), Utc::now()).await.unwrap();

        assert!(winner.is_winner);
        assert!(winner.is_printed);
        assert!(winner.is_issued);
        assert_eq!(manager.get_card(card.id).await.unwrap(), winner);
    }

    #[tokio::test]
    async fn test_record_win_on_unknown_card() {
        let (manager, _) = manager();
        let card = manager.generate_cards(1, None, None).await.unwrap().remove(0);
        let mut ghost = card.clone();
        ghost.id = 999;

        let err = manager.record_win(ghost, Utc::now()).await.unwrap_err();
        assert_eq!(err, BingoError::NotFound(LookupTarget::Card(999)));
    }

    #[tokio::test]
    async fn test_record_win_keeps_first_timestamp() {
        let (manager, _) = manager();
        let card = manager.generate_cards(1, None, None).await.unwrap().remove(0);

        let first = Utc::now();
        let winner = manager.record_win(card, first).await.unwrap();
        let again = manager
            .record_win(winner, first + chrono::Duration::minutes(1))
            .await
            .unwrap();

        assert_eq!(again.win_claimed_at, Some(first));
        assert_eq!(
            manager.get_card(again.id).await.unwrap().win_claimed_at,
            Some(first)
        );
    }
}
