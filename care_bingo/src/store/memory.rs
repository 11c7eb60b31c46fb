//! In-process store backing both repositories.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::repository::{CardRepository, SessionRepository};
use crate::card::{BingoCard, CardDraft, CardId, CardMark};
use crate::error::{BingoError, BingoResult, LookupTarget};
use crate::session::{GameSession, NewSession, SessionId};

#[derive(Default)]
struct Sessions {
    next_id: SessionId,
    by_id: BTreeMap<SessionId, GameSession>,
}

#[derive(Default)]
struct Cards {
    next_id: CardId,
    by_id: BTreeMap<CardId, BingoCard>,
    by_identifier: HashMap<String, CardId>,
    by_code: HashMap<String, CardId>,
}

/// Process-wide store created at startup and dropped at shutdown
#[derive(Default)]
pub struct InMemoryStore {
    sessions: RwLock<Sessions>,
    cards: RwLock<Cards>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn insert_session(&self, new: NewSession) -> BingoResult<GameSession> {
        let mut sessions = self.sessions.write().await;
        sessions.next_id += 1;
        let session = GameSession::from_new(sessions.next_id, new, Utc::now());
        sessions.by_id.insert(session.id, session.clone());
        Ok(session)
    }

    async fn load_session(&self, id: SessionId) -> BingoResult<Option<GameSession>> {
        Ok(self.sessions.read().await.by_id.get(&id).cloned())
    }

    async fn save_session(&self, session: &GameSession) -> BingoResult<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.by_id.get_mut(&session.id) {
            Some(stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(BingoError::NotFound(LookupTarget::Session(session.id))),
        }
    }

    async fn list_sessions(&self) -> BingoResult<Vec<GameSession>> {
        Ok(self.sessions.read().await.by_id.values().cloned().collect())
    }
}

#[async_trait]
impl CardRepository for InMemoryStore {
    async fn create_if_unique(&self, draft: CardDraft) -> BingoResult<Option<BingoCard>> {
        let mut cards = self.cards.write().await;
        if cards.by_identifier.contains_key(&draft.identifier)
            || cards.by_code.contains_key(&draft.verification_code)
        {
            return Ok(None);
        }

        cards.next_id += 1;
        let card = BingoCard::from_draft(cards.next_id, draft, Utc::now());
        cards.by_identifier.insert(card.identifier.clone(), card.id);
        cards.by_code.insert(card.verification_code.clone(), card.id);
        cards.by_id.insert(card.id, card.clone());
        Ok(Some(card))
    }

    async fn load_card(&self, id: CardId) -> BingoResult<Option<BingoCard>> {
        Ok(self.cards.read().await.by_id.get(&id).cloned())
    }

    async fn mark_card(&self, id: CardId, mark: CardMark) -> BingoResult<Option<BingoCard>> {
        let mut cards = self.cards.write().await;
        Ok(cards.by_id.get_mut(&id).map(|stored| {
            mark.apply(stored);
            stored.clone()
        }))
    }

    async fn find_by_identifier(&self, identifier: &str) -> BingoResult<Option<BingoCard>> {
        let cards = self.cards.read().await;
        Ok(cards
            .by_identifier
            .get(identifier)
            .and_then(|id| cards.by_id.get(id))
            .cloned())
    }

    async fn find_by_verification_code(&self, code: &str) -> BingoResult<Option<BingoCard>> {
        let cards = self.cards.read().await;
        Ok(cards
            .by_code
            .get(code)
            .and_then(|id| cards.by_id.get(id))
            .cloned())
    }

    async fn list_cards(&self, session_id: Option<SessionId>) -> BingoResult<Vec<BingoCard>> {
        let cards = self.cards.read().await;
        Ok(cards
            .by_id
            .values()
            .filter(|card| session_id.is_none() || card.session_id == session_id)
            .cloned()
            .collect())
    }
}
