//! Session manager for spawning and routing to session actors.

use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::{
    actor::{SessionActor, SessionHandle},
    broadcaster::{SubscriberId, Subscription},
    config::SessionConfig,
    messages::NumberCall,
    models::{GameSession, NewSession, SessionId, SessionStatus},
};
use crate::error::{BingoError, BingoResult, LookupTarget};
use crate::store::SessionRepository;
use crate::win::WinPattern;

/// Longest accepted session title
pub const MAX_TITLE_LEN: usize = 120;

/// Session manager owning one actor per known session
pub struct SessionManager {
    /// Session repository
    store: Arc<dyn SessionRepository>,

    /// Shared actor configuration
    config: SessionConfig,

    /// Running session actors
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
}

impl SessionManager {
    /// Create a new session manager
    ///
    /// # Arguments
    ///
    /// * `store` - Session repository
    /// * `config` - Configuration handed to every actor
    pub fn new(store: Arc<dyn SessionRepository>, config: SessionConfig) -> Self {
        Self {
            store,
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Spawn actors for every session already in the store
    ///
    /// # Returns
    ///
    /// * `BingoResult<usize>` - Number of actors spawned
    pub async fn load_existing(&self) -> BingoResult<usize> {
        let stored = self.store.list_sessions().await?;
        let mut sessions = self.sessions.write().await;
        let mut loaded = 0;

        for session in stored {
            if sessions.contains_key(&session.id) {
                continue;
            }
            let handle = self.spawn(session);
            sessions.insert(handle.session_id(), handle);
            loaded += 1;
        }

        log::info!("Loaded {} existing session(s)", loaded);
        Ok(loaded)
    }

    fn spawn(&self, session: GameSession) -> SessionHandle {
        let (actor, handle) = SessionActor::new(session, self.config.clone(), self.store.clone());
        tokio::spawn(actor.run());
        handle
    }

    /// Schedule a new session and start its actor
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - Empty or overlong title
    /// * `StorageUnavailable` - Store failure
    pub async fn create_session(
        &self,
        title: &str,
        scheduled_start: DateTime<Utc>,
        winning_pattern: WinPattern,
    ) -> BingoResult<GameSession> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BingoError::invalid_argument("session title must not be empty"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(BingoError::invalid_argument(format!(
                "session title must be at most {MAX_TITLE_LEN} characters"
            )));
        }

        let session = self
            .store
            .insert_session(NewSession::new(title, scheduled_start, winning_pattern))
            .await?;

        let handle = self.spawn(session.clone());
        self.sessions.write().await.insert(session.id, handle);

        log::info!(
            "Created session {} '{}' starting {} ({})",
            session.id,
            session.title,
            session.scheduled_start,
            session.winning_pattern
        );
        Ok(session)
    }

    /// Get the actor handle for a session
    pub async fn get_handle(&self, id: SessionId) -> BingoResult<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(BingoError::NotFound(LookupTarget::Session(id)))
    }

    pub async fn activate(&self, id: SessionId) -> BingoResult<GameSession> {
        self.get_handle(id).await?.activate().await
    }

    /// Draw the next ball for a session. Concurrent callers are serialized by
    /// the session's actor.
    pub async fn call_next_number(&self, id: SessionId) -> BingoResult<NumberCall> {
        self.get_handle(id).await?.call_next_number().await
    }

    pub async fn complete(&self, id: SessionId) -> BingoResult<GameSession> {
        self.get_handle(id).await?.complete().await
    }

    pub async fn get_snapshot(&self, id: SessionId) -> BingoResult<GameSession> {
        self.get_handle(id).await?.snapshot().await
    }

    pub async fn subscribe(&self, id: SessionId) -> BingoResult<Subscription> {
        self.get_handle(id).await?.subscribe().await
    }

    pub async fn unsubscribe(&self, id: SessionId, subscriber_id: SubscriberId) -> BingoResult<()> {
        self.get_handle(id).await?.unsubscribe(subscriber_id).await
    }

    /// All sessions, latest scheduled start first
    pub async fn list_sessions(&self) -> BingoResult<Vec<GameSession>> {
        let handles: Vec<SessionHandle> = self.sessions.read().await.values().cloned().collect();

        let mut sessions = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.snapshot().await {
                Ok(session) => sessions.push(session),
                Err(err) => log::warn!("Skipping session {}: {}", handle.session_id(), err),
            }
        }

        sessions.sort_by(|a, b| {
            b.scheduled_start
                .cmp(&a.scheduled_start)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(sessions)
    }

    /// Earliest scheduled session that has not reached its start time
    pub async fn next_scheduled(&self, now: DateTime<Utc>) -> BingoResult<Option<GameSession>> {
        Ok(self
            .list_sessions()
            .await?
            .into_iter()
            .filter(|s| s.status == SessionStatus::Scheduled && s.scheduled_start > now)
            .min_by_key(|s| (s.scheduled_start, s.id)))
    }

    /// The live session, if any. With several live, the most recently started wins.
    pub async fn active_session(&self) -> BingoResult<Option<GameSession>> {
        Ok(self
            .list_sessions()
            .await?
            .into_iter()
            .find(|s| s.status == SessionStatus::Active))
    }

    /// Number of running session actors
    pub async fn session_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|handle| !handle.is_closed())
            .count()
    }

    /// Stop every session actor
    pub async fn shutdown(&self) {
        let handles: Vec<SessionHandle> = self.sessions.write().await.drain().map(|(_, h)| h).collect();
        for handle in &handles {
            let _ = handle.shutdown().await;
        }
        log::info!("Stopped {} session actor(s)", handles.len());
    }
}
