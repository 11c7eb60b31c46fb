//! Session actor: the single writer for one session's state.

use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot},
    time::{MissedTickBehavior, interval},
};

use super::{
    broadcaster::{SessionBroadcaster, SessionEvent, SessionEventKind, SubscriberId, Subscription},
    config::SessionConfig,
    messages::{NumberCall, SessionMessage},
    models::{GameSession, SessionId, SessionStatus},
};
use crate::error::{BingoError, BingoResult};
use crate::store::SessionRepository;

/// Session actor handle for sending messages
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    session_id: SessionId,
}

impl SessionHandle {
    /// Create a new session handle
    pub fn new(sender: mpsc::Sender<SessionMessage>, session_id: SessionId) -> Self {
        Self { sender, session_id }
    }

    /// Get session ID
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the session
    pub async fn send(&self, message: SessionMessage) -> BingoResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| BingoError::SessionUnavailable(self.session_id))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionMessage,
    ) -> BingoResult<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await
            .map_err(|_| BingoError::SessionUnavailable(self.session_id))
    }

    pub async fn activate(&self) -> BingoResult<GameSession> {
        self.request(|response| SessionMessage::Activate { response })
            .await?
    }

    pub async fn call_next_number(&self) -> BingoResult<NumberCall> {
        self.request(|response| SessionMessage::CallNextNumber { response })
            .await?
    }

    pub async fn complete(&self) -> BingoResult<GameSession> {
        self.request(|response| SessionMessage::Complete { response })
            .await?
    }

    pub async fn snapshot(&self) -> BingoResult<GameSession> {
        self.request(|response| SessionMessage::GetSnapshot { response })
            .await
    }

    /// Register for events; the first event is always the current snapshot
    pub async fn subscribe(&self) -> BingoResult<Subscription> {
        self.request(|response| SessionMessage::Subscribe { response })
            .await
    }

    pub async fn unsubscribe(&self, subscriber_id: SubscriberId) -> BingoResult<()> {
        self.send(SessionMessage::Unsubscribe { subscriber_id })
            .await
    }

    /// Run a schedule check immediately
    pub async fn tick(&self) -> BingoResult<()> {
        self.send(SessionMessage::Tick).await
    }

    pub async fn shutdown(&self) -> BingoResult<()> {
        self.send(SessionMessage::Shutdown).await
    }
}

/// Actor owning a single game session.
///
/// Every mutation is applied to a copy, saved, and only then made visible
/// and broadcast. A failed save leaves the actor's state untouched.
pub struct SessionActor {
    /// Authoritative session state
    session: GameSession,

    /// Runtime configuration
    config: SessionConfig,

    /// Persistence collaborator
    store: Arc<dyn SessionRepository>,

    /// Message inbox
    inbox: mpsc::Receiver<SessionMessage>,

    /// Subscribers for state change events
    broadcaster: SessionBroadcaster,

    /// Draw source
    rng: StdRng,

    /// Is actor shutting down
    is_closed: bool,
}

impl SessionActor {
    /// Create a new session actor
    ///
    /// # Arguments
    ///
    /// * `session` - Session state as last persisted
    /// * `config` - Session configuration
    /// * `store` - Session repository used to persist each transition
    ///
    /// # Returns
    ///
    /// * `(SessionActor, SessionHandle)` - Actor and handle for sending messages
    pub fn new(
        session: GameSession,
        config: SessionConfig,
        store: Arc<dyn SessionRepository>,
    ) -> (Self, SessionHandle) {
        Self::with_rng(session, config, store, StdRng::from_rng(&mut rand::rng()))
    }

    /// Create a session actor drawing from a caller-supplied RNG
    pub fn with_rng(
        session: GameSession,
        config: SessionConfig,
        store: Arc<dyn SessionRepository>,
        rng: StdRng,
    ) -> (Self, SessionHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity.max(1));
        let session_id = session.id;
        let broadcaster = SessionBroadcaster::new(session_id, config.subscriber_buffer);

        let actor = Self {
            session,
            config,
            store,
            inbox,
            broadcaster,
            rng,
            is_closed: false,
        };

        (actor, SessionHandle::new(sender, session_id))
    }

    /// Run the session actor event loop
    pub async fn run(mut self) {
        log::info!(
            "Session {} '{}' starting ({})",
            self.session.id,
            self.session.title,
            self.session.status
        );

        let mut ticker = interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    let Some(message) = message else { break };
                    self.handle_message(message).await;

                    if self.is_closed {
                        break;
                    }
                }

                _ = ticker.tick() => self.tick().await,
            }
        }

        log::info!(
            "Session {} '{}' stopped",
            self.session.id,
            self.session.title
        );
    }

    /// Handle a session message
    async fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Activate { response } => {
                let result = self.handle_activate().await;
                let _ = response.send(result);
            }

            SessionMessage::CallNextNumber { response } => {
                let result = self.handle_call_next_number().await;
                let _ = response.send(result);
            }

            SessionMessage::Complete { response } => {
                let result = self.handle_complete().await;
                let _ = response.send(result);
            }

            SessionMessage::GetSnapshot { response } => {
                let _ = response.send(self.session.clone());
            }

            SessionMessage::Subscribe { response } => {
                let subscription = self.broadcaster.subscribe(&self.session);
                if let Err(subscription) = response.send(subscription) {
                    self.broadcaster.unsubscribe(subscription.id);
                }
            }

            SessionMessage::Unsubscribe { subscriber_id } => {
                self.broadcaster.unsubscribe(subscriber_id);
            }

            SessionMessage::Tick => self.tick().await,

            SessionMessage::Shutdown => {
                self.is_closed = true;
            }
        }
    }

    async fn handle_activate(&mut self) -> BingoResult<GameSession> {
        let mut next = self.session.clone();
        next.activate(Utc::now())?;
        self.commit(next, SessionEventKind::Activated).await?;

        log::info!("Session {} activated", self.session.id);
        Ok(self.session.clone())
    }

    async fn handle_call_next_number(&mut self) -> BingoResult<NumberCall> {
        let mut next = self.session.clone();
        let ball = match next.call_next_number(&mut self.rng) {
            Ok(ball) => ball,
            Err(err) => {
                log::debug!("Session {}: draw rejected: {}", self.session.id, err);
                return Err(err);
            }
        };
        self.commit(next, SessionEventKind::NumberCalled { ball })
            .await?;

        log::info!(
            "Session {} called {} ({} of 75)",
            self.session.id,
            ball,
            self.session.called_numbers.len()
        );
        Ok(NumberCall {
            ball,
            session: self.session.clone(),
        })
    }

    async fn handle_complete(&mut self) -> BingoResult<GameSession> {
        let mut next = self.session.clone();
        let was = next.status;
        next.complete(Utc::now())?;
        self.commit(next, SessionEventKind::Completed).await?;

        log::info!(
            "Session {} completed from {} after {} call(s)",
            self.session.id,
            was,
            self.session.called_numbers.len()
        );
        Ok(self.session.clone())
    }

    /// Persist `next`, then make it current and broadcast it
    async fn commit(&mut self, next: GameSession, kind: SessionEventKind) -> BingoResult<()> {
        if let Err(err) = self.store.save_session(&next).await {
            log::error!("Session {}: failed to persist transition: {}", self.session.id, err);
            return Err(match err {
                BingoError::StorageUnavailable(_) => err,
                other => BingoError::StorageUnavailable(other.to_string()),
            });
        }

        self.session = next;
        let delivered = self
            .broadcaster
            .publish(SessionEvent::new(kind, self.session.clone()));
        log::debug!(
            "Session {}: event delivered to {}/{} subscriber(s)",
            self.session.id,
            delivered,
            self.broadcaster.len()
        );
        Ok(())
    }

    /// Activate a scheduled session once its start time has passed
    async fn tick(&mut self) {
        if !self.config.auto_activate
            || self.session.status != SessionStatus::Scheduled
            || Utc::now() < self.session.scheduled_start
        {
            return;
        }

        match self.handle_activate().await {
            Ok(_) => log::info!("Session {} auto-activated at scheduled start", self.session.id),
            Err(err) => log::warn!("Session {}: auto-activation failed: {}", self.session.id, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NewSession;
    use crate::store::InMemoryStore;
    use crate::win::WinPattern;
    use async_trait::async_trait;
    use chrono::Duration;

    fn manual_config() -> SessionConfig {
        SessionConfig {
            auto_activate: false,
            ..Default::default()
        }
    }

    async fn spawn(config: SessionConfig, start_in: Duration) -> (SessionHandle, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let session = store
            .insert_session(NewSession::new(
                "Actor",
                Utc::now() + start_in,
                WinPattern::Standard,
            ))
            .await
            .unwrap();
        let (actor, handle) = SessionActor::with_rng(
            session,
            config,
            store.clone(),
            StdRng::seed_from_u64(11),
        );
        tokio::spawn(actor.run());
        (handle, store)
    }

    #[tokio::test]
    async fn test_call_persists_and_broadcasts() {
        let (handle, store) = spawn(manual_config(), Duration::hours(1)).await;
        let mut subscription = handle.subscribe().await.unwrap();
        assert_eq!(
            subscription.events.recv().await.unwrap().kind,
            SessionEventKind::Snapshot
        );

        handle.activate().await.unwrap();
        let call = handle.call_next_number().await.unwrap();

        let stored = store.load_session(handle.session_id()).await.unwrap().unwrap();
        assert_eq!(stored.called_numbers, vec![call.ball]);

        assert_eq!(
            subscription.events.recv().await.unwrap().kind,
            SessionEventKind::Activated
        );
        let event = subscription.events.recv().await.unwrap();
        assert_eq!(event.kind, SessionEventKind::NumberCalled { ball: call.ball });
        assert_eq!(event.session.called_numbers, vec![call.ball]);
    }

    #[tokio::test]
    async fn test_tick_auto_activates_due_session() {
        let config = SessionConfig {
            tick_interval_ms: 60_000,
            ..Default::default()
        };
        let (handle, _) = spawn(config, Duration::seconds(-1)).await;

        handle.tick().await.unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_tick_leaves_future_session_scheduled() {
        let (handle, _) = spawn(SessionConfig::default(), Duration::hours(2)).await;

        handle.tick().await.unwrap();
        assert_eq!(handle.snapshot().await.unwrap().status, SessionStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_shutdown_closes_handle() {
        let (handle, _) = spawn(manual_config(), Duration::hours(1)).await;
        handle.shutdown().await.unwrap();

        let err = handle.snapshot().await.unwrap_err();
        assert_eq!(err, BingoError::SessionUnavailable(handle.session_id()));
    }

    struct BrokenStore;

    #[async_trait]
    impl SessionRepository for BrokenStore {
        async fn insert_session(&self, _new: NewSession) -> BingoResult<GameSession> {
            Err(BingoError::StorageUnavailable("offline".into()))
        }

        async fn load_session(&self, _id: SessionId) -> BingoResult<Option<GameSession>> {
            Err(BingoError::StorageUnavailable("offline".into()))
        }

        async fn save_session(&self, _session: &GameSession) -> BingoResult<()> {
            Err(BingoError::StorageUnavailable("offline".into()))
        }

        async fn list_sessions(&self) -> BingoResult<Vec<GameSession>> {
            Err(BingoError::StorageUnavailable("offline".into()))
        }
    }

    #[tokio::test]
    async fn test_failed_save_commits_nothing() {
        let now = Utc::now();
        let mut session =
            GameSession::from_new(3, NewSession::new("Broken", now, WinPattern::Standard), now);
        session.activate(Utc::now()).unwrap();

        let (actor, handle) = SessionActor::new(session, manual_config(), Arc::new(BrokenStore));
        tokio::spawn(actor.run());
        let mut subscription = handle.subscribe().await.unwrap();
        subscription.events.recv().await.unwrap();

        let err = handle.call_next_number().await.unwrap_err();
        assert_eq!(err.kind(), "storage_unavailable");
        assert!(handle.snapshot().await.unwrap().called_numbers.is_empty());
        assert!(subscription.events.try_recv().is_err());
    }
}
