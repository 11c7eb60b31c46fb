//! Per-session fan-out of state changes to connected viewers.
//!
//! Delivery is best-effort and at most once: each subscriber owns a bounded
//! channel, a full channel misses the event, and a closed channel is dropped
//! from the subscriber list. Publishing never waits on a subscriber.

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::models::{GameSession, SessionId};
use crate::card::Ball;

/// Subscriber ID type
pub type SubscriberId = Uuid;

/// What caused a broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEventKind {
    /// Current state, sent once on registration
    Snapshot,
    Activated,
    NumberCalled { ball: Ball },
    Completed,
}

/// A state change with the full session snapshot after it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub session: GameSession,
}

impl SessionEvent {
    pub fn new(kind: SessionEventKind, session: GameSession) -> Self {
        Self { kind, session }
    }
}

/// A registered subscriber's end of the fan-out
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub session_id: SessionId,
    pub events: mpsc::Receiver<SessionEvent>,
}

/// Subscriber registry for one session
#[derive(Debug)]
pub struct SessionBroadcaster {
    session_id: SessionId,
    buffer: usize,
    subscribers: HashMap<SubscriberId, mpsc::Sender<SessionEvent>>,
}

impl SessionBroadcaster {
    /// Create a broadcaster whose subscribers each buffer `buffer` events
    pub fn new(session_id: SessionId, buffer: usize) -> Self {
        Self {
            session_id,
            buffer: buffer.max(1),
            subscribers: HashMap::new(),
        }
    }

    /// Register a subscriber. The current snapshot is queued before any
    /// later event.
    pub fn subscribe(&mut self, current: &GameSession) -> Subscription {
        let (sender, events) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();

        // Fresh channel with capacity >= 1, so this cannot fail.
        let _ = sender.try_send(SessionEvent::new(SessionEventKind::Snapshot, current.clone()));
        self.subscribers.insert(id, sender);

        log::debug!(
            "Session {}: subscriber {} joined ({} total)",
            self.session_id,
            id,
            self.subscribers.len()
        );

        Subscription {
            id,
            session_id: self.session_id,
            events,
        }
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        if removed {
            log::debug!("Session {}: subscriber {} left", self.session_id, id);
        }
        removed
    }

    /// Offer an event to every subscriber without blocking.
    ///
    /// Returns how many subscribers accepted it.
    pub fn publish(&mut self, event: SessionEvent) -> usize {
        let session_id = self.session_id;
        let mut delivered = 0;

        self.subscribers.retain(|id, sender| match sender.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!(
                    "Session {}: subscriber {} channel full, dropping event",
                    session_id,
                    id
                );
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("Session {}: subscriber {} disconnected, removing", session_id, id);
                false
            }
        });

        delivered
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NewSession;
    use crate::win::WinPattern;
    use chrono::Utc;

    fn session() -> GameSession {
        let now = Utc::now();
        GameSession::from_new(5, NewSession::new("Fan-out", now, WinPattern::Standard), now)
    }

    #[tokio::test]
    async fn test_subscribe_receives_snapshot_first() {
        let mut broadcaster = SessionBroadcaster::new(5, 4);
        let mut subscription = broadcaster.subscribe(&session());

        let event = subscription.events.recv().await.unwrap();
        assert_eq!(event.kind, SessionEventKind::Snapshot);
        assert_eq!(event.session.id, 5);
        assert_eq!(subscription.session_id, 5);
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let mut broadcaster = SessionBroadcaster::new(5, 4);
        let mut a = broadcaster.subscribe(&session());
        let mut b = broadcaster.subscribe(&session());

        let delivered = broadcaster.publish(SessionEvent::new(SessionEventKind::Completed, session()));
        assert_eq!(delivered, 2);

        for subscription in [&mut a, &mut b] {
            assert_eq!(subscription.events.recv().await.unwrap().kind, SessionEventKind::Snapshot);
            assert_eq!(subscription.events.recv().await.unwrap().kind, SessionEventKind::Completed);
        }
    }

    #[tokio::test]
    async fn test_closed_subscriber_is_dropped() {
        let mut broadcaster = SessionBroadcaster::new(5, 4);
        let gone = broadcaster.subscribe(&session());
        let _kept = broadcaster.subscribe(&session());
        drop(gone);

        let delivered = broadcaster.publish(SessionEvent::new(SessionEventKind::Activated, session()));
        assert_eq!(delivered, 1);
        assert_eq!(broadcaster.len(), 1);
    }

    #[tokio::test]
    async fn test_full_subscriber_misses_event_but_stays() {
        let mut broadcaster = SessionBroadcaster::new(5, 1);
        let mut slow = broadcaster.subscribe(&session());

        // Buffer already holds the snapshot.
        let delivered = broadcaster.publish(SessionEvent::new(SessionEventKind::Activated, session()));
        assert_eq!(delivered, 0);
        assert_eq!(broadcaster.len(), 1);

        assert_eq!(slow.events.recv().await.unwrap().kind, SessionEventKind::Snapshot);
        broadcaster.publish(SessionEvent::new(SessionEventKind::Completed, session()));
        assert_eq!(slow.events.recv().await.unwrap().kind, SessionEventKind::Completed);
    }

    #[test]
    fn test_unsubscribe() {
        let mut broadcaster = SessionBroadcaster::new(5, 4);
        let subscription = broadcaster.subscribe(&session());
        assert!(broadcaster.unsubscribe(subscription.id));
        assert!(!broadcaster.unsubscribe(subscription.id));
        assert!(broadcaster.is_empty());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let ball = Ball::new(7).unwrap();
        let event = SessionEvent::new(SessionEventKind::NumberCalled { ball }, session());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["type"], "number_called");
        assert_eq!(json["kind"]["ball"], 7);
        assert_eq!(json["session"]["id"], 5);
    }
}
