//! WebSocket handler for live session updates.
//!
//! Lounge displays and operator consoles connect to `GET /ws`, join a
//! session, and from then on receive the full session snapshot after every
//! change. Operators can also draw numbers over the same connection.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. Client sends `join_session`; the current snapshot arrives immediately
//! 3. Every activation, call and completion pushes a `session_update`
//! 4. Joining another session drops the previous subscription
//! 5. On disconnect the subscription is removed from the session actor
//!
//! # Client Messages
//!
//! - `{"type": "join_session", "session_id": 1}`
//! - `{"type": "request_next_number"}`
//!
//! # Server Messages
//!
//! - `{"type": "session_update", "session": {...}}`
//! - `{"type": "number_called", "ball": 42}` (reply to `request_next_number`)
//! - `{"type": "error", "kind": "invalid_transition", "message": "..."}`
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws');
//! ws.onopen = () => ws.send(JSON.stringify({ type: "join_session", session_id: 1 }));
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   if (data.type === "session_update") renderBoard(data.session);
//! };
//! ```

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use care_bingo::{
    BingoError,
    card::Ball,
    session::{GameSession, SessionId, SubscriberId, Subscription},
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::{sync::mpsc, task::JoinHandle};

use super::AppState;
use crate::{logging, metrics};

/// Outbound queue per connection
const OUTBOUND_BUFFER: usize = 32;

static ACTIVE_CONNECTIONS: AtomicU64 = AtomicU64::new(0);

/// Client messages received via WebSocket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Follow a session, replacing any previous one
    JoinSession { session_id: SessionId },
    /// Draw the next ball in the joined session
    RequestNextNumber,
}

/// Messages sent to the client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    SessionUpdate { session: GameSession },
    NumberCalled { ball: Ball },
    Error { kind: String, message: String },
}

impl From<BingoError> for ServerMessage {
    fn from(err: BingoError) -> Self {
        ServerMessage::Error {
            kind: err.kind().to_string(),
            message: err.client_message(),
        }
    }
}

/// The session a connection currently follows
struct Joined {
    session_id: SessionId,
    subscriber_id: SubscriberId,
    forwarder: JoinHandle<()>,
}

/// Upgrade HTTP connection to WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER);

    let connections = ACTIVE_CONNECTIONS.fetch_add(1, Ordering::Relaxed) + 1;
    metrics::websocket_connections_active(connections);
    info!("WebSocket connected ({} open)", connections);

    let send_task = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            metrics::websocket_messages_sent();
        }
    });

    let mut joined: Option<Joined> = None;

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();

                let reply = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::JoinSession { session_id }) => {
                        match join_session(&state, session_id, &mut joined, &out_tx).await {
                            Ok(()) => None,
                            Err(err) => Some(err.into()),
                        }
                    }
                    Ok(ClientMessage::RequestNextNumber) => {
                        Some(request_next_number(&state, joined.as_ref()).await)
                    }
                    Err(e) => {
                        warn!("Failed to parse client message: {}", e);
                        Some(ServerMessage::Error {
                            kind: "invalid_argument".to_string(),
                            message: "Invalid message format".to_string(),
                        })
                    }
                };

                if let Some(reply) = reply
                    && out_tx.send(reply).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    if let Some(previous) = joined.take() {
        leave_session(&state, previous).await;
    }
    send_task.abort();

    let connections = ACTIVE_CONNECTIONS.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
    metrics::websocket_connections_active(connections);
    info!("WebSocket disconnected ({} open)", connections);
}

/// Subscribe to a session and start forwarding its events.
///
/// The actor queues the current snapshot first, so the client sees the
/// board straight away.
async fn join_session(
    state: &AppState,
    session_id: SessionId,
    joined: &mut Option<Joined>,
    out_tx: &mpsc::Sender<ServerMessage>,
) -> Result<(), BingoError> {
    let subscription = state.sessions.subscribe(session_id).await?;

    if let Some(previous) = joined.take() {
        leave_session(state, previous).await;
    }

    let subscriber_id = subscription.id;
    let forwarder = tokio::spawn(forward_events(subscription, out_tx.clone()));

    debug!("Subscriber {} joined session {}", subscriber_id, session_id);
    *joined = Some(Joined {
        session_id,
        subscriber_id,
        forwarder,
    });

    Ok(())
}

async fn forward_events(mut subscription: Subscription, out_tx: mpsc::Sender<ServerMessage>) {
    while let Some(event) = subscription.events.recv().await {
        let update = ServerMessage::SessionUpdate {
            session: event.session,
        };
        if out_tx.send(update).await.is_err() {
            break;
        }
    }
}

async fn leave_session(state: &AppState, joined: Joined) {
    joined.forwarder.abort();
    if let Err(e) = state
        .sessions
        .unsubscribe(joined.session_id, joined.subscriber_id)
        .await
    {
        debug!(
            "Unsubscribe from session {} skipped: {}",
            joined.session_id, e
        );
    }
}

async fn request_next_number(state: &AppState, joined: Option<&Joined>) -> ServerMessage {
    let Some(joined) = joined else {
        return ServerMessage::Error {
            kind: "invalid_argument".to_string(),
            message: "Join a session before calling numbers".to_string(),
        };
    };

    match state.sessions.call_next_number(joined.session_id).await {
        Ok(call) => {
            metrics::numbers_called_total();
            logging::log_operator_action(
                joined.session_id,
                "call_number",
                call.session.called_numbers.len(),
            );
            ServerMessage::NumberCalled { ball: call.ball }
        }
        Err(err) => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_bingo::LookupTarget;

    #[test]
    fn test_client_message_parsing() {
        let join: ClientMessage =
            serde_json::from_str(r#"{"type": "join_session", "session_id": 7}"#).unwrap();
        assert!(matches!(join, ClientMessage::JoinSession { session_id: 7 }));

        let call: ClientMessage = serde_json::from_str(r#"{"type": "request_next_number"}"#).unwrap();
        assert!(matches!(call, ClientMessage::RequestNextNumber));

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "fold"}"#).is_err());
    }

    #[test]
    fn test_error_message_shape() {
        let message: ServerMessage = BingoError::NotFound(LookupTarget::Session(9)).into();
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["type"], "error");
        assert_eq!(json["kind"], "not_found");
        assert!(json["message"].as_str().unwrap().contains('9'));
    }

    #[test]
    fn test_number_called_shape() {
        let message = ServerMessage::NumberCalled {
            ball: Ball::new(42).unwrap(),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "number_called", "ball": 42 }));
    }
}
