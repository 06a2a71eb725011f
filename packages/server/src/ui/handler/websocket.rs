//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, DisplayName, ErrorKind, MediaSource, PlaybackIntent, RoomId, SignalKind,
        SignalPayload, UserId, ValueObjectError,
    },
    infrastructure::dto::websocket::ClientMessage,
    ui::state::AppState,
};

/// An intent the server refused, reported back as `errorSignal`
struct Rejection {
    kind: ErrorKind,
    message: String,
}

impl Rejection {
    fn new(kind: ErrorKind, message: impl ToString) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

impl From<ValueObjectError> for Rejection {
    fn from(e: ValueObjectError) -> Self {
        Rejection::new(ErrorKind::InvalidInput, e)
    }
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// The task ends when the channel is closed, which happens when the connection is
/// unregistered from the pusher (kick, replaced session).
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive messages
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state.connect_participant_usecase.execute(tx).await;

    let state_clone = state.clone();
    let connection_id_clone = connection_id.clone();

    // Spawn a task to receive intents from this connection
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!(
                        "WebSocket error on '{}': {}",
                        connection_id_clone.as_str(),
                        e
                    );
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!(
                        "Received from '{}': {}",
                        connection_id_clone.as_str(),
                        text.as_str()
                    );
                    handle_text(&state_clone, &connection_id_clone, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!(
                        "Connection '{}' requested close",
                        connection_id_clone.as_str()
                    );
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push server events to this connection
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let outcome = state
        .disconnect_participant_usecase
        .execute(&connection_id)
        .await;
    tracing::info!(
        "Connection '{}' closed: {:?}",
        connection_id.as_str(),
        outcome
    );
}

/// Parse one text frame and run it; refusals go back to the sender only
async fn handle_text(state: &AppState, connection_id: &ConnectionId, text: &str) {
    let result = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => dispatch(state, connection_id, message).await,
        Err(e) => {
            tracing::warn!("Failed to parse message as JSON: {}", e);
            Err(Rejection::new(
                ErrorKind::InvalidInput,
                format!("malformed message: {}", e),
            ))
        }
    };

    if let Err(rejection) = result {
        tracing::debug!(
            "Rejected intent from '{}': {} ({})",
            connection_id.as_str(),
            rejection.message,
            rejection.kind.as_code()
        );
        state
            .connect_participant_usecase
            .notify_error(connection_id, rejection.kind, rejection.message)
            .await;
    }
}

/// Route a parsed intent to its use case
async fn dispatch(
    state: &AppState,
    connection_id: &ConnectionId,
    message: ClientMessage,
) -> Result<(), Rejection> {
    match message {
        ClientMessage::Join {
            room_id,
            user_id,
            display_name,
        } => {
            state
                .join_room_usecase
                .execute(
                    connection_id.clone(),
                    RoomId::try_from(room_id)?,
                    UserId::try_from(user_id)?,
                    DisplayName::try_from(display_name)?,
                )
                .await
                .map_err(|e| Rejection::new(e.kind(), e))?;
        }
        ClientMessage::Play { room_id } => {
            control(state, connection_id, room_id, PlaybackIntent::Play).await?;
        }
        ClientMessage::Pause {
            room_id,
            position_seconds,
        } => {
            let intent = PlaybackIntent::Pause { position_seconds };
            control(state, connection_id, room_id, intent).await?;
        }
        ClientMessage::Seek {
            room_id,
            position_seconds,
        } => {
            let intent = PlaybackIntent::Seek { position_seconds };
            control(state, connection_id, room_id, intent).await?;
        }
        ClientMessage::ChangeSource { room_id, url, kind } => {
            let intent = PlaybackIntent::ChangeSource(MediaSource::new(url, kind.into()));
            control(state, connection_id, room_id, intent).await?;
        }
        ClientMessage::RequestSync { room_id } => {
            state
                .control_playback_usecase
                .request_sync(connection_id, &RoomId::try_from(room_id)?)
                .await
                .map_err(|e| Rejection::new(e.kind(), e))?;
        }
        ClientMessage::Chat {
            room_id,
            text,
            client_message_id,
            image_ref,
        } => {
            state
                .send_chat_usecase
                .execute(
                    connection_id,
                    &RoomId::try_from(room_id)?,
                    text,
                    client_message_id,
                    image_ref,
                )
                .await
                .map_err(|e| Rejection::new(e.kind(), e))?;
        }
        ClientMessage::Offer {
            room_id,
            payload,
            target_user_id,
        } => {
            relay(state, connection_id, SignalKind::Offer, room_id, payload, target_user_id)
                .await?;
        }
        ClientMessage::Answer {
            room_id,
            payload,
            target_user_id,
        } => {
            relay(state, connection_id, SignalKind::Answer, room_id, payload, target_user_id)
                .await?;
        }
        ClientMessage::IceCandidate {
            room_id,
            payload,
            target_user_id,
        } => {
            relay(
                state,
                connection_id,
                SignalKind::IceCandidate,
                room_id,
                payload,
                target_user_id,
            )
            .await?;
        }
        ClientMessage::Kick { room_id, user_id } => {
            state
                .kick_participant_usecase
                .execute(
                    connection_id,
                    &RoomId::try_from(room_id)?,
                    UserId::try_from(user_id)?,
                )
                .await
                .map_err(|e| Rejection::new(e.kind(), e))?;
        }
        ClientMessage::SetMuted { room_id, muted } => {
            state
                .set_muted_usecase
                .execute(connection_id, &RoomId::try_from(room_id)?, muted)
                .await
                .map_err(|e| Rejection::new(e.kind(), e))?;
        }
    }
    Ok(())
}

async fn control(
    state: &AppState,
    connection_id: &ConnectionId,
    room_id: String,
    intent: PlaybackIntent,
) -> Result<(), Rejection> {
    state
        .control_playback_usecase
        .execute(connection_id, &RoomId::try_from(room_id)?, intent)
        .await
        .map(|_| ())
        .map_err(|e| Rejection::new(e.kind(), e))
}

async fn relay(
    state: &AppState,
    connection_id: &ConnectionId,
    kind: SignalKind,
    room_id: String,
    payload: serde_json::Value,
    target_user_id: Option<String>,
) -> Result<(), Rejection> {
    let target = target_user_id.map(UserId::try_from).transpose()?;
    let delivered = state
        .relay_signal_usecase
        .execute(
            connection_id,
            &RoomId::try_from(room_id)?,
            kind,
            SignalPayload::new(payload),
            target,
        )
        .await
        .map_err(|e| Rejection::new(e.kind(), e))?;
    tracing::debug!("Relayed {} to {} connection(s)", kind.as_str(), delivered);
    Ok(())
}
