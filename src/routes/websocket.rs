use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::{
    auth::AuthenticatedPlayer,
    core::{BoardSize, ClaimOutcome, Connection, Outbound, Room, MAX_MESSAGE_BYTES},
    error::AppError,
    models::ClientMessage,
    state::AppState,
};

/// WebSocket endpoint for one board size
///
/// # Arguments
///
/// * `size` - Board size segment from the path, e.g. `16x16`
/// * `player` - Identity from the session cookie
/// * `ws` - WebSocket upgrade request
/// * `state` - Shared application state
///
/// # Flow
///
/// 1. Reject unauthenticated requests (extractor) and unknown sizes
/// 2. Reject plain HTTP requests, then accept the upgrade
/// 3. Join the room for that size, which greets the connection
/// 4. Pump the outbound queue to the socket and moves to the room
/// 5. Leave the room when either side stops
pub async fn websocket_handler(
    Path(size): Path<String>,
    player: AuthenticatedPlayer,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let size: BoardSize = size.parse().map_err(AppError::UnknownBoardSize)?;
    let ws = ws.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    tracing::debug!(
        "WebSocket connection attempt: board={} player={}",
        size,
        player.player_id
    );

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, size, player, state)))
}

/// Handle WebSocket connection
///
/// # Arguments
///
/// * `socket` - The WebSocket connection
/// * `size` - Board the player connected to
/// * `player` - Authenticated identity of this connection
/// * `state` - Shared application state
async fn handle_socket(
    socket: WebSocket,
    size: BoardSize,
    player: AuthenticatedPlayer,
    state: AppState,
) {
    let room = state.room_manager.write().await.room(size);

    let (tx, mut outbound) = mpsc::channel::<Outbound>(state.config.round.outbound_queue);
    let connection = Connection::new(tx);
    let connection_id = connection.id();
    let player_id = player.player_id.clone();

    let mut profile = player.profile();
    if profile.profile_image.is_empty() {
        profile.profile_image = state.config.default_avatar.clone();
    }

    room.join(profile, connection).await;
    tracing::info!(
        "WebSocket accepted: player={} board={} connection={}",
        player_id,
        size,
        connection_id
    );

    let (mut sender, mut receiver) = socket.split();

    // Queue -> socket. Ends when the room drops the sender (superseded or
    // evicted) or the socket stops accepting frames. Board entries are
    // read at write time, so only the newest board is copied into a frame.
    let player_id_clone = player_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(entry) = outbound.recv().await {
            let Some(text) = entry.into_text() else {
                continue;
            };
            if sender.send(Message::Text(text.to_string())).await.is_err() {
                tracing::debug!("Socket write failed for player={}", player_id_clone);
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    // Socket -> room
    let player_id_clone = player_id.clone();
    let room_clone = Arc::clone(&room);
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if text.len() > MAX_MESSAGE_BYTES {
                        tracing::warn!(
                            "Message too large from player={}: {} bytes",
                            player_id_clone,
                            text.len()
                        );
                        break;
                    }

                    if text == "ping" {
                        continue;
                    }

                    handle_text(&room_clone, &player_id_clone, &text).await;
                }
                Message::Close(_) => {
                    tracing::debug!("Close message from player={}", player_id_clone);
                    break;
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // Axum answers protocol pings itself
                }
                Message::Binary(_) => {
                    tracing::warn!("Unexpected binary message from player={}", player_id_clone);
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            tracing::debug!("Send task finished for player={}", player_id);
            recv_task.abort();
        }
        _ = &mut recv_task => {
            tracing::debug!("Receive task finished for player={}", player_id);
            send_task.abort();
        }
    }

    room.leave(&player_id, connection_id).await;

    tracing::info!(
        "WebSocket connection closed: player={} board={}",
        player_id,
        size
    );
}

/// Decode one text frame and apply it to the room
async fn handle_text(room: &Arc<Room>, player_id: &str, text: &str) {
    let Some(message) = ClientMessage::parse(text) else {
        tracing::debug!("Dropping unparseable frame from player={}", player_id);
        return;
    };

    match message {
        ClientMessage::Move(request) => match room.claim(player_id, &request).await {
            Ok(ClaimOutcome::Claimed) => {}
            Ok(ClaimOutcome::RoundEnded(outcome)) => {
                tracing::debug!(
                    "Player {} filled board {} (winning cell {})",
                    player_id,
                    room.size(),
                    outcome.winning_cell
                );
            }
            Err(err) => {
                tracing::debug!(
                    "Rejected move from player={} on board {}: {}",
                    player_id,
                    room.size(),
                    err
                );
            }
        },
    }
}
