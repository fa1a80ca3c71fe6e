use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use repsync_core::net::messages::{JoinNoticeMsg, RoomSyncMsg, WsMessage};
use repsync_core::net::{CLOSE_INVALID_SESSION, CLOSE_MISSING_PARAMS, MAX_MESSAGE_SIZE};
use repsync_core::player::Player;
use repsync_core::room::RoomStatus;

use crate::botfill;
use crate::registry::ConnId;
use crate::state::{AppState, ConnectionGuard};

/// Connection-establishment parameters, passed as query parameters on the
/// upgrade request.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    #[serde(rename = "roomCode")]
    room_code: Option<String>,
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Result<axum::response::Response, StatusCode> {
    let max_ws = state.config.limits.max_ws_connections;
    let current = state.ws_connection_count.load(Ordering::Relaxed);
    if current >= max_ws {
        tracing::warn!(current, max = max_ws, "WS connection limit reached");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, params))
        .into_response())
}

async fn handle_socket(socket: WebSocket, state: AppState, params: ConnectParams) {
    let _guard = ConnectionGuard::new(Arc::clone(&state.ws_connection_count));

    // Both parameters must be present before authentication runs.
    let (Some(room_code), Some(session_id)) = (params.room_code, params.session_id) else {
        refuse(socket, CLOSE_MISSING_PARAMS, "Missing parameters").await;
        return;
    };

    // Authenticate exactly once, at establishment. The token must map to
    // a player whose durable record claims this room.
    let player = {
        let store = state.store.read().await;
        store.get_player_by_session(&session_id)
    };
    let player = match player {
        Some(p) if p.room_code == room_code => p,
        _ => {
            tracing::info!(room = %room_code, "Refused connection with invalid session");
            refuse(socket, CLOSE_INVALID_SESSION, "Invalid session").await;
            return;
        },
    };

    let (tx, rx) = mpsc::channel::<Utf8Bytes>(state.config.limits.player_message_buffer);
    let conn_id = {
        let mut registry = state.registry.write().await;
        registry.admit(&room_code, tx)
    };

    let (ws_sender, mut ws_receiver) = socket.split();
    spawn_writer(ws_sender, rx);

    tracing::info!(player_id = player.id, room = %room_code, "Player connected");

    // Dual-path handshake: peers get a join notice, the new connection
    // gets the full snapshot directly. A plain broadcast here would race
    // with the connection's own registration.
    let notice = WsMessage::JoinNotice(JoinNoticeMsg {
        room_code: room_code.clone(),
        player_id: player.id,
    });
    if let Ok(encoded) = notice.encode() {
        let registry = state.registry.read().await;
        registry.broadcast_except(&room_code, conn_id, &Utf8Bytes::from(encoded));
    }
    if let Some(sync) = room_sync_frame(&state, &room_code).await {
        let registry = state.registry.read().await;
        registry.send_to(&room_code, conn_id, &sync);
    }

    read_loop(&mut ws_receiver, &state, &room_code, conn_id).await;

    // Connection gone — evict and let the registry collect an empty room.
    // The durable player record survives for reconnection with the same token.
    let destroyed = {
        let mut registry = state.registry.write().await;
        registry.evict(&room_code, conn_id)
    };
    tracing::info!(
        player_id = player.id,
        room = %room_code,
        room_destroyed = destroyed,
        "Player disconnected"
    );
}

/// Close a just-upgraded socket with a machine-readable code. There is no
/// separate error payload on the real-time channel.
async fn refuse(mut socket: WebSocket, code: u16, reason: &str) {
    let frame = CloseFrame {
        code,
        reason: Utf8Bytes::from(reason.to_string()),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!(error = %e, "Failed to send close frame");
    }
}

/// Build the full-room-sync frame: current durable room plus roster.
pub(crate) async fn room_sync_frame(state: &AppState, room_code: &str) -> Option<Utf8Bytes> {
    let (room, players): (_, Vec<Player>) = {
        let store = state.store.read().await;
        (store.get_room(room_code)?, store.get_room_players(room_code))
    };
    let msg = WsMessage::RoomSync(RoomSyncMsg { room, players });
    match msg.encode() {
        Ok(encoded) => Some(Utf8Bytes::from(encoded)),
        Err(e) => {
            tracing::warn!(room = room_code, error = %e, "Failed to encode room sync");
            None
        },
    }
}

fn spawn_writer(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Utf8Bytes>,
) {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });
}

/// Per-connection rate limiter (token bucket).
struct RateLimiter {
    tokens: f64,
    last_refill: tokio::time::Instant,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: tokio::time::Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// Returns true if the message is allowed; false if rate-limited.
    fn allow(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

async fn read_loop(
    ws_receiver: &mut futures::stream::SplitStream<WebSocket>,
    state: &AppState,
    room_code: &str,
    conn_id: ConnId,
) {
    let rate = state.config.limits.ws_rate_limit_per_sec;
    let mut rate_limiter = RateLimiter::new(rate, rate);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        if !rate_limiter.allow() {
            tracing::warn!(conn_id, room = room_code, "Rate limited");
            continue;
        }

        if text.len() > MAX_MESSAGE_SIZE {
            continue;
        }

        // Any inbound traffic is a chance to top up an under-populated lobby.
        botfill::maybe_schedule_fill(state, room_code).await;

        let parsed = match WsMessage::decode(text.as_str()) {
            Ok(m) => m,
            Err(e) => {
                // Unknown tags and malformed payloads are dropped, not fatal.
                tracing::debug!(conn_id, room = room_code, error = %e, "Dropped frame");
                continue;
            },
        };

        route_message(state, room_code, conn_id, parsed, text).await;
    }
}

/// Dispatch one parsed inbound message. `frame` is the original text, so
/// rebroadcasts reach peers byte-for-byte as sent.
async fn route_message(
    state: &AppState,
    room_code: &str,
    conn_id: ConnId,
    parsed: WsMessage,
    frame: Utf8Bytes,
) {
    match parsed {
        // Highest-frequency message: pure fan-out, no durable write. The
        // host connection is the authority over the payload shape.
        WsMessage::StateUpdate(_) | WsMessage::PlayCard(_) => {
            let registry = state.registry.read().await;
            registry.broadcast(room_code, &frame);
        },

        WsMessage::PlayerUpdate(update) => {
            let Some(player_id) = update.id else {
                tracing::debug!(conn_id, room = room_code, "Player update without id dropped");
                return;
            };
            // Persist first, then rebroadcast the same frame. A failed
            // write is logged and the broadcast still goes out; live and
            // durable state may diverge until the next full sync.
            let result = {
                let mut store = state.store.write().await;
                store.apply_player_update(player_id, &update)
            };
            if let Err(e) = result {
                tracing::warn!(
                    player_id, room = room_code, error = %e,
                    "Player update not persisted"
                );
            }
            let registry = state.registry.read().await;
            registry.broadcast(room_code, &frame);
        },

        WsMessage::StartGame {} => {
            apply_lifecycle(state, room_code, conn_id, RoomStatus::InGame, frame).await;
        },

        WsMessage::EndGame {} => {
            apply_lifecycle(state, room_code, conn_id, RoomStatus::Finished, frame).await;
        },

        // Server-to-client tags have no business arriving from a client.
        WsMessage::JoinNotice(_) | WsMessage::RoomSync(_) => {
            tracing::warn!(
                conn_id,
                room = room_code,
                "Ignored server-only message from client"
            );
        },
    }
}

/// Advance the room lifecycle: durable write first, broadcast second.
/// Invalid transitions (including anything after `finished`) are rejected
/// without a write or a broadcast.
async fn apply_lifecycle(
    state: &AppState,
    room_code: &str,
    conn_id: ConnId,
    to: RoomStatus,
    frame: Utf8Bytes,
) {
    let result = {
        let mut store = state.store.write().await;
        store.update_room_status(room_code, to)
    };
    match result {
        Ok(()) => {
            tracing::info!(conn_id, room = room_code, status = ?to, "Room lifecycle advanced");
            let mut registry = state.registry.write().await;
            if to != RoomStatus::Lobby {
                // A room that already started must not gain a bot later.
                registry.cancel_botfill(room_code);
            }
            registry.broadcast(room_code, &frame);
        },
        Err(e) => {
            tracing::warn!(
                conn_id, room = room_code, to = ?to, error = %e,
                "Rejected lifecycle transition"
            );
        },
    }
}
