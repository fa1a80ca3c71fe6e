use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use repsync_core::player::Player;
use repsync_core::room::{GameSettings, Room, generate_room_code, is_valid_room_code};

use crate::error::AppError;
use crate::state::AppState;
use crate::store::{NewPlayer, NewRoom, PublicRoomSummary, Store};

/// Request body for creating a room.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomBody {
    pub settings: GameSettings,
    #[serde(default)]
    pub is_public: bool,
    pub host_name: String,
}

/// Response for a created room: the room, its roster, and the host's
/// session token for the WS handshake.
#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    #[serde(flatten)]
    pub room: Room,
    pub players: Vec<Player>,
    pub token: String,
}

/// Request body for joining a room.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomBody {
    pub code: String,
    pub player_name: String,
}

/// Response for a join: the room, the new player, and their token.
#[derive(Debug, Serialize)]
pub struct JoinRoomResponse {
    pub room: Room,
    pub player: Player,
    pub token: String,
}

/// A room with its roster, for reads.
#[derive(Debug, Serialize)]
pub struct RoomWithPlayers {
    #[serde(flatten)]
    pub room: Room,
    pub players: Vec<Player>,
}

fn validate_display_name(name: &str) -> Result<String, AppError> {
    let name = name.trim().to_string();
    if name.is_empty() || name.len() > 32 || name.chars().any(|c| c.is_control()) {
        return Err(AppError::BadRequest("Invalid player name".to_string()));
    }
    Ok(name)
}

/// Generate a room code, retrying on collision with existing rooms.
fn generate_unique_room_code(store: &Store) -> String {
    loop {
        let code = generate_room_code();
        if store.get_room(&code).is_none() {
            return code;
        }
    }
}

/// POST /api/rooms — create a room plus its host player.
pub async fn create_room(
    State(state): State<AppState>,
    Json(body): Json<CreateRoomBody>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), AppError> {
    let host_name = validate_display_name(&body.host_name)?;

    let mut store = state.store.write().await;
    let code = generate_unique_room_code(&store);
    let room = store.create_room(NewRoom {
        code: code.clone(),
        host_id: host_name.clone(),
        is_public: body.is_public,
        settings: body.settings,
    });

    let token = Uuid::new_v4().to_string();
    let host = store.add_player(NewPlayer {
        room_code: code.clone(),
        session_id: token.clone(),
        name: host_name,
        ready: true,
        is_host: true,
        is_bot: false,
    });
    drop(store);

    tracing::info!(room = %code, host_id = host.id, "Room created");

    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room,
            players: vec![host],
            token,
        }),
    ))
}

/// POST /api/rooms/join — add a player to an existing room and mint a
/// session token for them.
pub async fn join_room(
    State(state): State<AppState>,
    Json(body): Json<JoinRoomBody>,
) -> Result<Json<JoinRoomResponse>, AppError> {
    let player_name = validate_display_name(&body.player_name)?;
    if !is_valid_room_code(&body.code) {
        return Err(AppError::BadRequest("Invalid room code".to_string()));
    }

    let mut store = state.store.write().await;
    let Some(room) = store.get_room(&body.code) else {
        return Err(AppError::NotFound("Room not found".to_string()));
    };

    let token = Uuid::new_v4().to_string();
    let player = store.add_player(NewPlayer {
        room_code: room.code.clone(),
        session_id: token.clone(),
        name: player_name,
        ready: false,
        is_host: false,
        is_bot: false,
    });
    drop(store);

    tracing::info!(room = %room.code, player_id = player.id, "Player joined room");

    Ok(Json(JoinRoomResponse {
        room,
        player,
        token,
    }))
}

/// GET /api/rooms/{code} — the room and its current roster.
pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RoomWithPlayers>, AppError> {
    let store = state.store.read().await;
    let Some(room) = store.get_room(&code) else {
        return Err(AppError::NotFound("Room not found".to_string()));
    };
    let players = store.get_room_players(&code);
    Ok(Json(RoomWithPlayers { room, players }))
}

/// GET /api/rooms — public rooms still in the lobby.
pub async fn list_public_rooms(State(state): State<AppState>) -> Json<Vec<PublicRoomSummary>> {
    let store = state.store.read().await;
    Json(store.list_public_rooms())
}
