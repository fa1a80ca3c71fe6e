use std::collections::HashMap;

use serde::Serialize;

use repsync_core::net::messages::PlayerUpdateMsg;
use repsync_core::player::{Player, PlayerId, PlayerStatus};
use repsync_core::room::{GameSettings, Room, RoomStatus};
use repsync_core::time::timestamp_now;

/// The durable record boundary. Single-row reads and writes only — no
/// multi-step transactions, so concurrent writers to the same record are
/// last-write-wins. Held behind `Arc<RwLock<_>>` in [`crate::state::AppState`].
#[derive(Default)]
pub struct Store {
    rooms: HashMap<String, Room>,
    players: HashMap<PlayerId, Player>,
    /// session token → player id
    sessions: HashMap<String, PlayerId>,
    next_room_id: i64,
    next_player_id: PlayerId,
}

/// Insert spec for a room.
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub code: String,
    pub host_id: String,
    pub is_public: bool,
    pub settings: GameSettings,
}

/// Insert spec for a player.
#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub room_code: String,
    pub session_id: String,
    pub name: String,
    pub ready: bool,
    pub is_host: bool,
    pub is_bot: bool,
}

#[derive(Debug)]
pub enum StoreError {
    RoomNotFound(String),
    PlayerNotFound(PlayerId),
    InvalidTransition { from: RoomStatus, to: RoomStatus },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomNotFound(code) => write!(f, "room {code} not found"),
            Self::PlayerNotFound(id) => write!(f, "player {id} not found"),
            Self::InvalidTransition { from, to } => {
                write!(f, "invalid status transition: {from:?} -> {to:?}")
            },
        }
    }
}

impl std::error::Error for StoreError {}

/// A public-lobby listing entry: the room plus its current headcount.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRoomSummary {
    #[serde(flatten)]
    pub room: Room,
    pub player_count: usize,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_room_id(&mut self) -> i64 {
        self.next_room_id += 1;
        self.next_room_id
    }

    fn alloc_player_id(&mut self) -> PlayerId {
        self.next_player_id += 1;
        self.next_player_id
    }

    /// Insert a new room in the lobby state.
    pub fn create_room(&mut self, spec: NewRoom) -> Room {
        let room = Room {
            id: self.alloc_room_id(),
            code: spec.code.clone(),
            host_id: spec.host_id,
            status: RoomStatus::Lobby,
            is_public: spec.is_public,
            settings: spec.settings,
            game_state: None,
            created_at: timestamp_now(),
        };
        self.rooms.insert(spec.code, room.clone());
        room
    }

    pub fn get_room(&self, code: &str) -> Option<Room> {
        self.rooms.get(code).cloned()
    }

    /// Public rooms still in the lobby, with their player counts.
    pub fn list_public_rooms(&self) -> Vec<PublicRoomSummary> {
        self.rooms
            .values()
            .filter(|r| r.is_public && r.status == RoomStatus::Lobby)
            .map(|r| PublicRoomSummary {
                room: r.clone(),
                player_count: self.room_player_count(&r.code),
            })
            .collect()
    }

    /// Advance the room lifecycle. Rejects anything but the monotonic
    /// lobby → in-game → finished transitions; finished is terminal.
    pub fn update_room_status(&mut self, code: &str, status: RoomStatus) -> Result<(), StoreError> {
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::RoomNotFound(code.to_string()))?;
        if !room.status.can_transition(status) {
            return Err(StoreError::InvalidTransition {
                from: room.status,
                to: status,
            });
        }
        room.status = status;
        Ok(())
    }

    pub fn add_player(&mut self, spec: NewPlayer) -> Player {
        let player = Player {
            id: self.alloc_player_id(),
            room_code: spec.room_code,
            session_id: spec.session_id.clone(),
            name: spec.name,
            score: 0,
            ready: spec.ready,
            is_host: spec.is_host,
            is_bot: spec.is_bot,
            status: PlayerStatus::Idle,
        };
        self.sessions.insert(spec.session_id, player.id);
        self.players.insert(player.id, player.clone());
        player
    }

    pub fn get_player(&self, id: PlayerId) -> Option<Player> {
        self.players.get(&id).cloned()
    }

    pub fn get_player_by_session(&self, token: &str) -> Option<Player> {
        self.sessions
            .get(token)
            .and_then(|id| self.players.get(id))
            .cloned()
    }

    /// Players of a room, ordered by durable id for stable rosters.
    pub fn get_room_players(&self, code: &str) -> Vec<Player> {
        let mut players: Vec<Player> = self
            .players
            .values()
            .filter(|p| p.room_code == code)
            .cloned()
            .collect();
        players.sort_by_key(|p| p.id);
        players
    }

    pub fn room_player_count(&self, code: &str) -> usize {
        self.players.values().filter(|p| p.room_code == code).count()
    }

    /// Apply a partial update to one player record and return the result.
    pub fn apply_player_update(
        &mut self,
        id: PlayerId,
        update: &PlayerUpdateMsg,
    ) -> Result<Player, StoreError> {
        let player = self
            .players
            .get_mut(&id)
            .ok_or(StoreError::PlayerNotFound(id))?;
        if let Some(ref name) = update.name {
            player.name = name.clone();
        }
        if let Some(score) = update.score {
            player.score = score;
        }
        if let Some(ready) = update.ready {
            player.ready = ready;
        }
        if let Some(status) = update.status {
            player.status = status;
        }
        Ok(player.clone())
    }
}
