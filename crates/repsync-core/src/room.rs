use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::GameState;

/// Body region a session focuses on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusArea {
    Arms,
    Legs,
    Core,
    Total,
}

/// Session format selected at room creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BurnoutType {
    Classic,
    Pyramid,
    SuddenDeath,
    TimeAttack,
}

/// Settings chosen by the host when creating a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub focus_area: FocusArea,
    pub burnout_type: BurnoutType,
    /// Seconds per round.
    pub round_time: u32,
    pub rounds: u32,
    /// Seconds of rest between rounds.
    pub rest_time: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            focus_area: FocusArea::Total,
            burnout_type: BurnoutType::Classic,
            round_time: 60,
            rounds: 3,
            rest_time: 30,
        }
    }
}

/// Lifecycle status of a room. Transitions are monotonic and
/// one-directional: Lobby → InGame → Finished. Finished is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    #[serde(rename = "lobby")]
    Lobby,
    #[serde(rename = "in-game")]
    InGame,
    #[serde(rename = "finished")]
    Finished,
}

impl RoomStatus {
    /// Whether moving from `self` to `to` is a valid lifecycle transition.
    pub fn can_transition(self, to: RoomStatus) -> bool {
        matches!(
            (self, to),
            (RoomStatus::Lobby, RoomStatus::InGame) | (RoomStatus::InGame, RoomStatus::Finished)
        )
    }
}

/// A durable room record. The code is immutable once created and uniquely
/// identifies at most one room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i64,
    pub code: String,
    pub host_id: String,
    pub status: RoomStatus,
    pub is_public: bool,
    pub settings: GameSettings,
    pub game_state: Option<GameState>,
    pub created_at: String,
}

/// Length of a room code.
pub const ROOM_CODE_LEN: usize = 6;

const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a short room code: 6 uppercase alphanumeric characters.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Validate the room code format without touching any store.
pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LEN
        && code
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
}
