use serde::{Deserialize, Serialize};

/// Durable player identifier (serial, allocated by the store).
pub type PlayerId = i64;

/// What a player is currently doing, as reported over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Idle,
    Exercising,
    Rest,
}

/// A durable player record, bound to one room for its lifetime.
///
/// The session id is the opaque credential minted at join time; it is
/// accepted on input (the store round-trips records) but never serialized
/// back out, so roster broadcasts cannot leak another player's token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub room_code: String,
    #[serde(skip_serializing, default)]
    pub session_id: String,
    pub name: String,
    pub score: i64,
    pub ready: bool,
    pub is_host: bool,
    pub is_bot: bool,
    pub status: PlayerStatus,
}
