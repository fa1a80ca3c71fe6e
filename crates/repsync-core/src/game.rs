use serde::{Deserialize, Serialize};

use crate::room::FocusArea;

/// Kind of card a player can play mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Attack,
    Defense,
    Buff,
}

/// A short-lived card-like event with a type, description, and magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameCard {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
}

/// How an exercise is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Rep,
    Hold,
}

/// Rep/hold counts that map effort to skill tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub beginner: u32,
    pub intermediate: u32,
    pub advanced: u32,
    pub elite: u32,
}

/// One exercise in the session's ordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    pub focus: Vec<FocusArea>,
    pub thresholds: Thresholds,
}

/// Transient game state owned by the host-authority connection.
///
/// Created when a room goes in-game, mutated only via broadcast messages
/// originating from the host, discarded when the room finishes. The
/// server relays it without interpreting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub current_round: u32,
    pub current_exercise_index: u32,
    pub time_remaining: u32,
    pub active_card: Option<GameCard>,
    pub exercises: Vec<Exercise>,
}
