use serde::{Deserialize, Serialize};

use crate::game::GameCard;
use crate::player::{Player, PlayerId, PlayerStatus};
use crate::room::Room;

/// The message envelope carried over the WebSocket in both directions:
/// a string tag naming the message kind and a payload shaped by the tag.
///
/// This is a closed set. Frames that do not parse into one of these
/// variants are dropped at the boundary, never fatal to the connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WsMessage {
    /// Server → peers: a player's connection was admitted to the room.
    #[serde(rename = "JOIN_ROOM")]
    JoinNotice(JoinNoticeMsg),

    /// Server → one client: full durable room plus roster, sent once on
    /// admission and again whenever the roster changes out-of-band.
    #[serde(rename = "SYNC_ROOM")]
    RoomSync(RoomSyncMsg),

    /// Host → everyone: the current game state. The payload is opaque to
    /// the server; the host-authority connection owns its shape and the
    /// server relays it verbatim.
    #[serde(rename = "UPDATE_STATE")]
    StateUpdate(serde_json::Value),

    /// Any client → everyone: a partial update to one player record.
    #[serde(rename = "UPDATE_PLAYER")]
    PlayerUpdate(PlayerUpdateMsg),

    /// Any client → everyone: a card was played.
    #[serde(rename = "PLAY_CARD")]
    PlayCard(PlayCardMsg),

    /// Moves the room from lobby to in-game.
    #[serde(rename = "START_GAME")]
    StartGame {},

    /// Moves the room from in-game to finished.
    #[serde(rename = "END_GAME")]
    EndGame {},
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinNoticeMsg {
    pub room_code: String,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSyncMsg {
    #[serde(flatten)]
    pub room: Room,
    pub players: Vec<Player>,
}

impl PartialEq for RoomSyncMsg {
    fn eq(&self, other: &Self) -> bool {
        self.room.code == other.room.code && self.players == other.players
    }
}

/// Partial player update. The durable `id` is required for the update to
/// be applied; a payload without it is dropped by the router.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdateMsg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PlayerStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayCardMsg {
    pub card: GameCard,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
}

impl WsMessage {
    /// Serialize to the JSON text frame sent over the wire.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a text frame. Unknown tags and malformed payloads are errors
    /// for the caller to drop.
    pub fn decode(text: &str) -> Result<WsMessage, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::CardType;
    use crate::room::{GameSettings, RoomStatus};

    fn make_room(code: &str) -> Room {
        Room {
            id: 1,
            code: code.to_string(),
            host_id: "host-1".to_string(),
            status: RoomStatus::Lobby,
            is_public: false,
            settings: GameSettings::default(),
            game_state: None,
            created_at: "0Z".to_string(),
        }
    }

    #[test]
    fn envelope_has_tag_and_payload() {
        let msg = WsMessage::JoinNotice(JoinNoticeMsg {
            room_code: "AB12XY".into(),
            player_id: 3,
        });
        let json: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(json["type"], "JOIN_ROOM");
        assert_eq!(json["payload"]["roomCode"], "AB12XY");
        assert_eq!(json["payload"]["playerId"], 3);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let result = WsMessage::decode(r#"{"type":"TELEPORT","payload":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn untagged_object_is_rejected() {
        assert!(WsMessage::decode(r#"{"payload":{}}"#).is_err());
        assert!(WsMessage::decode("not json at all").is_err());
    }

    #[test]
    fn lifecycle_messages_carry_empty_payload() {
        let start = WsMessage::StartGame {};
        assert_eq!(
            start.encode().unwrap(),
            r#"{"type":"START_GAME","payload":{}}"#
        );
        let decoded = WsMessage::decode(r#"{"type":"END_GAME","payload":{}}"#).unwrap();
        assert_eq!(decoded, WsMessage::EndGame {});
    }

    #[test]
    fn state_update_payload_is_opaque() {
        let decoded = WsMessage::decode(
            r#"{"type":"UPDATE_STATE","payload":{"round":2,"timeRemaining":30}}"#,
        )
        .unwrap();
        match decoded {
            WsMessage::StateUpdate(value) => {
                assert_eq!(value["round"], 2);
                assert_eq!(value["timeRemaining"], 30);
            },
            other => panic!("expected StateUpdate, got: {other:?}"),
        }
    }

    #[test]
    fn player_update_id_is_optional_at_parse_time() {
        let with_id =
            WsMessage::decode(r#"{"type":"UPDATE_PLAYER","payload":{"id":4,"ready":true}}"#)
                .unwrap();
        match with_id {
            WsMessage::PlayerUpdate(upd) => {
                assert_eq!(upd.id, Some(4));
                assert_eq!(upd.ready, Some(true));
                assert_eq!(upd.score, None);
            },
            other => panic!("expected PlayerUpdate, got: {other:?}"),
        }

        let without_id =
            WsMessage::decode(r#"{"type":"UPDATE_PLAYER","payload":{"ready":true}}"#).unwrap();
        match without_id {
            WsMessage::PlayerUpdate(upd) => assert_eq!(upd.id, None),
            other => panic!("expected PlayerUpdate, got: {other:?}"),
        }
    }

    #[test]
    fn play_card_tag_round_trips() {
        let msg = WsMessage::PlayCard(PlayCardMsg {
            card: GameCard {
                id: "c1".into(),
                name: "Sabotage".into(),
                card_type: CardType::Attack,
                description: "Opponent loses 5 points".into(),
                duration: None,
                value: Some(5),
            },
            target_id: Some("4".into()),
        });
        let encoded = msg.encode().unwrap();
        let json: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(json["type"], "PLAY_CARD");
        assert_eq!(json["payload"]["card"]["type"], "attack");
        assert_eq!(json["payload"]["targetId"], "4");

        assert_eq!(WsMessage::decode(&encoded).unwrap(), msg);

        // targetId is optional on the wire
        let untargeted = WsMessage::decode(
            r#"{"type":"PLAY_CARD","payload":{"card":{"id":"c2","name":"Overdrive","type":"buff","description":"Double points this round"}}}"#,
        )
        .unwrap();
        match untargeted {
            WsMessage::PlayCard(play) => {
                assert_eq!(play.card.card_type, CardType::Buff);
                assert_eq!(play.target_id, None);
            },
            other => panic!("expected PlayCard, got: {other:?}"),
        }
    }

    #[test]
    fn room_sync_flattens_room_fields() {
        let msg = WsMessage::RoomSync(RoomSyncMsg {
            room: make_room("AB12XY"),
            players: vec![],
        });
        let json: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(json["type"], "SYNC_ROOM");
        assert_eq!(json["payload"]["code"], "AB12XY");
        assert_eq!(json["payload"]["status"], "lobby");
        assert!(json["payload"]["players"].is_array());
    }
}
