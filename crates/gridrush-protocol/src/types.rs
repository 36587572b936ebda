//! Wire types for the Gridrush game protocol.
//!
//! The wire format is a tagged JSON envelope: `{"type": <tag>, "content": <payload>}`.
//! [`GameMsg`] models it as a sum type with one variant per tag, so the rest of
//! the server never touches an untyped `content` value.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// An authenticated player identity.
///
/// Opaque to the game server — the auth collaborator mints it (an 8-hex
/// digest in the reference deployment). Uniqueness per room is enforced by
/// the client registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A room name. Rooms are created at startup with fixed ids (e.g. `"A"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Grid primitives
// ---------------------------------------------------------------------------

/// A cell on the grid, `(x, y)` with both axes in `[0, grid_size)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Canonical `"x-y"` key used for occupancy and item lookups.
    pub fn cell_key(&self) -> String {
        format!("{}-{}", self.x, self.y)
    }

    /// Manhattan distance to another cell.
    pub fn step_distance(&self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Whether the cell lies inside a `grid_size × grid_size` grid.
    pub fn in_bounds(&self, grid_size: i32) -> bool {
        self.x >= 0 && self.x < grid_size && self.y >= 0 && self.y < grid_size
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// What kind of collectible sits on a cell.
///
/// `Unknown` soaks up kinds this server version does not recognize so a
/// single odd item cannot kill the whole frame; the engine logs and drops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemKind {
    Coin,
    Diamond,
    Unknown,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coin => "coin",
            Self::Diamond => "diamond",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for ItemKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "coin" => Self::Coin,
            "diamond" => Self::Diamond,
            _ => Self::Unknown,
        }
    }
}

impl From<ItemKind> for String {
    fn from(kind: ItemKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A collectible with its score value. Consumed on collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub value: i32,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A player position, inbound as a move request and outbound as the
/// authoritative answer.
///
/// Inbound frames only need `position`; `valid` and `id` default and the
/// session endpoint overwrites `id` with the authenticated user before the
/// payload reaches the engine, so clients cannot spoof each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPosition {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub position: Position,
}

/// An item pickup, inbound as `itemAction` and outbound (with `valid: true`)
/// as `itemCollected`. The `id` field is overwritten like [`PlayerPosition::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAction {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub id: UserId,
    pub item: Item,
    pub position: Position,
}

/// One item on the grid, sent per item in the round snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPosition {
    pub item: Item,
    pub position: Position,
}

/// A player's current score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub id: UserId,
    pub score: i32,
}

/// A round phase announcement with its wall-clock window (ms Unix timestamps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundInfo {
    pub state: String,
    pub current_time: i64,
    pub end_time: i64,
}

/// Seconds left in the current phase, pushed on every scheduler tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    pub remaining_time: i64,
    pub current_state: String,
}

/// Told to late joiners: when the next round seats players (Unix seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingNotification {
    pub message: String,
    pub next_round_start: i64,
}

/// A per-player error (game-rule violation, missing state).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMsg {
    pub id: UserId,
    pub error: String,
}

/// A per-player informational notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMsg {
    pub id: UserId,
    pub text: String,
}

/// Chat payload. The tag is reserved on the wire; the server ignores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMsg {
    pub id: UserId,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The tagged message envelope: `{"type": <tag>, "content": <payload>}`.
///
/// One variant per wire tag. Unrecognized tags fail decoding, which the
/// session endpoint treats as a protocol violation (the session is dropped).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "camelCase")]
pub enum GameMsg {
    /// Move request (inbound) / authoritative position or resync (outbound).
    PlayerPosition(PlayerPosition),
    /// Pickup request from a client.
    ItemAction(ItemAction),
    /// Confirmed pickup, broadcast to the room.
    ItemCollected(ItemAction),
    /// One item of the current round (snapshot).
    ItemPosition(ItemPosition),
    /// One obstacle of the current round (snapshot).
    ObstaclePosition(Position),
    /// Score change broadcast.
    Score(PlayerScore),
    /// Phase transition announcement.
    RoundState(RoundInfo),
    /// Per-tick countdown.
    Countdown(Countdown),
    /// Late-join notice with the next seating time.
    WaitingNotification(WaitingNotification),
    /// Per-player error.
    ErrorMsg(ErrorMsg),
    /// Per-player notice.
    AlertMsg(AlertMsg),
    /// Reserved, not implemented.
    PlayerChatMsg(ChatMsg),
}

impl GameMsg {
    /// An authoritative `playerPosition { valid: true }`.
    pub fn position_update(id: UserId, position: Position) -> Self {
        Self::PlayerPosition(PlayerPosition {
            valid: true,
            id,
            reason: None,
            position,
        })
    }

    /// A `playerPosition { valid: false }` resync carrying the stored
    /// position and the rejection reason, sent to the offender only.
    pub fn resync(id: UserId, position: Position, reason: impl Into<String>) -> Self {
        Self::PlayerPosition(PlayerPosition {
            valid: false,
            id,
            reason: Some(reason.into()),
            position,
        })
    }

    pub fn error_to(id: UserId, error: impl Into<String>) -> Self {
        Self::ErrorMsg(ErrorMsg {
            id,
            error: error.into(),
        })
    }

    pub fn alert_to(id: UserId, text: impl Into<String>) -> Self {
        Self::AlertMsg(AlertMsg {
            id,
            text: text.into(),
        })
    }

    pub fn score_update(id: UserId, score: i32) -> Self {
        Self::Score(PlayerScore { id, score })
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is consumed by a browser client, so these tests pin
    //! the exact JSON shapes, not just round-trip equality.

    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s)
    }

    // =====================================================================
    // Identity and grid primitives
    // =====================================================================

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&uid("a1b2c3d4")).unwrap();
        assert_eq!(json, "\"a1b2c3d4\"");
    }

    #[test]
    fn test_room_id_round_trip() {
        let id: RoomId = serde_json::from_str("\"A\"").unwrap();
        assert_eq!(id, RoomId::new("A"));
        assert_eq!(id.to_string(), "A");
    }

    #[test]
    fn test_position_cell_key_format() {
        assert_eq!(Position::new(3, 4).cell_key(), "3-4");
        assert_eq!(Position::new(0, 0).cell_key(), "0-0");
    }

    #[test]
    fn test_position_step_distance() {
        let origin = Position::new(5, 5);
        assert_eq!(origin.step_distance(Position::new(5, 5)), 0);
        assert_eq!(origin.step_distance(Position::new(5, 6)), 1);
        assert_eq!(origin.step_distance(Position::new(6, 6)), 2);
        assert_eq!(origin.step_distance(Position::new(7, 5)), 2);
    }

    #[test]
    fn test_position_in_bounds() {
        assert!(Position::new(0, 0).in_bounds(15));
        assert!(Position::new(14, 14).in_bounds(15));
        assert!(!Position::new(15, 0).in_bounds(15));
        assert!(!Position::new(0, -1).in_bounds(15));
    }

    #[test]
    fn test_item_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ItemKind::Coin).unwrap(), "\"coin\"");
        assert_eq!(
            serde_json::to_string(&ItemKind::Diamond).unwrap(),
            "\"diamond\""
        );
    }

    #[test]
    fn test_item_kind_unrecognized_decodes_as_unknown() {
        let kind: ItemKind = serde_json::from_str("\"emerald\"").unwrap();
        assert_eq!(kind, ItemKind::Unknown);
    }

    #[test]
    fn test_item_uses_type_field_on_wire() {
        let item = Item {
            kind: ItemKind::Coin,
            value: 10,
        };
        let json: serde_json::Value = serde_json::to_value(item).unwrap();
        assert_eq!(json["type"], "coin");
        assert_eq!(json["value"], 10);
    }

    // =====================================================================
    // Envelope — one shape test per tag
    // =====================================================================

    #[test]
    fn test_player_position_json_format() {
        let msg = GameMsg::position_update(uid("u1"), Position::new(3, 4));
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "playerPosition");
        assert_eq!(json["content"]["valid"], true);
        assert_eq!(json["content"]["id"], "u1");
        assert_eq!(json["content"]["position"]["x"], 3);
        assert_eq!(json["content"]["position"]["y"], 4);
        // `reason` is omitted when there is nothing to explain.
        assert!(json["content"].get("reason").is_none());
    }

    #[test]
    fn test_player_position_resync_carries_reason() {
        let msg = GameMsg::resync(uid("u1"), Position::new(5, 5), "over 1 step");
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["content"]["valid"], false);
        assert_eq!(json["content"]["reason"], "over 1 step");
    }

    #[test]
    fn test_player_position_inbound_defaults() {
        // A client move request carries only the target cell.
        let frame = r#"{"type":"playerPosition","content":{"position":{"x":3,"y":4}}}"#;
        let msg: GameMsg = serde_json::from_str(frame).unwrap();

        let GameMsg::PlayerPosition(pos) = msg else {
            panic!("expected playerPosition");
        };
        assert!(!pos.valid);
        assert_eq!(pos.id, UserId::default());
        assert_eq!(pos.position, Position::new(3, 4));
    }

    #[test]
    fn test_item_action_json_format() {
        let frame = r#"{
            "type": "itemAction",
            "content": {
                "id": "spoofed",
                "item": {"type": "coin", "value": 10},
                "position": {"x": 1, "y": 2}
            }
        }"#;
        let msg: GameMsg = serde_json::from_str(frame).unwrap();

        let GameMsg::ItemAction(action) = msg else {
            panic!("expected itemAction");
        };
        assert_eq!(action.item.kind, ItemKind::Coin);
        assert_eq!(action.item.value, 10);
        assert_eq!(action.position, Position::new(1, 2));
    }

    #[test]
    fn test_item_collected_tag() {
        let msg = GameMsg::ItemCollected(ItemAction {
            valid: true,
            id: uid("u1"),
            item: Item {
                kind: ItemKind::Diamond,
                value: 100,
            },
            position: Position::new(7, 7),
        });
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "itemCollected");
        assert_eq!(json["content"]["valid"], true);
        assert_eq!(json["content"]["item"]["type"], "diamond");
    }

    #[test]
    fn test_item_position_json_format() {
        let msg = GameMsg::ItemPosition(ItemPosition {
            item: Item {
                kind: ItemKind::Coin,
                value: 10,
            },
            position: Position::new(2, 9),
        });
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "itemPosition");
        assert_eq!(json["content"]["item"]["value"], 10);
        assert_eq!(json["content"]["position"]["y"], 9);
    }

    #[test]
    fn test_obstacle_position_content_is_bare_cell() {
        let msg = GameMsg::ObstaclePosition(Position::new(6, 1));
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "obstaclePosition");
        assert_eq!(json["content"]["x"], 6);
        assert_eq!(json["content"]["y"], 1);
    }

    #[test]
    fn test_score_json_format() {
        let msg = GameMsg::score_update(uid("u1"), 110);
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "score");
        assert_eq!(json["content"]["id"], "u1");
        assert_eq!(json["content"]["score"], 110);
    }

    #[test]
    fn test_round_state_uses_camel_case_times() {
        let msg = GameMsg::RoundState(RoundInfo {
            state: "preparing".into(),
            current_time: 1_700_000_010_000,
            end_time: 1_700_000_015_000,
        });
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "roundState");
        assert_eq!(json["content"]["state"], "preparing");
        assert_eq!(json["content"]["currentTime"], 1_700_000_010_000_i64);
        assert_eq!(json["content"]["endTime"], 1_700_000_015_000_i64);
    }

    #[test]
    fn test_countdown_json_format() {
        let msg = GameMsg::Countdown(Countdown {
            remaining_time: 44,
            current_state: "playing".into(),
        });
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "countdown");
        assert_eq!(json["content"]["remainingTime"], 44);
        assert_eq!(json["content"]["currentState"], "playing");
    }

    #[test]
    fn test_waiting_notification_json_format() {
        let msg = GameMsg::WaitingNotification(WaitingNotification {
            message: "round in progress, waiting for the next one".into(),
            next_round_start: 1_700_000_070,
        });
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "waitingNotification");
        assert_eq!(json["content"]["nextRoundStart"], 1_700_000_070);
    }

    #[test]
    fn test_error_and_alert_json_format() {
        let err: serde_json::Value =
            serde_json::to_value(GameMsg::error_to(uid("u2"), "cell occupied")).unwrap();
        assert_eq!(err["type"], "errorMsg");
        assert_eq!(err["content"]["error"], "cell occupied");

        let alert: serde_json::Value =
            serde_json::to_value(GameMsg::alert_to(uid("u2"), "welcome back")).unwrap();
        assert_eq!(alert["type"], "alertMsg");
        assert_eq!(alert["content"]["text"], "welcome back");
    }

    #[test]
    fn test_player_chat_msg_round_trip() {
        let msg = GameMsg::PlayerChatMsg(ChatMsg {
            id: uid("u1"),
            content: "gg".into(),
        });
        let encoded = serde_json::to_string(&msg).unwrap();
        let decoded: GameMsg = serde_json::from_str(&encoded).unwrap();
        assert_eq!(msg, decoded);
    }

    // =====================================================================
    // Round trips and malformed input
    // =====================================================================

    #[test]
    fn test_every_outbound_tag_round_trips() {
        let msgs = vec![
            GameMsg::position_update(uid("u1"), Position::new(0, 14)),
            GameMsg::resync(uid("u1"), Position::new(1, 1), "out of grid"),
            GameMsg::ItemCollected(ItemAction {
                valid: true,
                id: uid("u1"),
                item: Item {
                    kind: ItemKind::Coin,
                    value: 10,
                },
                position: Position::new(4, 4),
            }),
            GameMsg::ItemPosition(ItemPosition {
                item: Item {
                    kind: ItemKind::Diamond,
                    value: 100,
                },
                position: Position::new(8, 2),
            }),
            GameMsg::ObstaclePosition(Position::new(12, 12)),
            GameMsg::score_update(uid("u1"), 0),
            GameMsg::RoundState(RoundInfo {
                state: "waiting".into(),
                current_time: 0,
                end_time: 5_000,
            }),
            GameMsg::Countdown(Countdown {
                remaining_time: 3,
                current_state: "cleanup".into(),
            }),
            GameMsg::WaitingNotification(WaitingNotification {
                message: "hold on".into(),
                next_round_start: 60,
            }),
            GameMsg::error_to(uid("u1"), "no position found"),
            GameMsg::alert_to(uid("u1"), "notice"),
        ];

        for msg in msgs {
            let encoded = serde_json::to_string(&msg).unwrap();
            let decoded: GameMsg = serde_json::from_str(&encoded).unwrap();
            assert_eq!(msg, decoded, "round trip failed for {encoded}");
        }
    }

    #[test]
    fn test_decode_unknown_tag_is_an_error() {
        let frame = r#"{"type":"teleport","content":{"x":1,"y":1}}"#;
        let result: Result<GameMsg, _> = serde_json::from_str(frame);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_garbage_is_an_error() {
        let result: Result<GameMsg, _> = serde_json::from_str("not json");
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_missing_content_is_an_error() {
        let result: Result<GameMsg, _> =
            serde_json::from_str(r#"{"type":"playerPosition"}"#);
        assert!(result.is_err());
    }
}
