//! Core protocol types for quizhub's wire format.
//!
//! Every message on the wire is a [`Message`] envelope: a `type`
//! discriminant plus an opaque JSON payload. The envelope is decoded first
//! so the hub can route on the kind before attempting to decode the inner
//! payload shape — a two-level encode/decode.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::value::RawValue;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected client.
///
/// Doubles as the player id inside a room: a player is identified by the
/// session that created it. Serde-transparent, so it serializes as a plain
/// string on the wire.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    /// Generates a random 32-character hex id (128 bits of entropy).
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let bytes: [u8; 16] = rng.random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a room. Opaque and client-chosen: the first
/// `join_room` naming an id brings the room into existence.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
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
// MessageKind — the closed set of wire discriminants
// ---------------------------------------------------------------------------

/// The `type` discriminant of a wire message.
///
/// This is a closed enumeration: a frame whose `type` string is not listed
/// here fails envelope decoding, and the caller logs and drops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    // Connection lifecycle
    Connected,
    Disconnected,

    // Room membership
    JoinRoom,
    LeaveRoom,
    RoomUsers,

    // Errors
    Error,

    // Game events
    GameStart,
    GameEnd,
    Question,
    SubmitAnswer,
    AnswerResult,
    Leaderboard,
    NextQuestion,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::JoinRoom => "join_room",
            Self::LeaveRoom => "leave_room",
            Self::RoomUsers => "room_users",
            Self::Error => "error",
            Self::GameStart => "game_start",
            Self::GameEnd => "game_end",
            Self::Question => "question",
            Self::SubmitAnswer => "submit_answer",
            Self::AnswerResult => "answer_result",
            Self::Leaderboard => "leaderboard",
            Self::NextQuestion => "next_question",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Message — the envelope
// ---------------------------------------------------------------------------

/// The top-level wire envelope: `{"type": ..., "payload": ...}`.
///
/// The payload is kept as raw JSON so the envelope can be decoded (and
/// routed on `kind`) without knowing the payload shape. The inner shape is
/// decoded on demand with [`Message::payload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub payload: Box<RawValue>,
}

impl Message {
    /// Builds a message by serializing `payload` into the envelope.
    pub fn new<T: Serialize>(
        kind: MessageKind,
        payload: &T,
    ) -> Result<Self, ProtocolError> {
        let payload = serde_json::value::to_raw_value(payload)
            .map_err(ProtocolError::Encode)?;
        Ok(Self { kind, payload })
    }

    /// Decodes the inner payload as `T`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the payload does not match the
    /// expected shape. The envelope itself is unaffected; callers log the
    /// error and drop the message.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_str(self.payload.get()).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Control payload shapes
// ---------------------------------------------------------------------------

/// `join_room` payload — a client asks to enter a room under a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomPayload {
    pub room_id: RoomId,
    pub username: String,
}

/// `submit_answer` payload. `timestamp` is milliseconds since the Unix
/// epoch, as reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub question_id: u32,
    pub answer: usize,
    pub timestamp: i64,
}

/// `error` payload — a room-operation rejection sent back to one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// `room_users` payload — a human-readable membership notice broadcast to
/// a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUsersPayload {
    pub message: String,
}

/// `connected` payload — the server tells a new session its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedPayload {
    pub client_id: ClientId,
}

/// `disconnected` payload — broadcast to a room when a member's transport
/// goes away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectedPayload {
    pub client_id: ClientId,
    pub username: String,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is consumed by a browser client, so these tests pin
    //! the exact JSON shapes: a serde attribute change that altered them
    //! would break the client without failing compilation.

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_client_id_serializes_as_plain_string() {
        // `#[serde(transparent)]` means ClientId("ab") → `"ab"`, not
        // `{"0":"ab"}`.
        let json = serde_json::to_string(&ClientId("ab12".into())).unwrap();
        assert_eq!(json, "\"ab12\"");
    }

    #[test]
    fn test_client_id_generate_is_32_hex_chars() {
        let id = ClientId::generate();
        assert_eq!(id.0.len(), 32);
        assert!(id.0.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_client_id_generate_is_unique() {
        assert_ne!(ClientId::generate(), ClientId::generate());
    }

    #[test]
    fn test_room_id_round_trip() {
        let id = RoomId::new("R1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"R1\"");
        let back: RoomId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    // =====================================================================
    // MessageKind — wire strings are part of the protocol
    // =====================================================================

    #[test]
    fn test_message_kind_serializes_as_snake_case() {
        let cases = [
            (MessageKind::Connected, "connected"),
            (MessageKind::Disconnected, "disconnected"),
            (MessageKind::JoinRoom, "join_room"),
            (MessageKind::LeaveRoom, "leave_room"),
            (MessageKind::RoomUsers, "room_users"),
            (MessageKind::Error, "error"),
            (MessageKind::GameStart, "game_start"),
            (MessageKind::GameEnd, "game_end"),
            (MessageKind::Question, "question"),
            (MessageKind::SubmitAnswer, "submit_answer"),
            (MessageKind::AnswerResult, "answer_result"),
            (MessageKind::Leaderboard, "leaderboard"),
            (MessageKind::NextQuestion, "next_question"),
        ];
        for (kind, wire) in cases {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{wire}\""));
            assert_eq!(kind.to_string(), wire);
        }
    }

    #[test]
    fn test_message_kind_unknown_string_fails() {
        let result: Result<MessageKind, _> =
            serde_json::from_str("\"fly_to_moon\"");
        assert!(result.is_err());
    }

    // =====================================================================
    // Message envelope
    // =====================================================================

    #[test]
    fn test_message_envelope_json_shape() {
        let msg = Message::new(
            MessageKind::JoinRoom,
            &JoinRoomPayload {
                room_id: RoomId::new("R1"),
                username: "alice".into(),
            },
        )
        .unwrap();

        let json: serde_json::Value =
            serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "join_room");
        assert_eq!(json["payload"]["room_id"], "R1");
        assert_eq!(json["payload"]["username"], "alice");
    }

    #[test]
    fn test_message_two_level_decode() {
        // Outer envelope decodes without knowing the payload shape; the
        // inner payload decodes on demand.
        let wire = r#"{"type":"submit_answer","payload":{"question_id":3,"answer":1,"timestamp":1700000000000}}"#;
        let msg: Message = serde_json::from_str(wire).unwrap();
        assert_eq!(msg.kind, MessageKind::SubmitAnswer);

        let payload: AnswerPayload = msg.payload().unwrap();
        assert_eq!(payload.question_id, 3);
        assert_eq!(payload.answer, 1);
        assert_eq!(payload.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_message_payload_shape_mismatch_fails() {
        // The envelope decodes fine; only the typed payload decode fails.
        let wire = r#"{"type":"join_room","payload":{"bogus":true}}"#;
        let msg: Message = serde_json::from_str(wire).unwrap();
        assert_eq!(msg.kind, MessageKind::JoinRoom);

        let result: Result<JoinRoomPayload, _> = msg.payload();
        assert!(result.is_err());
    }

    #[test]
    fn test_message_unknown_type_fails_at_envelope() {
        let wire = r#"{"type":"teleport","payload":{}}"#;
        let result: Result<Message, _> = serde_json::from_str(wire);
        assert!(result.is_err());
    }

    #[test]
    fn test_message_garbage_fails() {
        let result: Result<Message, _> =
            serde_json::from_slice(b"not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_message_clone_preserves_payload() {
        let msg = Message::new(
            MessageKind::Error,
            &ErrorPayload {
                message: "room is full".into(),
            },
        )
        .unwrap();
        let copy = msg.clone();
        let payload: ErrorPayload = copy.payload().unwrap();
        assert_eq!(payload.message, "room is full");
    }

    // =====================================================================
    // Control payloads
    // =====================================================================

    #[test]
    fn test_join_room_payload_wire_names() {
        let json = r#"{"room_id":"trivia-night","username":"bob"}"#;
        let payload: JoinRoomPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.room_id, RoomId::new("trivia-night"));
        assert_eq!(payload.username, "bob");
    }

    #[test]
    fn test_error_payload_round_trip() {
        let payload = ErrorPayload {
            message: "already answered".into(),
        };
        let bytes = serde_json::to_vec(&payload).unwrap();
        let back: ErrorPayload = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_connected_payload_json_shape() {
        let payload = ConnectedPayload {
            client_id: ClientId("deadbeef".into()),
        };
        let json: serde_json::Value =
            serde_json::to_value(&payload).unwrap();
        assert_eq!(json["client_id"], "deadbeef");
    }
}
