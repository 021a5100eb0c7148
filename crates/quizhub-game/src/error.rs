//! Error types for room operations.

use quizhub_protocol::{ClientId, RoomId};

/// Rejections returned by room operations.
///
/// These are expected, recoverable outcomes: the hub turns them into
/// `error` messages for the originating session. None of them mutate room
/// state.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room has no free player slots.
    #[error("room {0} is full")]
    Full(RoomId),

    /// The room has left the Waiting state and no longer admits players.
    #[error("room {0} is not accepting players")]
    NotJoinable(RoomId),

    /// The room does not have enough players to start.
    #[error("room {0} cannot start yet")]
    NotReady(RoomId),

    /// The player already submitted an answer for the current question.
    #[error("player {0} already answered this question")]
    AlreadyAnswered(ClientId),

    /// The player is not a member of the room.
    #[error("player {0} is not in the room")]
    UnknownPlayer(ClientId),

    /// No question is currently being asked.
    #[error("no question is active")]
    NoActiveQuestion,

    /// The quiz already ran out of questions; the room is terminal.
    #[error("quiz in room {0} is already finished")]
    QuizFinished(RoomId),
}
