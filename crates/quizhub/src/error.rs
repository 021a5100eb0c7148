//! Unified error type for the quizhub server.

use quizhub_game::RoomError;
use quizhub_protocol::ProtocolError;
use quizhub_transport::TransportError;

/// Top-level error wrapping each layer's error enum.
///
/// The `#[from]` attributes generate the `From` impls, so `?` converts
/// layer errors automatically. In practice only transport bind failures
/// reach `main` — everything else is handled (logged, dropped, or turned
/// into an `error` message) closer to where it happens.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not joinable, duplicate answer, ...).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizhub_protocol::{ClientId, RoomId};

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::BadRequest("garbage".into());
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Transport(_)));
        assert!(server_err.to_string().contains("garbage"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::Full(RoomId::new("R1"));
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Room(_)));
        assert!(server_err.to_string().contains("R1"));
    }

    #[test]
    fn test_from_room_error_preserves_player_context() {
        let err = RoomError::AlreadyAnswered(ClientId("p1".into()));
        let server_err: ServerError = err.into();
        assert!(server_err.to_string().contains("p1"));
    }
}
