//! Transport layer for quizhub.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the byte-message channel a client speaks through, plus the WebSocket
//! implementation ([`WebSocketTransport`], [`WebSocketConnection`]).
//!
//! The accept path also answers the two plain-HTTP requests the server
//! supports — `GET /health` and a 404 for everything that isn't the
//! WebSocket endpoint — so the whole server runs on one listener, like the
//! original deployment.

#![allow(async_fn_in_trait)]

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{WS_PATH, WebSocketConnection, WebSocketTransport};

/// Accepts incoming client connections.
pub trait Transport: Send + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single bidirectional byte-message channel to one client.
///
/// `send` and `recv` may be called concurrently from different tasks —
/// the session layer runs one reader and one writer task per connection.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one message to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;
}
