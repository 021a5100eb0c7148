//! Error types for the transport layer.

/// Errors that can occur while accepting connections or moving frames.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listen socket failed. The only error in this enum that
    /// is fatal to the process.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The WebSocket upgrade handshake failed. Aborts that connection
    /// only; no session is created.
    #[error("websocket handshake failed: {0}")]
    Handshake(#[source] tokio_tungstenite::tungstenite::Error),

    /// Sending a frame failed.
    #[error("send failed: {0}")]
    Send(#[source] tokio_tungstenite::tungstenite::Error),

    /// Receiving a frame failed.
    #[error("receive failed: {0}")]
    Receive(#[source] tokio_tungstenite::tungstenite::Error),

    /// The peer sent something that isn't a usable HTTP request.
    #[error("bad request: {0}")]
    BadRequest(String),
}
