//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
///
/// Neither variant is ever fatal: an encode failure aborts the one message
/// being built, and a decode failure drops the one inbound frame. The
/// session that sent a malformed frame stays connected.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown `type`
    /// discriminant, or a payload that doesn't match the expected shape.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
