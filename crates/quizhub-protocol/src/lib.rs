//! Wire protocol for quizhub.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Message`], [`MessageKind`], the payload structs, the
//!   [`ClientId`]/[`RoomId`] identity newtypes) — the structures that travel
//!   on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the hub
//! (session context). It doesn't know about connections or rooms — it only
//! knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Hub (session context)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    AnswerPayload, ClientId, ConnectedPayload, DisconnectedPayload,
    ErrorPayload, JoinRoomPayload, Message, MessageKind, RoomId,
    RoomUsersPayload,
};
