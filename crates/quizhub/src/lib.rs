//! # quizhub
//!
//! A real-time, room-based multiplayer quiz backend. Clients connect over
//! WebSocket, join a named room, and play a synchronized
//! question/answer/scoring cycle broadcast to every room member.
//!
//! The moving parts, leaf to root:
//!
//! - [`quizhub_protocol`] — the wire envelope and payload shapes
//! - [`quizhub_game`] — players, the question bank, and the per-room state
//!   machine
//! - [`quizhub_transport`] — the WebSocket accept layer
//! - [`Hub`] — the single coordinating actor owning the session registry
//!   and driving room operations, broadcasts, and question timers
//! - [`session`] — the per-connection reader/writer pumps
//! - [`QuizServer`] — ties it all together behind one listener
//!
//! ```text
//! transport accept → session pumps → hub commands → room ops → broadcasts
//! ```

mod config;
mod error;
mod hub;
mod server;
pub mod session;

pub use config::Config;
pub use error::ServerError;
pub use hub::{Hub, HubHandle, QuestionClosedPayload};
pub use server::{QuizServer, QuizServerBuilder};
