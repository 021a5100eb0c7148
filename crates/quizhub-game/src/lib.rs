//! Game state for quizhub: players, questions, and the room state machine.
//!
//! A [`Room`] is an isolated quiz session: its own player set, question
//! progression, answer collection, and lock. Rooms are independent of each
//! other — two rooms never share state, so they proceed fully in parallel.
//!
//! # Key types
//!
//! - [`Room`] — the per-room state machine, guarded by one `RwLock`
//! - [`RoomRegistry`] — creates rooms on first reference, hands out handles
//! - [`Player`] — per-user game state and scoring
//! - [`Question`] / [`QuestionView`] — the bank entry and its redacted
//!   client-safe projection
//! - [`RoomError`] — typed rejections for every room operation
//!
//! Nothing in this crate touches the network; the hub layer above decides
//! when to call room operations and what to broadcast afterwards.

mod config;
mod error;
mod player;
mod question;
mod registry;
mod room;

pub use config::{RoomConfig, RoomStatus};
pub use error::RoomError;
pub use player::{Player, PlayerStatus, calculate_score};
pub use question::{Question, QuestionView, sample_questions};
pub use registry::RoomRegistry;
pub use room::{AnswerOutcome, LeaderboardEntry, PlayerSummary, Room, RoomInfo};
