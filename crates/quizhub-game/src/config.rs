//! Room configuration and lifecycle status.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Capacity limits for a room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Minimum players required before the game may start.
    pub min_players: usize,

    /// Maximum players allowed in the room.
    pub max_players: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        // min_players is 1 so a single client can exercise the full cycle;
        // raise to 2+ for real competition.
        Self {
            min_players: 1,
            max_players: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle status of a room.
///
/// Transitions are strictly ordered and irreversible:
///
/// ```text
/// Waiting → Playing → Finished
/// ```
///
/// - **Waiting**: the room exists and accepts joins; the game has not
///   started.
/// - **Playing**: the question cycle is running. No new players.
/// - **Finished**: every question has been asked. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

impl RoomStatus {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if the question cycle is running.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Returns `true` if the quiz has ended.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}
