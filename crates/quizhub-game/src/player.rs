//! Per-player game state and the scoring formula.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use quizhub_protocol::ClientId;

/// A player's progression through the quiz.
///
/// Mirrors the room's own status: a player is Waiting until the game
/// starts, Playing during the question cycle, Finished when the quiz ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Waiting,
    Playing,
    Finished,
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// One player's state inside a room.
///
/// Owned exclusively by the room that holds it and mutated only under that
/// room's lock. `total_time` accumulates answer latency in milliseconds and
/// breaks leaderboard ties (faster wins).
#[derive(Debug, Clone)]
pub struct Player {
    pub id: ClientId,
    pub username: String,
    pub status: PlayerStatus,
    pub score: u32,
    pub total_time: u64,
    pub correct_count: u32,
    pub joined_at: Instant,
}

impl Player {
    pub fn new(id: ClientId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            status: PlayerStatus::Waiting,
            score: 0,
            total_time: 0,
            correct_count: 0,
            joined_at: Instant::now(),
        }
    }
}

/// Computes the points awarded for one answer.
///
/// An incorrect answer scores 0. A correct answer scores 100 base points
/// plus a speed bonus of `floor(50 * (limit - elapsed) / limit)` when the
/// answer arrived inside the time limit — 50 for an instant answer, scaling
/// linearly down to 0 at the limit. At or beyond the limit the bonus is 0,
/// so a correct answer is always worth 100..=150.
pub fn calculate_score(correct: bool, elapsed_ms: u64, limit_ms: u64) -> u32 {
    if !correct {
        return 0;
    }

    let base = 100;
    let bonus = if elapsed_ms < limit_ms {
        (50 * (limit_ms - elapsed_ms) / limit_ms) as u32
    } else {
        0
    };

    base + bonus
}
