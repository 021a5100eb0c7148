//! The per-room state machine: membership, question progression, answer
//! collection, scoring, and leaderboard.
//!
//! All mutable room state sits behind one `RwLock`; every operation
//! acquires it exactly once and performs only bounded in-memory work while
//! holding it — no I/O, no `.await` under the lock. Readers run
//! concurrently with each other, writers are exclusive.
//!
//! The lock makes each individual operation atomic. It does NOT order
//! operations issued by different callers: if cross-operation ordering
//! matters (answer recorded before leaderboard broadcast), all calls for a
//! room must be issued from a single logical caller, which is how the hub
//! drives rooms in production.

use std::collections::HashMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use quizhub_protocol::{ClientId, RoomId};

use crate::{
    Player, PlayerStatus, Question, QuestionView, RoomConfig, RoomError,
    RoomStatus, calculate_score,
};

/// Mutable room state, guarded by the room's lock.
struct RoomInner {
    status: RoomStatus,
    players: HashMap<ClientId, Player>,
    /// Index of the question being asked. `None` before the game starts;
    /// `Some(questions.len())` once the quiz has run past the last
    /// question.
    current: Option<usize>,
    /// Epoch milliseconds when the current question was presented.
    question_started_at_ms: u64,
    /// Answers recorded for the current question, keyed by player id.
    /// Cleared on every advance.
    answers: HashMap<ClientId, usize>,
}

/// An isolated quiz session.
///
/// Created when its id is first referenced; never destroyed while the
/// process runs. The question list and capacity limits are fixed at
/// creation; everything else lives in the locked inner state.
pub struct Room {
    id: RoomId,
    config: RoomConfig,
    questions: Vec<Question>,
    created_at: Instant,
    inner: RwLock<RoomInner>,
}

impl Room {
    /// Creates a room with the default capacity and the sample question
    /// bank.
    pub fn new(id: RoomId) -> Self {
        Self::with_config(id, RoomConfig::default(), crate::sample_questions())
    }

    /// Creates a room with explicit capacity limits and questions.
    pub fn with_config(
        id: RoomId,
        config: RoomConfig,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            id,
            config,
            questions,
            created_at: Instant::now(),
            inner: RwLock::new(RoomInner {
                status: RoomStatus::Waiting,
                players: HashMap::new(),
                current: None,
                question_started_at_ms: 0,
                answers: HashMap::new(),
            }),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// The full (unredacted) question at `index`. Server-side only.
    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub async fn status(&self) -> RoomStatus {
        self.inner.read().await.status
    }

    pub async fn player_count(&self) -> usize {
        self.inner.read().await.players.len()
    }

    /// Adds a player to the room.
    ///
    /// Rejected when the room is full or has left the Waiting state;
    /// nothing is mutated on rejection. Re-adding an id that is already
    /// present overwrites the existing player silently — callers that care
    /// must check membership first.
    pub async fn add_player(&self, player: Player) -> Result<(), RoomError> {
        let mut inner = self.inner.write().await;

        if inner.players.len() >= self.config.max_players {
            return Err(RoomError::Full(self.id.clone()));
        }
        if inner.status != RoomStatus::Waiting {
            return Err(RoomError::NotJoinable(self.id.clone()));
        }

        tracing::info!(
            room_id = %self.id,
            player_id = %player.id,
            username = %player.username,
            players = inner.players.len() + 1,
            "player joined room"
        );
        inner.players.insert(player.id.clone(), player);
        Ok(())
    }

    /// Removes a player if present, returning it. No-op otherwise.
    ///
    /// Any answer the player already recorded for the current question is
    /// kept, which is why [`Room::all_players_answered`] compares with `>=`.
    pub async fn remove_player(&self, id: &ClientId) -> Option<Player> {
        let mut inner = self.inner.write().await;
        let player = inner.players.remove(id)?;
        tracing::info!(
            room_id = %self.id,
            player_id = %id,
            username = %player.username,
            players = inner.players.len(),
            "player left room"
        );
        Some(player)
    }

    /// `true` iff the room is Waiting and has reached the minimum player
    /// count.
    pub async fn can_start(&self) -> bool {
        let inner = self.inner.read().await;
        inner.status == RoomStatus::Waiting
            && inner.players.len() >= self.config.min_players
    }

    /// Starts the quiz: status Playing, first question presented, every
    /// player Playing, question clock reset.
    ///
    /// Performs no validation — callers are responsible for checking
    /// [`Room::can_start`] first, and for serializing the check against
    /// this call if they can race.
    pub async fn start_game(&self) {
        let mut inner = self.inner.write().await;

        inner.status = RoomStatus::Playing;
        inner.current = Some(0);
        inner.question_started_at_ms = now_epoch_ms();
        for player in inner.players.values_mut() {
            player.status = PlayerStatus::Playing;
        }

        tracing::info!(
            room_id = %self.id,
            players = inner.players.len(),
            "game started"
        );
    }

    /// The redacted view of the question currently being asked, or `None`
    /// when no question is live.
    pub async fn current_question(&self) -> Option<QuestionView> {
        let inner = self.inner.read().await;
        inner
            .current
            .and_then(|i| self.questions.get(i))
            .map(Question::redacted)
    }

    /// The index of the question currently being asked.
    pub async fn current_index(&self) -> Option<usize> {
        self.inner.read().await.current
    }

    /// Records a player's answer for the current question and scores it.
    ///
    /// At most one submission per player per question is accepted; a second
    /// attempt fails without touching the player's stats. Elapsed time is
    /// `submitted_at_ms - question start`, clamped at zero, so a
    /// client-reported timestamp before the question started cannot push
    /// the score past the 150-point ceiling.
    pub async fn submit_answer(
        &self,
        player_id: &ClientId,
        answer: usize,
        submitted_at_ms: i64,
    ) -> Result<AnswerOutcome, RoomError> {
        let mut inner = self.inner.write().await;

        if inner.answers.contains_key(player_id) {
            return Err(RoomError::AlreadyAnswered(player_id.clone()));
        }
        if !inner.players.contains_key(player_id) {
            return Err(RoomError::UnknownPlayer(player_id.clone()));
        }
        let question = inner
            .current
            .and_then(|i| self.questions.get(i))
            .ok_or(RoomError::NoActiveQuestion)?;

        inner.answers.insert(player_id.clone(), answer);

        let submitted = submitted_at_ms.max(0) as u64;
        let elapsed_ms =
            submitted.saturating_sub(inner.question_started_at_ms);
        let correct = answer == question.correct_answer;
        let points = calculate_score(correct, elapsed_ms, question.limit_ms());

        let player = inner
            .players
            .get_mut(player_id)
            .ok_or_else(|| RoomError::UnknownPlayer(player_id.clone()))?;
        player.score += points;
        player.total_time += elapsed_ms;
        if correct {
            player.correct_count += 1;
        }
        let score = player.score;

        tracing::info!(
            room_id = %self.id,
            player_id = %player_id,
            correct,
            points,
            elapsed_ms,
            "answer recorded"
        );

        Ok(AnswerOutcome {
            correct,
            points,
            score,
            elapsed_ms,
        })
    }

    /// `true` once every current player has an answer on record.
    ///
    /// `>=` rather than `==`: a player who answered and then left keeps
    /// their entry in the answer map, so the count can exceed the live
    /// player count.
    pub async fn all_players_answered(&self) -> bool {
        let inner = self.inner.read().await;
        inner.answers.len() >= inner.players.len()
    }

    /// Advances to the next question.
    ///
    /// Clears the answer map and moves the index forward (presenting
    /// question 0 if the game somehow hasn't presented one yet). When the
    /// question list is exhausted the room transitions to Finished, every
    /// player is marked Finished, and `Ok(None)` is returned. Calling this
    /// on an already-Finished room is a rejected no-op.
    pub async fn next_question(
        &self,
    ) -> Result<Option<QuestionView>, RoomError> {
        let mut inner = self.inner.write().await;

        if inner.status == RoomStatus::Finished {
            return Err(RoomError::QuizFinished(self.id.clone()));
        }

        inner.answers.clear();
        let next = inner.current.map_or(0, |i| i + 1);
        inner.current = Some(next);

        let Some(question) = self.questions.get(next) else {
            inner.status = RoomStatus::Finished;
            for player in inner.players.values_mut() {
                player.status = PlayerStatus::Finished;
            }
            tracing::info!(room_id = %self.id, "quiz finished");
            return Ok(None);
        };

        inner.question_started_at_ms = now_epoch_ms();
        tracing::info!(
            room_id = %self.id,
            question = next,
            "moved to next question"
        );
        Ok(Some(question.redacted()))
    }

    /// Current standings: score descending, total time ascending, id
    /// ascending. The comparator is a total order, so equal (score, time)
    /// pairs always rank deterministically.
    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let inner = self.inner.read().await;
        let mut entries: Vec<LeaderboardEntry> = inner
            .players
            .values()
            .map(|p| LeaderboardEntry {
                id: p.id.clone(),
                username: p.username.clone(),
                score: p.score,
                total_time: p.total_time,
                correct_count: p.correct_count,
            })
            .collect();

        entries.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.total_time.cmp(&b.total_time))
                .then(a.id.cmp(&b.id))
        });
        entries
    }

    /// A redacted snapshot of the room, safe to serialize to clients.
    /// Players are listed in id order for stable output.
    pub async fn info(&self) -> RoomInfo {
        let inner = self.inner.read().await;
        let mut players: Vec<PlayerSummary> = inner
            .players
            .values()
            .map(|p| PlayerSummary {
                id: p.id.clone(),
                username: p.username.clone(),
                status: p.status,
            })
            .collect();
        players.sort_by(|a, b| a.id.cmp(&b.id));

        RoomInfo {
            id: self.id.clone(),
            status: inner.status,
            player_count: inner.players.len(),
            max_players: self.config.max_players,
            players,
        }
    }
}

/// The result of one accepted answer, echoed back to the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// Points awarded for this question.
    pub points: u32,
    /// The player's cumulative score after this question.
    pub score: u32,
    pub elapsed_ms: u64,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: ClientId,
    pub username: String,
    pub score: u32,
    /// Cumulative answer latency in milliseconds (tiebreak, lower wins).
    pub total_time: u64,
    pub correct_count: u32,
}

/// A player as it appears in a room snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: ClientId,
    pub username: String,
    pub status: PlayerStatus,
}

/// A redacted room snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: RoomId,
    pub status: RoomStatus,
    pub player_count: usize,
    pub max_players: usize,
    pub players: Vec<PlayerSummary>,
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
