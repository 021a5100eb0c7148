//! The hub: a message-passing actor that owns the session registry and
//! drives the quiz cycle.
//!
//! One Tokio task owns all mutable coordination state — the registry of
//! connected sessions, the room registry, and the per-room question timers.
//! Everything outside that task (session pumps, timer tasks) communicates
//! through typed [`HubCommand`]s on a single unbounded channel, so registry
//! changes are totally ordered: one command is fully processed before the
//! next is dequeued, and no two registry mutations are ever concurrent.
//!
//! Because every broadcast for a room is issued from this one loop, clients
//! observe a room's messages in the order its operations ran.
//!
//! Delivery onto a session's bounded outbound queue is non-blocking: a full
//! queue means a consumer that can't keep up, and that session is dropped
//! from the registry during the same broadcast. One saturated client can't
//! stall delivery to the rest of the room.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use quizhub_game::{Player, Room, RoomError, RoomRegistry};
use quizhub_protocol::{
    AnswerPayload, ClientId, Codec, ConnectedPayload, DisconnectedPayload,
    ErrorPayload, JoinRoomPayload, JsonCodec, Message, MessageKind, RoomId,
    RoomUsersPayload,
};

/// `next_question` payload: broadcast when a question closes, revealing
/// the answer now that scoring for it is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionClosedPayload {
    pub question_id: u32,
    pub correct_answer: usize,
}

/// A session as the hub sees it: the room/username tags set by `join_room`
/// and the sending half of the session's bounded outbound queue.
struct SessionEntry {
    username: String,
    room: Option<RoomId>,
    outbound: mpsc::Sender<Vec<u8>>,
}

/// Commands processed by the hub's event loop.
enum HubCommand {
    /// A new connection registered its outbound queue.
    Register {
        id: ClientId,
        outbound: mpsc::Sender<Vec<u8>>,
    },
    /// A connection went away (or is being force-dropped). Idempotent.
    Unregister { id: ClientId },
    /// A decoded message arrived from a session's reader pump.
    Inbound { id: ClientId, message: Message },
    /// A question timer elapsed. Ignored if the room has moved on.
    QuestionTimeout {
        room: RoomId,
        question_index: usize,
    },
}

/// Handle for enqueueing commands to a running [`Hub`]. Cheap to clone.
///
/// Sends never block; if the hub task is gone (server shutdown) they are
/// silently dropped.
#[derive(Clone)]
pub struct HubHandle {
    sender: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    /// Registers a session and its outbound queue.
    pub fn register(&self, id: ClientId, outbound: mpsc::Sender<Vec<u8>>) {
        let _ = self.sender.send(HubCommand::Register { id, outbound });
    }

    /// Deregisters a session. Safe to call more than once.
    pub fn unregister(&self, id: &ClientId) {
        let _ = self
            .sender
            .send(HubCommand::Unregister { id: id.clone() });
    }

    /// Forwards a decoded client message, tagged with its session.
    pub fn inbound(&self, id: &ClientId, message: Message) {
        let _ = self.sender.send(HubCommand::Inbound {
            id: id.clone(),
            message,
        });
    }

    fn question_timeout(&self, room: RoomId, question_index: usize) {
        let _ = self.sender.send(HubCommand::QuestionTimeout {
            room,
            question_index,
        });
    }
}

/// The hub actor state. Constructed with [`Hub::new`], consumed by
/// [`Hub::run`] inside its own task.
pub struct Hub {
    sessions: HashMap<ClientId, SessionEntry>,
    rooms: RoomRegistry,
    /// Armed question timers, one per playing room.
    timers: HashMap<RoomId, JoinHandle<()>>,
    handle: HubHandle,
    receiver: mpsc::UnboundedReceiver<HubCommand>,
    codec: JsonCodec,
}

impl Hub {
    /// Creates a hub and the handle used to feed it.
    ///
    /// The hub is an explicitly constructed value, not a global: tests run
    /// as many independent hubs as they like.
    pub fn new() -> (Self, HubHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = HubHandle { sender };
        let hub = Self {
            sessions: HashMap::new(),
            rooms: RoomRegistry::new(),
            timers: HashMap::new(),
            handle: handle.clone(),
            receiver,
            codec: JsonCodec,
        };
        (hub, handle)
    }

    /// Runs the event loop until every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!("hub started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                HubCommand::Register { id, outbound } => {
                    self.handle_register(id, outbound);
                }
                HubCommand::Unregister { id } => {
                    self.handle_unregister(id).await;
                }
                HubCommand::Inbound { id, message } => {
                    self.handle_inbound(id, message).await;
                }
                HubCommand::QuestionTimeout {
                    room,
                    question_index,
                } => {
                    self.handle_question_timeout(room, question_index).await;
                }
            }
        }

        tracing::info!("hub stopped");
    }

    // -----------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------

    fn handle_register(
        &mut self,
        id: ClientId,
        outbound: mpsc::Sender<Vec<u8>>,
    ) {
        self.sessions.insert(
            id.clone(),
            SessionEntry {
                username: String::new(),
                room: None,
                outbound,
            },
        );
        tracing::info!(client_id = %id, clients = self.sessions.len(), "client registered");

        self.send_to(
            &id,
            MessageKind::Connected,
            &ConnectedPayload {
                client_id: id.clone(),
            },
        );
    }

    async fn handle_unregister(&mut self, id: ClientId) {
        // Dropping the entry drops the outbound sender: the writer pump
        // drains whatever is already queued and exits.
        let Some(entry) = self.sessions.remove(&id) else {
            return;
        };
        tracing::info!(client_id = %id, clients = self.sessions.len(), "client unregistered");

        let Some(room_id) = entry.room else {
            return;
        };
        self.broadcast(
            &room_id,
            MessageKind::Disconnected,
            &DisconnectedPayload {
                client_id: id.clone(),
                username: entry.username.clone(),
            },
        );
        self.drop_from_room(&id, &room_id).await;
    }

    /// Removes a departed player from their room and closes the current
    /// question early if everyone still present has now answered.
    async fn drop_from_room(&mut self, id: &ClientId, room_id: &RoomId) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        if let Some(player) = room.remove_player(id).await {
            self.broadcast(
                room_id,
                MessageKind::RoomUsers,
                &RoomUsersPayload {
                    message: format!("{} left the room", player.username),
                },
            );
        }
        if room.status().await.is_playing()
            && room.player_count().await > 0
            && room.all_players_answered().await
        {
            self.close_question(room_id, &room).await;
        }
    }

    // -----------------------------------------------------------------
    // Inbound dispatch
    // -----------------------------------------------------------------

    async fn handle_inbound(&mut self, id: ClientId, message: Message) {
        if !self.sessions.contains_key(&id) {
            tracing::debug!(client_id = %id, "message from unregistered session, ignoring");
            return;
        }

        match message.kind {
            MessageKind::JoinRoom => self.handle_join_room(id, &message).await,
            MessageKind::LeaveRoom => self.handle_leave_room(id).await,
            MessageKind::GameStart => self.handle_game_start(id).await,
            MessageKind::SubmitAnswer => {
                self.handle_submit_answer(id, &message).await;
            }
            other => {
                tracing::warn!(
                    client_id = %id,
                    kind = %other,
                    "unsupported message type from client, dropping"
                );
            }
        }
    }

    async fn handle_join_room(&mut self, id: ClientId, message: &Message) {
        let payload: JoinRoomPayload = match message.payload() {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(
                    client_id = %id,
                    error = %e,
                    "bad join_room payload, dropping"
                );
                return;
            }
        };

        // A session joining while tagged with a different room moves: it
        // leaves the old room before the new one admits it.
        let previous = self
            .sessions
            .get_mut(&id)
            .and_then(|e| e.room.take_if(|r| *r != payload.room_id));
        if let Some(old) = previous {
            self.drop_from_room(&id, &old).await;
        }

        let room = self.rooms.get_or_create(&payload.room_id);
        let player = Player::new(id.clone(), payload.username.clone());
        if let Err(e) = room.add_player(player).await {
            tracing::debug!(
                client_id = %id,
                room_id = %payload.room_id,
                error = %e,
                "join rejected"
            );
            self.send_error(&id, &e.to_string());
            return;
        }

        // The session is tagged only after the room admitted the player,
        // so a rejected join leaves the session roomless.
        if let Some(entry) = self.sessions.get_mut(&id) {
            entry.username = payload.username.clone();
            entry.room = Some(payload.room_id.clone());
        }
        tracing::info!(
            client_id = %id,
            room_id = %payload.room_id,
            username = %payload.username,
            "client joined room"
        );

        self.broadcast(
            &payload.room_id,
            MessageKind::RoomUsers,
            &RoomUsersPayload {
                message: format!("{} joined the room", payload.username),
            },
        );
    }

    async fn handle_leave_room(&mut self, id: ClientId) {
        let Some(entry) = self.sessions.get_mut(&id) else {
            return;
        };
        let Some(room_id) = entry.room.take() else {
            return;
        };
        tracing::info!(client_id = %id, room_id = %room_id, "client left room");
        self.drop_from_room(&id, &room_id).await;
    }

    async fn handle_game_start(&mut self, id: ClientId) {
        let Some(room_id) = self.session_room(&id) else {
            self.send_error(&id, "join a room first");
            return;
        };
        // The room must exist: the session tag is only set on admission.
        let Some(room) = self.rooms.get(&room_id) else {
            self.send_error(&id, "room not found");
            return;
        };

        if !room.can_start().await {
            let reason = RoomError::NotReady(room_id.clone());
            self.send_error(&id, &reason.to_string());
            return;
        }
        room.start_game().await;

        let info = room.info().await;
        self.broadcast(&room_id, MessageKind::GameStart, &info);
        self.present_question(&room_id, &room).await;
    }

    async fn handle_submit_answer(&mut self, id: ClientId, message: &Message) {
        let payload: AnswerPayload = match message.payload() {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(
                    client_id = %id,
                    error = %e,
                    "bad submit_answer payload, dropping"
                );
                return;
            }
        };

        let Some(room_id) = self.session_room(&id) else {
            self.send_error(&id, "join a room first");
            return;
        };
        let Some(room) = self.rooms.get(&room_id) else {
            self.send_error(&id, "room not found");
            return;
        };

        // Answers addressed to a question that already closed are stale:
        // accepting them would score against the wrong question.
        let Some(view) = room.current_question().await else {
            self.send_error(&id, "no question is active");
            return;
        };
        if view.id != payload.question_id {
            self.send_error(&id, "answer is for a stale question");
            return;
        }

        match room
            .submit_answer(&id, payload.answer, payload.timestamp)
            .await
        {
            Ok(outcome) => {
                self.send_to(&id, MessageKind::AnswerResult, &outcome);
                if room.all_players_answered().await {
                    self.close_question(&room_id, &room).await;
                }
            }
            Err(e) => {
                tracing::debug!(
                    client_id = %id,
                    room_id = %room_id,
                    error = %e,
                    "answer rejected"
                );
                self.send_error(&id, &e.to_string());
            }
        }
    }

    // -----------------------------------------------------------------
    // Question cycle
    // -----------------------------------------------------------------

    /// Broadcasts the room's current question and arms its timer.
    async fn present_question(&mut self, room_id: &RoomId, room: &Arc<Room>) {
        let Some(view) = room.current_question().await else {
            return;
        };
        let Some(index) = room.current_index().await else {
            return;
        };
        let time_limit = view.time_limit;
        self.broadcast(room_id, MessageKind::Question, &view);
        self.arm_timer(room_id.clone(), index, Duration::from_secs(time_limit));
    }

    /// Closes the current question: reveal, standings, then either the
    /// next question or the end of the game. Runs when every player has
    /// answered or the time limit elapsed.
    async fn close_question(&mut self, room_id: &RoomId, room: &Arc<Room>) {
        if let Some(timer) = self.timers.remove(room_id) {
            timer.abort();
        }

        if let Some(question) =
            room.current_index().await.and_then(|i| room.question_at(i))
        {
            self.broadcast(
                room_id,
                MessageKind::NextQuestion,
                &QuestionClosedPayload {
                    question_id: question.id,
                    correct_answer: question.correct_answer,
                },
            );
        }

        let standings = room.leaderboard().await;
        self.broadcast(room_id, MessageKind::Leaderboard, &standings);

        match room.next_question().await {
            Ok(Some(_)) => self.present_question(room_id, room).await,
            Ok(None) => {
                let final_standings = room.leaderboard().await;
                self.broadcast(
                    room_id,
                    MessageKind::GameEnd,
                    &final_standings,
                );
            }
            Err(e) => {
                tracing::debug!(room_id = %room_id, error = %e, "advance failed");
            }
        }
    }

    async fn handle_question_timeout(
        &mut self,
        room_id: RoomId,
        question_index: usize,
    ) {
        let Some(room) = self.rooms.get(&room_id) else {
            return;
        };
        // A timeout for a question the room already left is stale. The
        // guard also covers the case where the answers raced the timer:
        // close_question re-armed for a later question, and this firing
        // must not touch the newer timer.
        if !room.status().await.is_playing()
            || room.current_index().await != Some(question_index)
        {
            return;
        }
        tracing::info!(
            room_id = %room_id,
            question = question_index,
            "question timed out"
        );
        self.close_question(&room_id, &room).await;
    }

    /// Arms (or re-arms) the room's question timer: a delayed task that
    /// reports back through the command channel, so the timeout is
    /// processed with the same ordering guarantees as everything else.
    fn arm_timer(
        &mut self,
        room_id: RoomId,
        question_index: usize,
        after: Duration,
    ) {
        let handle = self.handle.clone();
        let task_room = room_id.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            handle.question_timeout(task_room, question_index);
        });
        if let Some(previous) = self.timers.insert(room_id, task) {
            previous.abort();
        }
    }

    // -----------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------

    fn session_room(&self, id: &ClientId) -> Option<RoomId> {
        self.sessions.get(id).and_then(|e| e.room.clone())
    }

    /// Encodes one message and fans it out to every session in the room.
    ///
    /// Best-effort per recipient: a session whose queue is full or closed
    /// is dropped from the registry inline. Everyone else still receives
    /// this message.
    fn broadcast<T: Serialize>(
        &mut self,
        room_id: &RoomId,
        kind: MessageKind,
        payload: &T,
    ) {
        let Some(frame) = self.encode(kind, payload) else {
            return;
        };

        let mut dropped = Vec::new();
        for (id, entry) in &self.sessions {
            if entry.room.as_ref() != Some(room_id) {
                continue;
            }
            if entry.outbound.try_send(frame.clone()).is_err() {
                dropped.push(id.clone());
            }
        }

        for id in dropped {
            tracing::warn!(
                client_id = %id,
                room_id = %room_id,
                kind = %kind,
                "outbound queue saturated, dropping client"
            );
            self.sessions.remove(&id);
        }
    }

    /// Sends one message to one session, with the same drop-on-overflow
    /// policy as broadcasts.
    fn send_to<T: Serialize>(
        &mut self,
        id: &ClientId,
        kind: MessageKind,
        payload: &T,
    ) {
        let Some(frame) = self.encode(kind, payload) else {
            return;
        };
        let Some(entry) = self.sessions.get(id) else {
            return;
        };
        if entry.outbound.try_send(frame).is_err() {
            tracing::warn!(
                client_id = %id,
                kind = %kind,
                "outbound queue saturated, dropping client"
            );
            self.sessions.remove(id);
        }
    }

    fn send_error(&mut self, id: &ClientId, message: &str) {
        self.send_to(
            id,
            MessageKind::Error,
            &ErrorPayload {
                message: message.to_string(),
            },
        );
    }

    fn encode<T: Serialize>(
        &self,
        kind: MessageKind,
        payload: &T,
    ) -> Option<Vec<u8>> {
        let message = match Message::new(kind, payload) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "failed to build message");
                return None;
            }
        };
        match self.codec.encode(&message) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "failed to encode message");
                None
            }
        }
    }
}
