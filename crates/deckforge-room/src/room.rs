//! Room actor: an isolated Tokio task that owns one game instance.
//!
//! Each room runs in its own task and is reachable only through an mpsc
//! channel, so every mutation of the game state is serialized — joins,
//! disconnects, client messages, and timer firings are applied strictly
//! one at a time, in arrival order.

use std::collections::{HashMap, HashSet};

use deckforge_protocol::{PlayerId, Recipient, RoomId};
use tokio::sync::{mpsc, oneshot};

use crate::{GameLogic, Outcome, RoomConfig, RoomError};

/// Channel sender for delivering game events to a player's connection
/// handler. Unbounded and fire-and-forget: one slow or dead receiver
/// never stalls the room.
pub type PlayerSender<G> = mpsc::UnboundedSender<<G as GameLogic>::ServerMessage>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand<G: GameLogic> {
    /// Add (or re-attach) a player. The game decides, via `guest_key`,
    /// whether this is a fresh seat or a reconnection.
    Join {
        player_id: PlayerId,
        guest_key: String,
        sender: PlayerSender<G>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// The player's connection ended. Membership survives until the game
    /// evicts the seat.
    Disconnect { player_id: PlayerId },

    /// Deliver a game message from a player.
    Message {
        sender: PlayerId,
        msg: G::ClientMessage,
    },

    /// A scheduled timer fired.
    Timer { timer: G::Timer },

    /// Request the current room metadata.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room.
    Shutdown,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    /// Current members, including disconnected seats awaiting grace.
    pub player_count: usize,
    pub max_players: usize,
}

impl RoomInfo {
    /// Whether the room has a free slot. The game may still refuse the
    /// actual join.
    pub fn has_capacity(&self) -> bool {
        self.player_count < self.max_players
    }
}

/// Handle to a running room actor. Cheap to clone.
pub struct RoomHandle<G: GameLogic> {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand<G>>,
}

impl<G: GameLogic> Clone for RoomHandle<G> {
    fn clone(&self) -> Self {
        Self { room_id: self.room_id, sender: self.sender.clone() }
    }
}

impl<G: GameLogic> RoomHandle<G> {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Asks the room to admit a player.
    pub async fn join(
        &self,
        player_id: PlayerId,
        guest_key: &str,
        sender: PlayerSender<G>,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                guest_key: guest_key.to_owned(),
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Reports a dropped connection (fire-and-forget).
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Disconnect { player_id })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Sends a game message to the room (fire-and-forget).
    pub async fn send_message(
        &self,
        sender: PlayerId,
        msg: G::ClientMessage,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Message { sender, msg })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside one Tokio task.
struct RoomActor<G: GameLogic> {
    room_id: RoomId,
    config: RoomConfig,
    members: HashSet<PlayerId>,
    /// Per-player outbound channels. A disconnected member has no entry.
    senders: HashMap<PlayerId, PlayerSender<G>>,
    game_state: G::State,
    receiver: mpsc::Receiver<RoomCommand<G>>,
    /// Weak handle to our own command channel, used to schedule timers.
    /// Weak so the actor itself never keeps its channel alive.
    self_sender: mpsc::WeakSender<RoomCommand<G>>,
}

impl<G: GameLogic> RoomActor<G> {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { player_id, guest_key, sender, reply } => {
                    let result = self.handle_join(player_id, &guest_key, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Disconnect { player_id } => {
                    self.handle_disconnect(player_id);
                }
                RoomCommand::Message { sender, msg } => {
                    self.handle_message(sender, msg);
                }
                RoomCommand::Timer { timer } => {
                    let outcome = G::on_timer(&mut self.game_state, timer);
                    self.apply(outcome);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_id = %self.room_id, "room shutting down");
                    break;
                }
            }

            if G::is_abandoned(&self.game_state) {
                tracing::info!(room_id = %self.room_id, "room abandoned");
                break;
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        guest_key: &str,
        sender: PlayerSender<G>,
    ) -> Result<(), RoomError> {
        if self.members.contains(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, self.room_id));
        }

        match G::on_join(&mut self.game_state, player_id, guest_key) {
            Ok(outcome) => {
                self.members.insert(player_id);
                self.senders.insert(player_id, sender);
                tracing::info!(
                    room_id = %self.room_id,
                    %player_id,
                    members = self.members.len(),
                    "player joined"
                );
                self.apply(outcome);
                Ok(())
            }
            Err(reason) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    %player_id,
                    %reason,
                    "join refused"
                );
                Err(RoomError::JoinRefused(reason))
            }
        }
    }

    fn handle_disconnect(&mut self, player_id: PlayerId) {
        if !self.members.contains(&player_id) {
            tracing::warn!(
                room_id = %self.room_id,
                %player_id,
                "disconnect for non-member, ignoring"
            );
            return;
        }
        // The connection is gone; membership stays until the game evicts
        // the seat (grace expiry or seat migration).
        self.senders.remove(&player_id);
        tracing::info!(room_id = %self.room_id, %player_id, "player disconnected");

        let outcome = G::on_disconnect(&mut self.game_state, player_id);
        self.apply(outcome);
    }

    fn handle_message(&mut self, sender: PlayerId, msg: G::ClientMessage) {
        if !self.members.contains(&sender) {
            tracing::warn!(
                room_id = %self.room_id,
                %sender,
                "message from non-member, ignoring"
            );
            return;
        }
        let outcome = G::handle_message(&mut self.game_state, sender, msg);
        self.apply(outcome);
    }

    /// Applies one outcome: evictions first (so departing seats miss the
    /// messages), then delivery, then timer scheduling.
    fn apply(&mut self, outcome: Outcome<G>) {
        for player_id in outcome.evict {
            self.members.remove(&player_id);
            self.senders.remove(&player_id);
            tracing::info!(
                room_id = %self.room_id,
                %player_id,
                members = self.members.len(),
                "player evicted"
            );
        }

        for (recipient, msg) in outcome.messages {
            match recipient {
                Recipient::All => {
                    for pid in &self.members {
                        self.send_to(*pid, msg.clone());
                    }
                }
                Recipient::Player(pid) => {
                    self.send_to(pid, msg);
                }
                Recipient::AllExcept(excluded) => {
                    for pid in &self.members {
                        if *pid != excluded {
                            self.send_to(*pid, msg.clone());
                        }
                    }
                }
            }
        }

        for (timer, delay) in outcome.timers {
            let weak = self.self_sender.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                // The room may be gone by now; a dead channel is fine.
                if let Some(tx) = weak.upgrade() {
                    let _ = tx.send(RoomCommand::Timer { timer }).await;
                }
            });
        }
    }

    /// Sends to a single player. Silently drops if the receiver is gone.
    fn send_to(&self, player_id: PlayerId, msg: G::ServerMessage) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            player_count: self.members.len(),
            max_players: self.config.max_players,
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room<G: GameLogic>(
    room_id: RoomId,
    config: RoomConfig,
    game_config: G::Config,
) -> RoomHandle<G> {
    let (tx, rx) = mpsc::channel(config.channel_size);

    let actor = RoomActor::<G> {
        room_id,
        members: HashSet::new(),
        senders: HashMap::new(),
        game_state: G::init(&game_config),
        config,
        receiver: rx,
        self_sender: tx.downgrade(),
    };

    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}
