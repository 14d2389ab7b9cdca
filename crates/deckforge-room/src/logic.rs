//! The `GameLogic` trait — the seam between the room framework and a game.
//!
//! The room actor owns the channel, the player senders, and the timers;
//! the game owns every rule. Each callback returns an [`Outcome`]
//! describing what the room should do on the game's behalf: deliver
//! messages, schedule timers, or evict players whose membership ended.

use std::time::Duration;

use deckforge_protocol::{PlayerId, Recipient};
use serde::{Serialize, de::DeserializeOwned};

use crate::RoomConfig;

/// The core trait a game implements.
///
/// Associated types define the shape of the game's data:
/// - `Config` — game settings fixed at room creation (round count, etc.)
/// - `State` — the full authoritative state, owned by one room actor
/// - `ClientMessage` / `ServerMessage` — the game's wire vocabulary
/// - `Timer` — deferred work the game schedules through outcomes
///
/// Every callback runs on the room actor's task, so no two callbacks for
/// one room ever overlap and `&mut State` is always exclusive.
pub trait GameLogic: Send + Sync + 'static {
    /// Game-specific configuration, fixed when the room is created.
    type Config: Send + Sync + Clone + Default + 'static;

    /// The full authoritative game state.
    type State: Send + 'static;

    /// Messages clients send (moves, actions).
    type ClientMessage: Send + Clone + Serialize + DeserializeOwned + 'static;

    /// Messages the server sends back (events, rejections, snapshots).
    type ServerMessage: Send + Clone + Serialize + DeserializeOwned + 'static;

    /// A deferred event. Scheduled via [`Outcome::schedule`], delivered
    /// back through [`GameLogic::on_timer`] on the room's own channel, so
    /// it runs under the same serialization as every live command and can
    /// re-check the state it fired against.
    type Timer: Send + 'static;

    /// Creates the state of a freshly created, empty room. Players arrive
    /// afterwards through [`GameLogic::on_join`].
    fn init(config: &Self::Config) -> Self::State;

    /// A connection wants to join (or rejoin) this room.
    ///
    /// `guest_key` is the caller's durable identity, stable across
    /// reconnects. The game decides whether this is a brand-new seat or a
    /// migration onto an existing one, and may refuse with a reason
    /// (room full, unknown key mid-game, etc.).
    fn on_join(
        state: &mut Self::State,
        player: PlayerId,
        guest_key: &str,
    ) -> Result<Outcome<Self>, String>;

    /// The player's connection is gone. Not a removal: the game decides
    /// what a disconnect means (usually marking the seat and scheduling a
    /// grace timer).
    fn on_disconnect(state: &mut Self::State, player: PlayerId) -> Outcome<Self>;

    /// A timer scheduled by an earlier outcome has fired.
    fn on_timer(state: &mut Self::State, timer: Self::Timer) -> Outcome<Self>;

    /// Processes a message from a room member. This is where game rules
    /// live.
    fn handle_message(
        state: &mut Self::State,
        sender: PlayerId,
        msg: Self::ClientMessage,
    ) -> Outcome<Self>;

    /// Whether the room has no reason to keep running (no seats left).
    /// Checked after every callback; `true` stops the actor.
    fn is_abandoned(state: &Self::State) -> bool;

    /// Room-level settings for this game type. Default: 8 seats.
    fn room_config() -> RoomConfig {
        RoomConfig::default()
    }
}

/// What a [`GameLogic`] callback asks the room actor to do.
pub struct Outcome<G: GameLogic + ?Sized> {
    /// Messages to deliver, in order.
    pub messages: Vec<(Recipient, G::ServerMessage)>,
    /// Timers to schedule.
    pub timers: Vec<(G::Timer, Duration)>,
    /// Players whose room membership ended (seat removed or migrated
    /// away). The actor drops their sender and membership.
    pub evict: Vec<PlayerId>,
}

impl<G: GameLogic + ?Sized> Outcome<G> {
    /// An outcome that does nothing.
    pub fn none() -> Self {
        Self { messages: Vec::new(), timers: Vec::new(), evict: Vec::new() }
    }

    /// Queues a message for one recipient set.
    pub fn tell(mut self, to: Recipient, msg: G::ServerMessage) -> Self {
        self.messages.push((to, msg));
        self
    }

    /// Queues a broadcast to every member.
    pub fn broadcast(self, msg: G::ServerMessage) -> Self {
        self.tell(Recipient::All, msg)
    }

    /// Schedules a timer to fire after `delay`.
    pub fn schedule(mut self, timer: G::Timer, delay: Duration) -> Self {
        self.timers.push((timer, delay));
        self
    }

    /// Marks a player's membership as ended.
    pub fn evicting(mut self, player: PlayerId) -> Self {
        self.evict.push(player);
        self
    }
}

impl<G: GameLogic + ?Sized> Default for Outcome<G> {
    fn default() -> Self {
        Self::none()
    }
}
