//! The per-room aggregate: seats, rotation, board, and match phase.
//!
//! One `Table` is owned by one room actor; every mutation happens on
//! that actor's task, so nothing here is synchronized. The rotation list
//! is the authoritative turn order — the seat map is keyed by session id
//! and never relied on for ordering.

use std::collections::HashMap;

use deckforge_cards::{Board, Card, Combo, RankRange};
use deckforge_protocol::PlayerId;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::messages::{GameEvent, SeatSummary};

/// Every seat starts the match with this balance.
pub const STARTING_BALANCE: i64 = 100;

/// Game settings fixed at room creation.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Rounds per match. The host can change this in the lobby.
    pub total_rounds: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { total_rounds: 3 }
    }
}

/// Where the match is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Gathering players; nicknames, readiness, and round count are
    /// settable.
    Lobby,
    /// Rounds are being played.
    Playing,
    /// The match finished (or aborted); awaiting `PlayAgain`.
    Over,
}

/// The currently unbeaten combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lead {
    pub combo: Combo,
    /// Rotation index of the player who set it. The cycle closes when
    /// the turn wraps back onto this index.
    pub leader: usize,
}

/// One player's seat at the table.
#[derive(Debug, Clone)]
pub struct Seat {
    /// Current session id. Rewritten in place when the player reconnects
    /// with a new connection.
    pub player_id: PlayerId,
    /// Durable continuity key; identifies the person across reconnects.
    pub guest_key: String,
    pub nickname: String,
    pub balance: i64,
    pub connected: bool,
    pub ready: bool,
    /// Passed this cycle.
    pub passed: bool,
    /// Cosmetic score display preference.
    pub easy_display: bool,
    pub hand: Vec<Card>,
    /// Client-chosen hand order, restored on resync. Always the same
    /// multiset as `hand`.
    pub sorted_hand: Vec<Card>,
}

impl Seat {
    pub fn new(player_id: PlayerId, guest_key: &str) -> Self {
        Self {
            player_id,
            guest_key: guest_key.to_owned(),
            nickname: String::new(),
            balance: STARTING_BALANCE,
            connected: true,
            ready: false,
            passed: false,
            easy_display: false,
            hand: Vec::new(),
            sorted_hand: Vec::new(),
        }
    }
}

/// Full authoritative state of one table.
#[derive(Debug)]
pub struct Table {
    /// Turn order. Authoritative and independent of map iteration order.
    pub rotation: Vec<PlayerId>,
    pub seats: HashMap<PlayerId, Seat>,
    pub host: Option<PlayerId>,
    pub phase: Phase,
    /// Current round, 1-based while playing, 0 otherwise.
    pub round: u32,
    pub total_rounds: u32,
    /// Rank range N, fixed when the match starts.
    pub range: RankRange,
    pub board: Board,
    pub lead: Option<Lead>,
    /// Rotation index of the last accepted submitter; the index-wrap
    /// cycle trigger compares against this.
    pub last_accepted: Option<usize>,
    /// Rotation index of the acting player.
    pub turn: usize,
    /// Monotonic id shared by all cards of one accepted submission.
    pub next_turn_id: u64,
    /// Set once the first player ever joins; an empty table that has
    /// hosted someone is abandoned, a freshly created one is not.
    pub ever_joined: bool,
    pub rng: StdRng,
}

impl Table {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            rotation: Vec::new(),
            seats: HashMap::new(),
            host: None,
            phase: Phase::Lobby,
            round: 0,
            total_rounds: config.total_rounds,
            range: RankRange::for_player_count(0),
            board: Board::new(),
            lead: None,
            last_accepted: None,
            turn: 0,
            next_turn_id: 1,
            ever_joined: false,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Rotation index of a player's seat.
    pub fn seat_index(&self, player: PlayerId) -> Option<usize> {
        self.rotation.iter().position(|p| *p == player)
    }

    /// The player whose turn it is, if a round is running.
    pub fn acting_player(&self) -> Option<PlayerId> {
        if self.phase != Phase::Playing {
            return None;
        }
        self.rotation.get(self.turn).copied()
    }

    /// The session id currently holding a guest key's seat.
    pub fn seat_for_guest_key(&self, guest_key: &str) -> Option<PlayerId> {
        self.seats
            .values()
            .find(|s| s.guest_key == guest_key)
            .map(|s| s.player_id)
    }

    /// Seat summaries in rotation order.
    pub fn seat_summaries(&self) -> Vec<SeatSummary> {
        self.rotation
            .iter()
            .filter_map(|id| self.seats.get(id))
            .map(|seat| SeatSummary {
                player_id: seat.player_id,
                nickname: seat.nickname.clone(),
                balance: seat.balance,
                connected: seat.connected,
                ready: seat.ready,
                hand_count: seat.hand.len(),
            })
            .collect()
    }

    /// The lobby snapshot sent to joiners and after a rematch reset.
    pub fn roster_event(&self) -> GameEvent {
        GameEvent::Roster {
            players: self.seat_summaries(),
            host: self.host,
            round: self.round,
            total_rounds: self.total_rounds,
        }
    }

    /// The private snapshot that lets a rejoiner rebuild their view.
    pub fn resync_event(&self, player: PlayerId) -> GameEvent {
        let hand = self
            .seats
            .get(&player)
            .map(|s| s.sorted_hand.clone())
            .unwrap_or_default();
        let (rows, cols) = self.board.dimensions();
        GameEvent::Resync {
            phase: self.phase,
            round: self.round,
            total_rounds: self.total_rounds,
            rotation: self.rotation.clone(),
            host: self.host,
            seats: self.seat_summaries(),
            hand,
            board: self.board.snapshot(),
            rows,
            cols,
            lead: self.lead.map(|l| l.combo),
            leader: self
                .lead
                .and_then(|l| self.rotation.get(l.leader).copied()),
            turn: self.acting_player(),
        }
    }

    /// Clears everything a round leaves behind. Balances and seats are
    /// untouched.
    pub fn clear_round_state(&mut self) {
        self.board.reset();
        self.lead = None;
        self.last_accepted = None;
        self.turn = 0;
        for seat in self.seats.values_mut() {
            seat.passed = false;
            seat.hand.clear();
            seat.sorted_hand.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(ids: &[u64]) -> Table {
        let mut t = Table::new(&GameConfig::default());
        for id in ids {
            let pid = PlayerId(*id);
            // Front insertion mirrors the join path.
            t.rotation.insert(0, pid);
            t.seats
                .insert(pid, Seat::new(pid, &format!("guest-{id}")));
        }
        t.ever_joined = !ids.is_empty();
        t.host = t.rotation.first().copied();
        t
    }

    #[test]
    fn test_seat_index_follows_rotation_not_map() {
        let t = table_with(&[1, 2, 3]);
        // Front insertion reverses the join order.
        assert_eq!(t.rotation, vec![PlayerId(3), PlayerId(2), PlayerId(1)]);
        assert_eq!(t.seat_index(PlayerId(3)), Some(0));
        assert_eq!(t.seat_index(PlayerId(1)), Some(2));
        assert_eq!(t.seat_index(PlayerId(9)), None);
    }

    #[test]
    fn test_acting_player_only_while_playing() {
        let mut t = table_with(&[1, 2, 3]);
        assert_eq!(t.acting_player(), None);

        t.phase = Phase::Playing;
        t.turn = 1;
        assert_eq!(t.acting_player(), Some(PlayerId(2)));
    }

    #[test]
    fn test_seat_for_guest_key_finds_current_session() {
        let t = table_with(&[1, 2]);
        assert_eq!(t.seat_for_guest_key("guest-2"), Some(PlayerId(2)));
        assert_eq!(t.seat_for_guest_key("guest-9"), None);
    }

    #[test]
    fn test_clear_round_state_keeps_balances() {
        let mut t = table_with(&[1, 2]);
        t.seats.get_mut(&PlayerId(1)).unwrap().balance = 137;
        t.seats.get_mut(&PlayerId(1)).unwrap().hand.push(Card(0));
        t.seats.get_mut(&PlayerId(2)).unwrap().passed = true;
        t.last_accepted = Some(1);

        t.clear_round_state();

        assert_eq!(t.seats[&PlayerId(1)].balance, 137);
        assert!(t.seats[&PlayerId(1)].hand.is_empty());
        assert!(!t.seats[&PlayerId(2)].passed);
        assert_eq!(t.last_accepted, None);
    }
}
