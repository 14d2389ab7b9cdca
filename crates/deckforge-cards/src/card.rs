//! Card identity: encoding, decoding, and the rank remapping.
//!
//! A card is a single integer in `[0, 4N)` where `N` is the rank range for
//! the match ([`RankRange`]). The integer packs suit and rank:
//!
//! ```text
//! suit          = card / N        four suits, 0 (weakest) .. 3 (strongest)
//! display rank  = card % N + 1    what players see: 1..=N
//! internal rank = (card + N - 2) % N
//! ```
//!
//! The internal rank is the comparison order: display rank 3 is the
//! weakest (internal 0), ranks 4..N follow ascending, and display ranks
//! 1 and 2 are the two strongest (internal N-2 and N-1).

use serde::{Deserialize, Serialize};

use std::fmt;

/// Number of suits. Fixed for every rank range.
pub const SUITS: u8 = 4;

// ---------------------------------------------------------------------------
// RankRange
// ---------------------------------------------------------------------------

/// The rank range `N` for a match: ranks run 1..=N in each of four suits.
///
/// Derived from the player count so the deck stays proportionate:
/// 3 players → 9, 4 → 13, 5 → 15, anything else → 15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankRange(u8);

impl RankRange {
    /// Rank range for a given number of seated players.
    pub fn for_player_count(players: usize) -> Self {
        match players {
            3 => Self(9),
            4 => Self(13),
            _ => Self(15),
        }
    }

    /// The raw `N`.
    pub fn n(self) -> u8 {
        self.0
    }

    /// Total cards in a deck: always `4N`.
    pub fn deck_size(self) -> u8 {
        SUITS * self.0
    }

    /// The opening card: suit 0, display rank 3. Its holder leads the
    /// first turn of every round.
    pub fn opening_card(self) -> Card {
        Card(2)
    }
}

impl fmt::Display for RankRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1..={}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// A single card, encoded as an integer in `[0, 4N)`.
///
/// `#[serde(transparent)]` keeps the wire format a plain number — clients
/// submit combinations as integer arrays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Card(pub u8);

impl Card {
    /// Builds a card from suit (0..4) and display rank (1..=N).
    ///
    /// Returns `None` when either component is out of range. Exactly one
    /// card exists per (suit, display rank) pair.
    pub fn encode(suit: u8, display_rank: u8, range: RankRange) -> Option<Self> {
        if suit >= SUITS || display_rank == 0 || display_rank > range.n() {
            return None;
        }
        Some(Self(suit * range.n() + display_rank - 1))
    }

    /// Whether this id fits inside the deck for `range`.
    pub fn in_range(self, range: RankRange) -> bool {
        self.0 < range.deck_size()
    }

    /// Suit, 0 (weakest) .. 3 (strongest).
    pub fn suit(self, range: RankRange) -> u8 {
        self.0 / range.n()
    }

    /// The rank shown to players: 1..=N.
    pub fn display_rank(self, range: RankRange) -> u8 {
        self.0 % range.n() + 1
    }

    /// The comparison rank: display rank 3 maps to 0 (weakest), display
    /// ranks 1 and 2 map to N-2 and N-1 (the two strongest).
    pub fn internal_rank(self, range: RankRange) -> u8 {
        (self.0 % range.n() + range.n() - 2) % range.n()
    }

    /// `(suit, internal_rank)` in one call.
    pub fn decode(self, range: RankRange) -> (u8, u8) {
        (self.suit(range), self.internal_rank(range))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
