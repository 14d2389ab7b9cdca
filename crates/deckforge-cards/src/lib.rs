//! Pure rules engine for the Deckforge shedding game.
//!
//! Everything here is deterministic given its inputs (randomness comes in
//! through explicit `Rng` parameters) and free of I/O, async, and room
//! state — the room and game crates drive these functions; nothing drives
//! back.
//!
//! - [`card`] — card encoding, rank ranges, the internal-rank remapping.
//! - [`combo`] — combination classification and comparison.
//! - [`deck`] — shuffling and round-robin dealing.
//! - [`board`] — the shared display grid for accepted runs.
//! - [`score`] — round scoring (aggregate + pairwise transfers).
//! - [`rating`] — competition ranking and Gaussian skill updates.

pub mod board;
pub mod card;
pub mod combo;
pub mod deck;
pub mod rating;
pub mod score;

pub use board::{Board, PlacedCard, Placement};
pub use card::{Card, RankRange, SUITS};
pub use combo::{Combo, MadeCategory, evaluate, evaluate_made, evaluate_simple};
pub use deck::{DeckError, deal, opening_holder, shuffled_deck};
pub use rating::{RatedPlayer, Rating, rank_players, update_ratings};
pub use score::{ScoreInput, aggregate_deltas, net_transfers, strong_count, transfer_matrix};
