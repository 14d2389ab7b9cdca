//! Deck construction and dealing.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::card::{Card, RankRange};

/// Errors from dealing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeckError {
    /// `deal` was asked to split a deck among zero players.
    #[error("cannot deal to zero players")]
    NoPlayers,
}

/// All `4N` cards in uniformly random order (Fisher–Yates via
/// `SliceRandom::shuffle`).
pub fn shuffled_deck<R: Rng + ?Sized>(range: RankRange, rng: &mut R) -> Vec<Card> {
    let mut deck: Vec<Card> = (0..range.deck_size()).map(Card).collect();
    deck.shuffle(rng);
    deck
}

/// Splits a deck round-robin: card `i` goes to player `i % player_count`,
/// preserving deck order within each hand. Hand sizes differ by at most
/// one; no card is dropped or duplicated.
pub fn deal(deck: &[Card], player_count: usize) -> Result<Vec<Vec<Card>>, DeckError> {
    if player_count == 0 {
        return Err(DeckError::NoPlayers);
    }
    let mut hands = vec![Vec::with_capacity(deck.len() / player_count + 1); player_count];
    for (i, &card) in deck.iter().enumerate() {
        hands[i % player_count].push(card);
    }
    Ok(hands)
}

/// Index of the hand holding the opening card, if any. A full deal always
/// has exactly one holder; `None` after a full deal signals a deck bug the
/// caller must treat as round-fatal.
pub fn opening_holder(hands: &[Vec<Card>], range: RankRange) -> Option<usize> {
    let opening = range.opening_card();
    hands.iter().position(|h| h.contains(&opening))
}
