//! Combination evaluation: classify and rank submitted card sets.
//!
//! Two families exist:
//!
//! - **Simple combos** (1–3 cards): all cards share one internal rank.
//!   Compared by raw internal rank, suit as tie-break.
//! - **Made hands** (exactly 5 cards): straight, flush, full house,
//!   four-plus-one, straight flush. Compared by category first, then by
//!   a re-indexed best-card value.
//!
//! Every function here is pure and total: malformed input produces `None`,
//! never a panic.

use serde::{Deserialize, Serialize};

use crate::card::{Card, RankRange};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// The category of a 5-card made hand, weakest first.
///
/// The derived `Ord` follows declaration order, which is exactly the
/// priority order: straight < flush < full house < four-plus-one <
/// straight flush.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum MadeCategory {
    Straight,
    Flush,
    FullHouse,
    FourPlusOne,
    StraightFlush,
}

/// A classified, rankable combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Combo {
    /// 1–3 cards of one internal rank.
    Simple { count: u8, value: u16 },
    /// Exactly 5 cards forming a made hand.
    Made { category: MadeCategory, value: u16 },
}

impl Combo {
    /// Number of cards this combination shape uses.
    pub fn count(&self) -> usize {
        match self {
            Self::Simple { count, .. } => *count as usize,
            Self::Made { .. } => 5,
        }
    }

    /// Whether this combination beats `other` under category rules.
    ///
    /// Shapes must match: a simple combo only beats a simple combo of the
    /// same count (strictly greater value); a made hand beats a made hand
    /// of strictly higher category, or the same category with strictly
    /// higher value. Mismatched shapes never beat each other — the turn
    /// machine rejects those before comparison anyway.
    pub fn beats(&self, other: &Combo) -> bool {
        match (self, other) {
            (
                Self::Simple { count: a, value: va },
                Self::Simple { count: b, value: vb },
            ) => a == b && va > vb,
            (
                Self::Made { category: ca, value: va },
                Self::Made { category: cb, value: vb },
            ) => ca > cb || (ca == cb && va > vb),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Classifies any submission. 0, 4, or more than 5 cards are never valid.
pub fn evaluate(cards: &[Card], range: RankRange) -> Option<Combo> {
    match cards.len() {
        1..=3 => evaluate_simple(cards, range),
        5 => evaluate_made(cards, range),
        _ => None,
    }
}

/// Evaluates a 1–3 card simple combo: valid iff every card shares one
/// internal rank. Value is `internal_rank * N + max(suit)`.
pub fn evaluate_simple(cards: &[Card], range: RankRange) -> Option<Combo> {
    if cards.is_empty() || cards.len() > 3 {
        return None;
    }
    if cards.iter().any(|c| !c.in_range(range)) {
        return None;
    }
    let rank = cards[0].internal_rank(range);
    if cards[1..].iter().any(|c| c.internal_rank(range) != rank) {
        return None;
    }
    let best_suit = cards
        .iter()
        .map(|c| c.suit(range))
        .max()
        .expect("non-empty checked above");
    Some(Combo::Simple {
        count: cards.len() as u8,
        value: rank as u16 * range.n() as u16 + best_suit as u16,
    })
}

/// Evaluates a 5-card made hand.
///
/// Value uses the re-indexed best card (see [`order_index`]); this
/// re-indexing deliberately does NOT apply to simple combos — the
/// asymmetry is part of the rules as shipped and is preserved as is.
pub fn evaluate_made(cards: &[Card], range: RankRange) -> Option<Combo> {
    if cards.len() != 5 || cards.iter().any(|c| !c.in_range(range)) {
        return None;
    }

    let suits: Vec<u8> = cards.iter().map(|c| c.suit(range)).collect();
    let ranks: Vec<u8> = cards.iter().map(|c| c.internal_rank(range)).collect();

    let flush = suits.iter().all(|&s| s == suits[0]);
    let straight = is_straight(&ranks, range);

    let category = if straight && flush {
        MadeCategory::StraightFlush
    } else if let Some(cat) = histogram_category(&ranks) {
        cat
    } else if flush {
        MadeCategory::Flush
    } else if straight {
        MadeCategory::Straight
    } else {
        return None;
    };

    Some(Combo::Made {
        category,
        value: made_value(cards, range),
    })
}

/// Re-indexes an internal rank for 5-card value comparison:
/// `0 → N-2`, `1 → N-1`, otherwise `r - 2`.
pub fn order_index(rank: u8, range: RankRange) -> u8 {
    match rank {
        0 => range.n() - 2,
        1 => range.n() - 1,
        r => r - 2,
    }
}

/// Picks the best card of a made hand (highest `order_index`, suit as
/// tie-break) and folds it into a comparable value.
fn made_value(cards: &[Card], range: RankRange) -> u16 {
    let best = cards
        .iter()
        .max_by_key(|c| {
            (order_index(c.internal_rank(range), range), c.suit(range))
        })
        .expect("made hands have five cards");
    order_index(best.internal_rank(range), range) as u16 * range.n() as u16
        + best.suit(range) as u16
}

/// Five distinct internal ranks, consecutive under cyclic adjacency mod N.
///
/// The one exception: the exact set `{N-3, N-2, N-1, 0, 1}` — the wrap
/// spanning the two strongest special ranks and the weakest rank — is
/// never a straight, whatever the suits.
fn is_straight(ranks: &[u8], range: RankRange) -> bool {
    let n = range.n();
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() != 5 {
        return false;
    }

    let forbidden = [0, 1, n - 3, n - 2, n - 1];
    let mut forbidden = forbidden.to_vec();
    forbidden.sort_unstable();
    if sorted == forbidden {
        return false;
    }

    // Consecutive iff some member starts a run of five successors mod N.
    sorted.iter().any(|&start| {
        (0..5).all(|i| sorted.contains(&((start + i) % n)))
    })
}

/// Detects four-plus-one and full house from the rank histogram.
fn histogram_category(ranks: &[u8]) -> Option<MadeCategory> {
    let mut counts = std::collections::HashMap::new();
    for &r in ranks {
        *counts.entry(r).or_insert(0u8) += 1;
    }
    let mut shape: Vec<u8> = counts.values().copied().collect();
    shape.sort_unstable();
    match shape.as_slice() {
        [1, 4] => Some(MadeCategory::FourPlusOne),
        [2, 3] => Some(MadeCategory::FullHouse),
        _ => None,
    }
}

// =========================================================================
// Tests
// =========================================================================
