//! Round scoring.
//!
//! When a round ends, each remaining card costs its holder. Both scoring
//! views share one formula: a deficit of `d` cards owed to a party with
//! `s` strongest-rank cards costs `d * 2^s`.
//!
//! - The **aggregate** view measures every player against the largest
//!   remaining hand and is always broadcast.
//! - The **pairwise matrix** compares every ordered pair and drives the
//!   actual coin transfers (giver pays receiver), so balances conserve.

use serde::{Deserialize, Serialize};

use crate::card::{Card, RankRange};

/// Per-player scoring input for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreInput {
    /// Cards left in hand at round end.
    pub hand: u64,
    /// Cards of the strongest internal rank (display rank 2) left in hand.
    pub strong: u32,
}

/// Counts the strongest-rank cards in a hand.
pub fn strong_count(hand: &[Card], range: RankRange) -> u32 {
    let top = range.n() - 1;
    hand.iter()
        .filter(|c| c.internal_rank(range) == top)
        .count() as u32
}

/// Aggregate gains: each player below the largest hand gains
/// `(max_hand - hand) * 2^strong`; players at the largest hand gain 0.
pub fn aggregate_deltas(inputs: &[ScoreInput]) -> Vec<u64> {
    let max_hand = inputs.iter().map(|i| i.hand).max().unwrap_or(0);
    inputs
        .iter()
        .map(|i| (max_hand - i.hand) * (1u64 << i.strong))
        .collect()
}

/// Pairwise transfers: cell `(giver, receiver)` is
/// `(giver.hand - receiver.hand) * 2^(receiver.strong)` when the giver
/// holds more cards, else 0. Self-pairs are 0.
pub fn transfer_matrix(inputs: &[ScoreInput]) -> Vec<Vec<u64>> {
    inputs
        .iter()
        .map(|giver| {
            inputs
                .iter()
                .map(|receiver| {
                    giver
                        .hand
                        .checked_sub(receiver.hand)
                        .filter(|&d| d > 0)
                        .map_or(0, |d| d * (1u64 << receiver.strong))
                })
                .collect()
        })
        .collect()
}

/// Net balance change per player from a transfer matrix: received minus
/// paid. Sums to zero.
pub fn net_transfers(matrix: &[Vec<u64>]) -> Vec<i64> {
    let n = matrix.len();
    (0..n)
        .map(|p| {
            let received: u64 = (0..n).map(|g| matrix[g][p]).sum();
            let paid: u64 = matrix[p].iter().sum();
            received as i64 - paid as i64
        })
        .collect()
}
