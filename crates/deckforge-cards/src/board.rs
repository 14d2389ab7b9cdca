//! Board allocator: places accepted runs on a growable 2-D grid.
//!
//! The board is display state, not rules state — nothing about turn
//! legality depends on it. It exists so every client renders the same
//! table layout.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::card::Card;

/// Grid sizes in growth order. The board starts at the first and never
/// shrinks.
const GROWTH: [(usize, usize); 3] = [(4, 15), (5, 20), (6, 25)];

/// One occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedCard {
    pub row: usize,
    pub col: usize,
    pub card: Card,
    pub turn_id: u64,
}

/// Where a run landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    /// Set only in the degraded fallback: the largest grid had no valid
    /// slot and the run was stacked at (0, 0) over existing cards.
    pub overlapped: bool,
}

/// Growable placement grid.
#[derive(Debug, Clone)]
pub struct Board {
    step: usize,
    cells: Vec<Option<(Card, u64)>>,
}

impl Board {
    pub fn new() -> Self {
        let (rows, cols) = GROWTH[0];
        Self { step: 0, cells: vec![None; rows * cols] }
    }

    /// Current `(rows, cols)`.
    pub fn dimensions(&self) -> (usize, usize) {
        GROWTH[self.step]
    }

    /// Clears every cell but keeps the current size.
    pub fn reset(&mut self) {
        self.cells.fill(None);
    }

    /// Every occupied cell, for resync snapshots.
    pub fn snapshot(&self) -> Vec<PlacedCard> {
        let (_, cols) = self.dimensions();
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| {
                cell.map(|(card, turn_id)| PlacedCard {
                    row: i / cols,
                    col: i % cols,
                    card,
                    turn_id,
                })
            })
            .collect()
    }

    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        let (_, cols) = self.dimensions();
        self.cells[row * cols + col].is_some()
    }

    /// Places `cards` in consecutive columns, all tagged `turn_id`.
    ///
    /// A start column is valid iff the run's cells are free, and the cell
    /// before the run is free or at the row start, and the cell after is
    /// free or at the row end (one-cell buffer). The slot is chosen
    /// uniformly among all valid (row, col) pairs. When no slot exists the
    /// board grows one step and retries; when the largest size still has
    /// none, the run is stacked at (0, 0) regardless of overlap and the
    /// match continues in a degraded layout.
    pub fn place<R: Rng + ?Sized>(
        &mut self,
        cards: &[Card],
        turn_id: u64,
        rng: &mut R,
    ) -> Placement {
        loop {
            let slots = self.valid_slots(cards.len());
            if let Some(&(row, col)) = slots.choose(rng) {
                self.write_run(cards, turn_id, row, col);
                return Placement { row, col, overlapped: false };
            }
            if self.step + 1 < GROWTH.len() {
                self.grow();
                continue;
            }
            warn!(
                run_len = cards.len(),
                turn_id, "board full at largest size, stacking run at origin"
            );
            self.write_run(cards, turn_id, 0, 0);
            return Placement { row: 0, col: 0, overlapped: true };
        }
    }

    fn valid_slots(&self, len: usize) -> Vec<(usize, usize)> {
        let (rows, cols) = self.dimensions();
        if len == 0 || len > cols {
            return Vec::new();
        }
        let mut slots = Vec::new();
        for row in 0..rows {
            for col in 0..=cols - len {
                let run_free =
                    (col..col + len).all(|c| !self.is_occupied(row, c));
                let left_ok = col == 0 || !self.is_occupied(row, col - 1);
                let right_ok =
                    col + len == cols || !self.is_occupied(row, col + len);
                if run_free && left_ok && right_ok {
                    slots.push((row, col));
                }
            }
        }
        slots
    }

    fn write_run(&mut self, cards: &[Card], turn_id: u64, row: usize, col: usize) {
        let (_, cols) = self.dimensions();
        for (i, &card) in cards.iter().enumerate() {
            self.cells[row * cols + col + i] = Some((card, turn_id));
        }
    }

    /// Reallocates to the next size, keeping every occupied cell at its
    /// coordinates.
    fn grow(&mut self) {
        let old = self.snapshot();
        self.step += 1;
        let (rows, cols) = self.dimensions();
        debug!(rows, cols, "board grown");
        self.cells = vec![None; rows * cols];
        for placed in old {
            self.cells[placed.row * cols + placed.col] =
                Some((placed.card, placed.turn_id));
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
