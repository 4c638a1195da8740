//! Demand expansion, ordering and the per-orientation remaining-count ledger.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::{PieceDemand, Rect};

/// Validated demand lines, in submission order.
pub fn validate_demands(demands: &[PieceDemand]) -> Result<Vec<(Rect, u32)>> {
    demands.iter().map(PieceDemand::validate).collect()
}

/// One piece per unit of demand, largest area first.
///
/// The sort is stable, so equal-area pieces keep their submission order.
pub fn expand_demands(demands: &[(Rect, u32)]) -> Vec<Rect> {
    let mut pieces: Vec<Rect> = demands
        .iter()
        .flat_map(|&(rect, qty)| std::iter::repeat_n(rect, qty as usize))
        .collect();
    pieces.sort_by(|a, b| b.area().cmp(&a.area()));
    pieces
}

/// Remaining count per declared orientation.
///
/// Keys are the sizes as submitted; lines with identical keys accumulate. A lookup by
/// a piece's size also sees the entry stored under its rotation, so a `3x2` cut can be
/// charged against a `2x3` line. Placing a piece charges the entry matching the placed
/// orientation first and the rotated entry only if the exact one is gone; entries that
/// reach zero are removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemandLedger {
    remaining: BTreeMap<Rect, u64>,
}

impl DemandLedger {
    pub fn new(demands: &[(Rect, u32)]) -> Self {
        let mut remaining = BTreeMap::new();
        for &(rect, qty) in demands {
            if qty > 0 {
                *remaining.entry(rect).or_insert(0) += qty as u64;
            }
        }
        Self { remaining }
    }

    /// Remaining count stored under exactly this orientation.
    pub fn remaining(&self, key: Rect) -> u64 {
        self.remaining.get(&key).copied().unwrap_or(0)
    }

    /// Remaining count for a piece in either orientation.
    #[cfg(test)]
    pub fn remaining_any(&self, piece: Rect) -> u64 {
        let swapped = if piece.is_square() {
            0
        } else {
            self.remaining(piece.rotated())
        };
        self.remaining(piece) + swapped
    }

    /// Charges one placed piece and returns the key it was charged against.
    ///
    /// `None` means neither orientation had demand left, which the search never
    /// produces for pieces it expanded from the same demand list.
    pub fn consume(&mut self, placed: Rect) -> Option<Rect> {
        let key = [placed, placed.rotated()]
            .into_iter()
            .find(|key| self.remaining.contains_key(key))?;
        if let Some(count) = self.remaining.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.remaining.remove(&key);
            }
        }
        Some(key)
    }

    pub fn total_remaining(&self) -> u64 {
        self.remaining.values().sum()
    }

    pub fn is_settled(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (Rect, u64)> + '_ {
        self.remaining.iter().map(|(&k, &v)| (k, v))
    }
}
