//! The finished cutting plan handed to renderers and the HTTP layer.

use serde::Serialize;

use crate::ledger::DemandLedger;
use crate::metrics::Metrics;
use crate::supply::Sheet;
use crate::types::{Placement, Rect};

/// A sheet that received at least one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpenedSheet {
    /// Position in the pool; matches `Placement::sheet_index`.
    pub index: usize,
    #[serde(flatten)]
    pub size: Rect,
    pub pieces: usize,
}

/// Declared size still owed after the pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnmetDemand {
    #[serde(flatten)]
    pub size: Rect,
    pub remaining: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    /// In commit order.
    pub placements: Vec<Placement>,
    pub opened_sheets: Vec<OpenedSheet>,
    /// Pieces no available sheet could take, at their declared size.
    pub unplaceable: Vec<Rect>,
    pub unmet_demand: Vec<UnmetDemand>,
    /// Fill ratio and trim loss over the opened sheets only. Reported for inventory
    /// packs as well, where the denominator is the summed area of the opened sheets;
    /// with a single unbounded sheet size this is `sheets * sheet area`.
    /// `None` when no sheet received a piece.
    #[serde(flatten)]
    pub metrics: Option<Metrics>,
    /// Overlap checks spent by the search.
    pub checks: u64,
}

impl Layout {
    /// Packages the search state. Sheets left empty are not reported as opened.
    pub(crate) fn assemble(
        sheets: Vec<Sheet>,
        placements: Vec<Placement>,
        unplaceable: Vec<Rect>,
        ledger: &DemandLedger,
        checks: u64,
    ) -> Self {
        let opened_sheets: Vec<OpenedSheet> = sheets
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| OpenedSheet {
                index: s.index(),
                size: s.size(),
                pieces: s.occupied().len(),
            })
            .collect();
        let metrics = Metrics::compute(&placements, opened_sheets.iter().map(|s| s.size));
        let unmet_demand = ledger
            .entries()
            .map(|(size, remaining)| UnmetDemand { size, remaining })
            .collect();

        Self {
            placements,
            opened_sheets,
            unplaceable,
            unmet_demand,
            metrics,
            checks,
        }
    }

    pub fn sheet_count(&self) -> usize {
        self.opened_sheets.len()
    }

    pub fn placements_on(&self, sheet_index: usize) -> impl Iterator<Item = &Placement> + '_ {
        self.placements
            .iter()
            .filter(move |p| p.sheet_index == sheet_index)
    }

    /// Placed sizes in first-seen order, one entry per distinct orientation.
    pub fn distinct_sizes(&self) -> Vec<Rect> {
        let mut sizes: Vec<Rect> = Vec::new();
        for p in &self.placements {
            if !sizes.contains(&p.rect) {
                sizes.push(p.rect);
            }
        }
        sizes
    }
}
