//! Stock supply and the pool of sheets opened during a pack.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ensure_within};
use crate::search::ScanBudget;
use crate::types::{Rect, Region, SheetStock, checked_rect};

/// Where sheets come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Supply {
    /// Any number of sheets of one size, opened on demand.
    Unbounded { width: i64, height: i64 },
    /// A fixed list of sheets, used in the given order. Nothing beyond it may be opened.
    Inventory(Vec<SheetStock>),
}

impl Supply {
    pub fn unbounded(width: i64, height: i64) -> Self {
        Supply::Unbounded { width, height }
    }

    pub fn inventory(stock: impl IntoIterator<Item = (i64, i64, i64)>) -> Self {
        Supply::Inventory(
            stock
                .into_iter()
                .map(|(w, h, q)| SheetStock::new(w, h, q))
                .collect(),
        )
    }
}

/// A stock sheet and the regions already cut from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    index: usize,
    size: Rect,
    occupied: Vec<Region>,
}

impl Sheet {
    pub fn new(index: usize, size: Rect) -> Self {
        Self {
            index,
            size,
            occupied: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> Rect {
        self.size
    }

    pub fn occupied(&self) -> &[Region] {
        &self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    pub fn is_free(&self, candidate: &Region) -> bool {
        candidate.x2 <= self.size.w
            && candidate.y2 <= self.size.h
            && !self.occupied.iter().any(|r| r.overlaps(candidate))
    }

    /// Marks `region` as cut. Callers only commit regions the search found free.
    pub(crate) fn commit(&mut self, region: Region) {
        debug_assert!(self.is_free(&region), "committing occupied region {region:?}");
        self.occupied.push(region);
    }
}

/// Ordered sheets for one pack, plus the rule for opening more.
#[derive(Debug, Clone)]
pub struct SheetPool {
    sheets: Vec<Sheet>,
    /// Size of the next sheet to open, if more may be opened.
    refill: Option<Rect>,
    /// Distinct sizes among `sheets` and `refill`, in first-seen order.
    sizes: Vec<Rect>,
    max_sheets: Option<u64>,
}

impl SheetPool {
    /// Validates the supply and lays out the starting sheets.
    ///
    /// Unbounded pools start empty; inventory pools start with every sheet, one per
    /// unit of quantity, in submission order. An inventory larger than `max_sheets`
    /// is rejected before any sheet is allocated.
    pub fn from_supply(supply: &Supply, max_sheets: Option<u64>) -> Result<Self> {
        match supply {
            Supply::Unbounded { width, height } => {
                let size = checked_rect("sheet", *width, *height)?;
                Ok(Self {
                    sheets: Vec::new(),
                    refill: Some(size),
                    sizes: vec![size],
                    max_sheets,
                })
            }
            Supply::Inventory(stock) => {
                let lines = stock
                    .iter()
                    .map(SheetStock::validate)
                    .collect::<Result<Vec<_>>>()?;
                let total: u64 = lines.iter().map(|&(_, qty)| qty as u64).sum();
                ensure_within("sheets", total, max_sheets)?;

                let mut sheets = Vec::with_capacity(total as usize);
                let mut sizes = Vec::new();
                for (size, qty) in lines {
                    if qty > 0 && !sizes.contains(&size) {
                        sizes.push(size);
                    }
                    for _ in 0..qty {
                        sheets.push(Sheet::new(sheets.len(), size));
                    }
                }
                Ok(Self {
                    sheets,
                    refill: None,
                    sizes,
                    max_sheets,
                })
            }
        }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_mut(&mut self, index: usize) -> &mut Sheet {
        &mut self.sheets[index]
    }

    /// Size of sheets opened on demand, or `None` for a fixed inventory.
    pub fn refill_size(&self) -> Option<Rect> {
        self.refill
    }

    /// Appends a fresh sheet at the next index when supply allows.
    ///
    /// `Ok(None)` for a fixed inventory; an error once the pool would outgrow its
    /// sheet limit.
    pub fn open(&mut self) -> Result<Option<usize>> {
        let Some(size) = self.refill else {
            return Ok(None);
        };
        let index = self.sheets.len();
        ensure_within("sheets", index as u64 + 1, self.max_sheets)?;
        self.sheets.push(Sheet::new(index, size));
        Ok(Some(index))
    }

    /// True if some sheet this pool has or could open is large enough for `piece`.
    ///
    /// Each distinct sheet size compared is charged to `budget` as one check.
    pub fn could_fit(&self, piece: Rect, budget: &mut ScanBudget) -> Result<bool> {
        for size in &self.sizes {
            budget.spend(1)?;
            if piece.fits_in_any_orientation(size) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn into_sheets(self) -> Vec<Sheet> {
        self.sheets
    }
}
