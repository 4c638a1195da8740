//! Finding a free spot for one piece on one sheet.

use std::time::{Duration, Instant};

use crate::config::{PackConfig, ScanOrder};
use crate::error::{PackError, Result};
use crate::supply::Sheet;
use crate::types::{Rect, Region};

/// How often, in overlap checks, the wall clock is consulted.
const DEADLINE_POLL_INTERVAL: u64 = 1 << 16;

/// A free spot found for a piece, not yet committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub x: u32,
    pub y: u32,
    /// Orientation the piece takes at this spot.
    pub rect: Rect,
    pub rotated: bool,
}

impl Candidate {
    pub fn region(&self) -> Region {
        Region::at(self.x, self.y, self.rect)
    }
}

/// Work allowance shared by every search in one pack.
#[derive(Debug, Clone)]
pub struct ScanBudget {
    checks: u64,
    max_checks: Option<u64>,
    time_limit: Option<Duration>,
    started: Instant,
    next_poll: u64,
}

impl ScanBudget {
    pub fn new(config: &PackConfig) -> Self {
        Self {
            checks: 0,
            max_checks: config.max_checks,
            time_limit: config.time_limit,
            started: Instant::now(),
            next_poll: DEADLINE_POLL_INTERVAL,
        }
    }

    #[cfg(test)]
    pub fn unlimited() -> Self {
        Self::new(&PackConfig::unlimited())
    }

    pub fn checks(&self) -> u64 {
        self.checks
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Records `n` overlap checks, failing once the allowance is used up.
    pub fn spend(&mut self, n: u64) -> Result<()> {
        self.checks = self.checks.saturating_add(n);
        if let Some(max) = self.max_checks
            && self.checks > max
        {
            return Err(PackError::Aborted {
                checks: self.checks,
            });
        }
        if self.checks >= self.next_poll {
            self.next_poll = self.checks.saturating_add(DEADLINE_POLL_INTERVAL);
            if let Some(limit) = self.time_limit {
                let elapsed = self.started.elapsed();
                if elapsed > limit {
                    return Err(PackError::DeadlineExceeded {
                        elapsed_ms: elapsed.as_millis() as u64,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Decides where on a sheet a piece goes.
///
/// Implementations must not mutate the sheet; the caller commits the returned
/// candidate. They try the declared orientation before the rotated one.
pub trait PlacementStrategy {
    fn find(&self, sheet: &Sheet, piece: Rect, budget: &mut ScanBudget)
    -> Result<Option<Candidate>>;
}

/// Visits every origin of the sheet in a fixed raster order and takes the first
/// one clear of all occupied regions.
///
/// Origins inside a blocking region's shadow along the inner axis are skipped in
/// one step; all of them collide with the same region, so the spot found is the
/// one an origin-by-origin scan would find.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterScan {
    pub order: ScanOrder,
}

impl RasterScan {
    pub fn new(order: ScanOrder) -> Self {
        Self { order }
    }

    fn scan(&self, sheet: &Sheet, rect: Rect, budget: &mut ScanBudget) -> Result<Option<(u32, u32)>> {
        let size = sheet.size();
        let (max_x, max_y) = (size.w - rect.w, size.h - rect.h);
        let (outer_max, inner_max) = match self.order {
            ScanOrder::XMajor => (max_x, max_y),
            ScanOrder::YMajor => (max_y, max_x),
        };

        for outer in 0..=outer_max {
            let mut inner = 0;
            while inner <= inner_max {
                let (x, y) = match self.order {
                    ScanOrder::XMajor => (outer, inner),
                    ScanOrder::YMajor => (inner, outer),
                };
                let candidate = Region::at(x, y, rect);
                let (blocker, checked) = first_blocker(sheet.occupied(), &candidate);
                budget.spend(checked.max(1))?;
                match blocker {
                    None => return Ok(Some((x, y))),
                    Some(r) => {
                        inner = match self.order {
                            ScanOrder::XMajor => r.y2,
                            ScanOrder::YMajor => r.x2,
                        }
                    }
                }
            }
        }
        Ok(None)
    }
}

impl PlacementStrategy for RasterScan {
    fn find(
        &self,
        sheet: &Sheet,
        piece: Rect,
        budget: &mut ScanBudget,
    ) -> Result<Option<Candidate>> {
        for rect in piece.orientations() {
            if !rect.fits_in(&sheet.size()) {
                continue;
            }
            if let Some((x, y)) = self.scan(sheet, rect, budget)? {
                return Ok(Some(Candidate {
                    x,
                    y,
                    rect,
                    rotated: rect != piece,
                }));
            }
        }
        Ok(None)
    }
}

/// First occupied region overlapping `candidate`, and how many regions were tested.
fn first_blocker<'a>(occupied: &'a [Region], candidate: &Region) -> (Option<&'a Region>, u64) {
    match occupied.iter().position(|r| r.overlaps(candidate)) {
        Some(i) => (Some(&occupied[i]), i as u64 + 1),
        None => (None, occupied.len() as u64),
    }
}
