use serde::{Deserialize, Serialize};

use crate::error::{PackError, Result};

/// Width/height pair of a piece or sheet, in integer units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rect {
    #[serde(rename = "width")]
    pub w: u32,
    #[serde(rename = "height")]
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn is_square(&self) -> bool {
        self.w == self.h
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.w <= other.w && self.h <= other.h
    }

    /// Fits `other` as declared or turned by 90°.
    pub fn fits_in_any_orientation(&self, other: &Rect) -> bool {
        self.fits_in(other) || self.rotated().fits_in(other)
    }

    /// Orientations to try, declared first. Squares only have one.
    pub fn orientations(&self) -> impl Iterator<Item = Rect> {
        let swapped = (!self.is_square()).then_some(self.rotated());
        std::iter::once(*self).chain(swapped)
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Occupied area on a sheet, half-open: `[x1, x2) x [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    pub fn at(x: u32, y: u32, rect: Rect) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + rect.w,
            y2: y + rect.h,
        }
    }

    /// Touching edges are not an overlap.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.x1 < other.x2 && self.x2 > other.x1 && self.y1 < other.y2 && self.y2 > other.y1
    }

    pub fn corners(&self) -> [u32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// A committed cut: one piece bound to a sheet at an origin, in its chosen orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub sheet_index: usize,
    pub x: u32,
    pub y: u32,
    #[serde(flatten)]
    pub rect: Rect,
    /// True when `rect` is the piece's declared size turned by 90°.
    pub rotated: bool,
}

impl Placement {
    pub fn region(&self) -> Region {
        Region::at(self.x, self.y, self.rect)
    }
}

/// One line of demand as submitted: `demand` pieces of `width` x `height`.
///
/// Signed so that malformed input can be reported instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceDemand {
    pub width: i64,
    pub height: i64,
    pub demand: i64,
}

impl PieceDemand {
    pub fn new(width: i64, height: i64, demand: i64) -> Self {
        Self {
            width,
            height,
            demand,
        }
    }

    /// Checked size and count.
    pub fn validate(&self) -> Result<(Rect, u32)> {
        let rect = checked_rect("piece", self.width, self.height)?;
        let qty = checked_quantity("piece", self.width, self.height, self.demand)?;
        Ok((rect, qty))
    }
}

/// `quantity` stock sheets of `width` x `height` available in inventory mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetStock {
    pub width: i64,
    pub height: i64,
    pub quantity: i64,
}

impl SheetStock {
    pub fn new(width: i64, height: i64, quantity: i64) -> Self {
        Self {
            width,
            height,
            quantity,
        }
    }

    pub fn validate(&self) -> Result<(Rect, u32)> {
        let rect = checked_rect("sheet", self.width, self.height)?;
        let qty = checked_quantity("sheet", self.width, self.height, self.quantity)?;
        Ok((rect, qty))
    }
}

pub(crate) fn checked_rect(what: &'static str, width: i64, height: i64) -> Result<Rect> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok(Rect::new(w, h)),
        _ => Err(PackError::InvalidDimension {
            what,
            width,
            height,
        }),
    }
}

fn checked_quantity(what: &'static str, width: i64, height: i64, quantity: i64) -> Result<u32> {
    u32::try_from(quantity).map_err(|_| PackError::InvalidQuantity {
        what,
        width,
        height,
        quantity,
    })
}
