//! Fill ratio and trim loss of a finished layout.

use serde::Serialize;

use crate::types::{Placement, Rect};

/// Share of opened sheet area covered by placed pieces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub filled_ratio: f64,
    pub trim_loss: f64,
    pub placed_area: u64,
    pub sheet_area: u64,
}

impl Metrics {
    /// Metrics over exactly `opened` sheets. `None` when nothing was opened.
    pub fn compute(placements: &[Placement], opened: impl IntoIterator<Item = Rect>) -> Option<Self> {
        let sheet_area: u64 = opened.into_iter().map(|s| s.area()).sum();
        if sheet_area == 0 {
            return None;
        }
        let placed_area: u64 = placements.iter().map(|p| p.rect.area()).sum();
        let filled_ratio = placed_area as f64 / sheet_area as f64;
        Some(Self {
            filled_ratio,
            trim_loss: 1.0 - filled_ratio,
            placed_area,
            sheet_area,
        })
    }

    pub fn trim_loss_percent(&self) -> f64 {
        self.trim_loss * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(w: u32, h: u32) -> Placement {
        Placement {
            sheet_index: 0,
            x: 0,
            y: 0,
            rect: Rect::new(w, h),
            rotated: false,
        }
    }

    #[test]
    fn test_full_sheet_has_no_trim_loss() {
        let m = Metrics::compute(&[placement(100, 100)], [Rect::new(100, 100)]).unwrap();
        assert!((m.filled_ratio - 1.0).abs() < 1e-12);
        assert!(m.trim_loss.abs() < 1e-12);
        assert_eq!(m.placed_area, m.sheet_area);
    }

    #[test]
    fn test_ratio_over_opened_sheets_only() {
        let placements = [placement(10, 5), placement(5, 5)];
        let m = Metrics::compute(&placements, [Rect::new(10, 10), Rect::new(5, 10)]).unwrap();
        assert_eq!(m.placed_area, 75);
        assert_eq!(m.sheet_area, 150);
        assert!((m.filled_ratio - 0.5).abs() < 1e-12);
        assert!((m.trim_loss_percent() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_sheets_no_metrics() {
        assert!(Metrics::compute(&[], Vec::<Rect>::new()).is_none());
    }
}
