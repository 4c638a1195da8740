use tracing::{debug, info, warn};

use crate::config::PackConfig;
use crate::error::{PackError, Result, ensure_within};
use crate::layout::Layout;
use crate::ledger::{DemandLedger, expand_demands, validate_demands};
use crate::search::{Candidate, PlacementStrategy, RasterScan, ScanBudget};
use crate::supply::{SheetPool, Supply};
use crate::types::{PieceDemand, Placement, Rect};

/// Packs `demands` into sheets from `supply` with the default raster scan.
pub fn pack(demands: &[PieceDemand], supply: &Supply) -> Result<Layout> {
    Solver::new(supply.clone(), demands.to_vec(), PackConfig::default()).solve()
}

/// Greedy first-fit-decreasing cutter.
///
/// Pieces go largest first onto the first sheet, in opening order, where the strategy
/// finds room. A committed piece is never moved.
pub struct Solver<S = RasterScan> {
    supply: Supply,
    demands: Vec<PieceDemand>,
    config: PackConfig,
    strategy: S,
}

impl Solver<RasterScan> {
    pub fn new(supply: Supply, demands: Vec<PieceDemand>, config: PackConfig) -> Self {
        Self {
            supply,
            demands,
            config,
            strategy: RasterScan::new(config.scan_order),
        }
    }
}

impl<S: PlacementStrategy> Solver<S> {
    /// Swaps the placement strategy, keeping supply, demand and budget.
    pub fn with_strategy<T: PlacementStrategy>(self, strategy: T) -> Solver<T> {
        Solver {
            supply: self.supply,
            demands: self.demands,
            config: self.config,
            strategy,
        }
    }

    pub fn solve(&self) -> Result<Layout> {
        let demands = validate_demands(&self.demands)?;
        let total: u64 = demands.iter().map(|&(_, qty)| qty as u64).sum();
        ensure_within("pieces", total, self.config.max_pieces)?;
        let mut pool = SheetPool::from_supply(&self.supply, self.config.max_sheets)?;

        // With unlimited sheets the only way to fail is a piece larger than the sheet.
        if let Some(stock) = pool.refill_size()
            && let Some(&(piece, _)) = demands
                .iter()
                .find(|(rect, qty)| *qty > 0 && !rect.fits_in_any_orientation(&stock))
        {
            return Err(PackError::PieceExceedsStock { piece, stock });
        }

        let mut ledger = DemandLedger::new(&demands);
        let pieces = expand_demands(&demands);
        let mut budget = ScanBudget::new(&self.config);
        let mut placements = Vec::with_capacity(pieces.len());
        let mut unplaceable = Vec::new();

        for piece in pieces {
            let fits = pool
                .could_fit(piece, &mut budget)
                .map_err(|e| self.aborted(e, placements.len()))?;
            if !fits {
                debug!(%piece, "piece larger than every sheet");
                unplaceable.push(piece);
                continue;
            }

            let found = self
                .search_open_sheets(&pool, piece, &mut budget)
                .map_err(|e| self.aborted(e, placements.len()))?;
            let found = match found {
                Some(found) => Some(found),
                None => match pool
                    .open()
                    .map_err(|e| self.aborted(e, placements.len()))?
                {
                    Some(index) => {
                        debug!(sheet = index, %piece, "opened sheet");
                        self.strategy
                            .find(&pool.sheets()[index], piece, &mut budget)
                            .map_err(|e| self.aborted(e, placements.len()))?
                            .map(|c| (index, c))
                    }
                    None => None,
                },
            };

            let Some((sheet_index, candidate)) = found else {
                debug!(%piece, "no sheet can take piece");
                unplaceable.push(piece);
                continue;
            };

            pool.sheet_mut(sheet_index).commit(candidate.region());
            let charged = ledger.consume(candidate.rect);
            debug_assert!(charged.is_some(), "placed {piece} without demand left");
            placements.push(Placement {
                sheet_index,
                x: candidate.x,
                y: candidate.y,
                rect: candidate.rect,
                rotated: candidate.rotated,
            });
        }

        debug_assert_eq!(ledger.is_settled(), unplaceable.is_empty());
        let unmet = ledger.total_remaining();
        let layout = Layout::assemble(
            pool.into_sheets(),
            placements,
            unplaceable,
            &ledger,
            budget.checks(),
        );
        info!(
            placed = layout.placements.len(),
            unplaceable = layout.unplaceable.len(),
            sheets = layout.sheet_count(),
            unmet,
            checks = layout.checks,
            elapsed_ms = budget.elapsed().as_millis() as u64,
            "pack finished"
        );
        Ok(layout)
    }

    /// First hit over existing sheets in opening order.
    fn search_open_sheets(
        &self,
        pool: &SheetPool,
        piece: Rect,
        budget: &mut ScanBudget,
    ) -> Result<Option<(usize, Candidate)>> {
        for sheet in pool.sheets() {
            budget.spend(1)?;
            if !piece.fits_in_any_orientation(&sheet.size()) {
                continue;
            }
            if let Some(candidate) = self.strategy.find(sheet, piece, budget)? {
                return Ok(Some((sheet.index(), candidate)));
            }
        }
        Ok(None)
    }

    fn aborted(&self, err: PackError, placed: usize) -> PackError {
        warn!(placed, error = %err, "pack aborted");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanOrder;
    use crate::types::Region;
    use pretty_assertions::assert_eq;

    fn demands(lines: &[(i64, i64, i64)]) -> Vec<PieceDemand> {
        lines
            .iter()
            .map(|&(w, h, q)| PieceDemand::new(w, h, q))
            .collect()
    }

    fn scenario_a() -> Vec<PieceDemand> {
        demands(&[(2, 1, 5), (4, 2, 5), (5, 3, 2), (7, 4, 3), (8, 5, 2)])
    }

    /// Validates a complete layout:
    /// 1. Every placement lies inside its sheet
    /// 2. No two placements on the same sheet overlap
    /// 3. Placed plus unplaceable pieces account for every unit of demand
    fn assert_layout_valid(layout: &Layout, demands: &[PieceDemand]) {
        let declared: u64 = demands.iter().map(|d| d.demand as u64).sum();
        let accounted = (layout.placements.len() + layout.unplaceable.len()) as u64;
        assert_eq!(accounted, declared, "pieces placed + unplaceable != demand");

        let unmet: u64 = layout.unmet_demand.iter().map(|u| u.remaining).sum();
        assert_eq!(unmet, layout.unplaceable.len() as u64);

        for sheet in &layout.opened_sheets {
            let on_sheet: Vec<&Placement> = layout.placements_on(sheet.index).collect();
            assert_eq!(on_sheet.len(), sheet.pieces);
            assert!(!on_sheet.is_empty(), "sheet {} opened but empty", sheet.index);

            for p in &on_sheet {
                assert!(
                    p.x + p.rect.w <= sheet.size.w && p.y + p.rect.h <= sheet.size.h,
                    "sheet {}: {} @ ({}, {}) exceeds {}",
                    sheet.index,
                    p.rect,
                    p.x,
                    p.y,
                    sheet.size
                );
            }
            for i in 0..on_sheet.len() {
                for j in (i + 1)..on_sheet.len() {
                    let (a, b) = (on_sheet[i], on_sheet[j]);
                    assert!(
                        !a.region().overlaps(&b.region()),
                        "sheet {}: {} @ ({},{}) overlaps {} @ ({},{})",
                        sheet.index,
                        a.rect,
                        a.x,
                        a.y,
                        b.rect,
                        b.x,
                        b.y
                    );
                }
            }
        }

        for p in &layout.placements {
            assert!(
                layout.opened_sheets.iter().any(|s| s.index == p.sheet_index),
                "placement on unreported sheet {}",
                p.sheet_index
            );
        }
    }

    #[test]
    fn test_scenario_a_baseline() {
        let demands = scenario_a();
        let layout = pack(&demands, &Supply::unbounded(13, 10)).unwrap();
        assert_layout_valid(&layout, &demands);

        assert_eq!(layout.placements.len(), 17);
        assert!(layout.unplaceable.is_empty());
        assert_eq!(layout.sheet_count(), 2);

        let metrics = layout.metrics.unwrap();
        assert_eq!(metrics.placed_area, 244);
        assert_eq!(metrics.sheet_area, 260);
        assert!(metrics.filled_ratio > 0.0 && metrics.filled_ratio < 1.0);
        assert!((metrics.trim_loss - 16.0 / 260.0).abs() < 1e-12);
    }

    #[test]
    fn test_scenario_a_placement_sequence() {
        let layout = pack(&scenario_a(), &Supply::unbounded(13, 10)).unwrap();
        let got: Vec<(usize, u32, u32, u32, u32)> = layout
            .placements
            .iter()
            .map(|p| (p.sheet_index, p.x, p.y, p.rect.w, p.rect.h))
            .collect();
        assert_eq!(
            got,
            vec![
                (0, 0, 0, 8, 5),
                (0, 0, 5, 8, 5),
                (0, 8, 0, 4, 7),
                (1, 0, 0, 7, 4),
                (1, 0, 4, 7, 4),
                (0, 8, 7, 5, 3),
                (1, 7, 0, 5, 3),
                (1, 0, 8, 4, 2),
                (1, 4, 8, 4, 2),
                (1, 7, 3, 4, 2),
                (1, 7, 5, 4, 2),
                (1, 8, 7, 4, 2),
                (0, 12, 0, 1, 2),
                (0, 12, 2, 1, 2),
                (0, 12, 4, 1, 2),
                (1, 8, 9, 2, 1),
                (1, 10, 9, 2, 1),
            ]
        );
        assert!(layout.placements[2].rotated);
        assert!(!layout.placements[3].rotated);
    }

    #[test]
    fn test_scenario_b_piece_larger_than_sheet() {
        let err = pack(&demands(&[(20, 20, 1)]), &Supply::unbounded(10, 10)).unwrap_err();
        assert_eq!(
            err,
            PackError::PieceExceedsStock {
                piece: Rect::new(20, 20),
                stock: Rect::new(10, 10),
            }
        );
        assert!(err.is_input_error());
    }

    #[test]
    fn test_scenario_c_single_inventory_sheet() {
        let supply = Supply::inventory([(10, 10, 1)]);

        // the 10x10 piece consumes the whole sheet
        let exact = demands(&[(10, 10, 1), (5, 5, 1)]);
        let layout = pack(&exact, &supply).unwrap();
        assert_layout_valid(&layout, &exact);
        assert_eq!(layout.placements.len(), 1);
        assert_eq!(layout.unplaceable, vec![Rect::new(5, 5)]);

        let shared = demands(&[(10, 5, 1), (5, 5, 1), (6, 6, 1)]);
        let layout = pack(&shared, &supply).unwrap();
        assert_layout_valid(&layout, &shared);
        let placed: Vec<Rect> = layout.placements.iter().map(|p| p.rect).collect();
        assert_eq!(placed, vec![Rect::new(10, 5), Rect::new(5, 5)]);
        assert_eq!(layout.unplaceable, vec![Rect::new(6, 6)]);
        assert_eq!(layout.sheet_count(), 1);
        assert_eq!(
            layout.unmet_demand,
            vec![crate::layout::UnmetDemand {
                size: Rect::new(6, 6),
                remaining: 1
            }]
        );
    }

    #[test]
    fn test_invalid_input_rejected_before_search() {
        let supply = Supply::unbounded(10, 10);
        assert!(matches!(
            pack(&demands(&[(3, 0, 1)]), &supply),
            Err(PackError::InvalidDimension { .. })
        ));
        assert!(matches!(
            pack(&demands(&[(3, 3, -2)]), &supply),
            Err(PackError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            pack(&demands(&[(3, 3, 1)]), &Supply::unbounded(-1, 10)),
            Err(PackError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_no_demands() {
        let layout = pack(&[], &Supply::unbounded(100, 100)).unwrap();
        assert!(layout.placements.is_empty());
        assert_eq!(layout.sheet_count(), 0);
        assert!(layout.metrics.is_none());
    }

    #[test]
    fn test_zero_demand_line_ignored_even_if_oversized() {
        let layout = pack(
            &demands(&[(500, 500, 0), (5, 5, 1)]),
            &Supply::unbounded(10, 10),
        )
        .unwrap();
        assert_eq!(layout.placements.len(), 1);
    }

    #[test]
    fn test_rotation_helps() {
        // Stock 100x50, piece 50x100: only fits if rotated
        let layout = pack(&demands(&[(50, 100, 1)]), &Supply::unbounded(100, 50)).unwrap();
        assert_eq!(layout.sheet_count(), 1);
        assert!(layout.placements[0].rotated);
        assert_eq!(layout.placements[0].rect, Rect::new(100, 50));
    }

    #[test]
    fn test_needs_one_sheet_per_large_piece() {
        let d = demands(&[(60, 60, 4)]);
        let layout = pack(&d, &Supply::unbounded(100, 100)).unwrap();
        assert_layout_valid(&layout, &d);
        assert_eq!(layout.sheet_count(), 4);
        let indices: Vec<usize> = layout.opened_sheets.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_exact_fit_four_pieces() {
        let d = demands(&[(50, 50, 4)]);
        let layout = pack(&d, &Supply::unbounded(100, 100)).unwrap();
        assert_layout_valid(&layout, &d);
        assert_eq!(layout.sheet_count(), 1);
        assert!(layout.metrics.unwrap().trim_loss.abs() < 1e-12);
    }

    #[test]
    fn test_inventory_uses_sheets_in_order_and_mixed_sizes() {
        let d = demands(&[(3, 2, 2), (2, 3, 1)]);
        let layout = pack(&d, &Supply::inventory([(5, 3, 1), (4, 4, 1)])).unwrap();
        assert_layout_valid(&layout, &d);
        let got: Vec<(usize, u32, u32, Rect)> = layout
            .placements
            .iter()
            .map(|p| (p.sheet_index, p.x, p.y, p.rect))
            .collect();
        assert_eq!(
            got,
            vec![
                (0, 0, 0, Rect::new(3, 2)),
                (0, 3, 0, Rect::new(2, 3)),
                (1, 0, 0, Rect::new(2, 3)),
            ]
        );
        assert!(layout.placements[1].rotated);
        assert!(!layout.placements[2].rotated);
        assert_eq!(layout.metrics.unwrap().sheet_area, 15 + 16);
    }

    #[test]
    fn test_inventory_unused_sheets_not_reported() {
        let d = demands(&[(4, 4, 1)]);
        let layout = pack(&d, &Supply::inventory([(2, 2, 3), (5, 5, 2)])).unwrap();
        assert_layout_valid(&layout, &d);
        assert_eq!(layout.opened_sheets.len(), 1);
        assert_eq!(layout.opened_sheets[0].index, 3);
        assert_eq!(layout.placements[0].sheet_index, 3);
        let metrics = layout.metrics.unwrap();
        assert_eq!(metrics.sheet_area, 25);
        // the three unused 2x2 sheets do not dilute the ratio
        assert!((metrics.filled_ratio - 16.0 / 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_inventory_oversized_piece_is_unplaceable_not_error() {
        let d = demands(&[(20, 20, 2), (5, 5, 1)]);
        let layout = pack(&d, &Supply::inventory([(10, 10, 1)])).unwrap();
        assert_layout_valid(&layout, &d);
        assert_eq!(layout.unplaceable, vec![Rect::new(20, 20), Rect::new(20, 20)]);
        assert_eq!(layout.placements.len(), 1);
    }

    #[test]
    fn test_empty_inventory() {
        let d = demands(&[(1, 1, 2)]);
        let layout = pack(&d, &Supply::Inventory(Vec::new())).unwrap();
        assert_layout_valid(&layout, &d);
        assert_eq!(layout.unplaceable.len(), 2);
        assert!(layout.metrics.is_none());
    }

    #[test]
    fn test_deterministic() {
        let supply = Supply::unbounded(13, 10);
        let first = serde_json::to_string(&pack(&scenario_a(), &supply).unwrap()).unwrap();
        for _ in 0..3 {
            let again = serde_json::to_string(&pack(&scenario_a(), &supply).unwrap()).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_new_sheet_only_when_earlier_sheets_are_full() {
        let stock = Rect::new(13, 10);
        let layout = pack(&scenario_a(), &Supply::unbounded(13, 10)).unwrap();
        // replay the commits: a piece on sheet k must not have fit on sheets 0..k
        let mut regions: Vec<Vec<Region>> = vec![Vec::new(); layout.sheet_count()];
        for p in &layout.placements {
            for earlier in regions.iter().take(p.sheet_index) {
                for rect in p.rect.orientations().filter(|r| r.fits_in(&stock)) {
                    for x in 0..=stock.w - rect.w {
                        for y in 0..=stock.h - rect.h {
                            let cand = Region::at(x, y, rect);
                            assert!(
                                earlier.iter().any(|r| r.overlaps(&cand)),
                                "{} fit on an earlier sheet at ({x}, {y})",
                                p.rect
                            );
                        }
                    }
                }
            }
            regions[p.sheet_index].push(p.region());
        }
    }

    #[test]
    fn test_y_major_scan_order() {
        let config = PackConfig::default().with_scan_order(ScanOrder::YMajor);
        let d = demands(&[(5, 5, 2)]);
        let layout = Solver::new(Supply::unbounded(10, 10), d.clone(), config)
            .solve()
            .unwrap();
        assert_layout_valid(&layout, &d);
        assert_eq!((layout.placements[1].x, layout.placements[1].y), (5, 0));

        let layout = pack(&d, &Supply::unbounded(10, 10)).unwrap();
        assert_eq!((layout.placements[1].x, layout.placements[1].y), (0, 5));
    }

    #[test]
    fn test_budget_exhaustion_is_reported() {
        let config = PackConfig::default().with_max_checks(Some(5));
        let err = Solver::new(Supply::unbounded(13, 10), scenario_a(), config)
            .solve()
            .unwrap_err();
        assert!(matches!(err, PackError::Aborted { .. }));
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_oversized_inventory_rejected_before_allocation() {
        let config = PackConfig::default()
            .with_max_checks(Some(1))
            .with_time_limit(Some(std::time::Duration::from_millis(1)));
        let supply = Supply::inventory([(1, 1, i64::from(u32::MAX)), (1, 1, 3_000_000)]);
        let err = Solver::new(supply, demands(&[(2, 2, 300)]), config)
            .solve()
            .unwrap_err();
        assert_eq!(
            err,
            PackError::LimitExceeded {
                what: "sheets",
                count: u64::from(u32::MAX) + 3_000_000,
                limit: crate::config::DEFAULT_MAX_SHEETS
            }
        );
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_oversized_demand_rejected_before_expansion() {
        let d = demands(&[(1, 1, i64::from(u32::MAX)), (2, 2, 1)]);
        let err = pack(&d, &Supply::unbounded(10, 10)).unwrap_err();
        assert!(matches!(
            err,
            PackError::LimitExceeded { what: "pieces", limit, .. }
                if limit == crate::config::DEFAULT_MAX_PIECES
        ));

        let config = PackConfig::default().with_max_pieces(Some(3));
        let err = Solver::new(Supply::unbounded(10, 10), demands(&[(2, 2, 4)]), config)
            .solve()
            .unwrap_err();
        assert!(matches!(err, PackError::LimitExceeded { count: 4, .. }));
    }

    #[test]
    fn test_sheet_walks_are_charged_to_budget() {
        // no piece fits a 1x1 sheet, so only the pool walk spends checks
        let config = PackConfig::default()
            .with_max_checks(Some(1))
            .with_max_sheets(None);
        let supply = Supply::inventory([(1, 1, 10_000)]);
        let err = Solver::new(supply, demands(&[(2, 2, 300)]), config)
            .solve()
            .unwrap_err();
        assert!(matches!(err, PackError::Aborted { checks: 2 }));

        // unbounded opening stops at the sheet limit
        let config = PackConfig::default().with_max_sheets(Some(2));
        let err = Solver::new(Supply::unbounded(6, 6), demands(&[(5, 5, 3)]), config)
            .solve()
            .unwrap_err();
        assert!(matches!(
            err,
            PackError::LimitExceeded { what: "sheets", count: 3, limit: 2 }
        ));
    }

    #[test]
    fn test_checks_cover_pool_walks() {
        // 5x5 pieces, one per 6x6 sheet. Per piece: one size check, one check per open
        // sheet walked, two blocked origins per full sheet, one origin on the new sheet.
        let layout = Solver::new(
            Supply::unbounded(6, 6),
            demands(&[(5, 5, 3)]),
            PackConfig::unlimited(),
        )
        .solve()
        .unwrap();
        assert_eq!(layout.sheet_count(), 3);
        let per_piece: [u64; 3] = [1 + 1, 1 + 1 + 2 + 1, 1 + 2 + 4 + 1];
        assert_eq!(layout.checks, per_piece.iter().sum::<u64>());
    }

    /// Always opens a fresh sheet: puts every piece at the origin of an empty sheet.
    struct OnePerSheet;

    impl PlacementStrategy for OnePerSheet {
        fn find(
            &self,
            sheet: &crate::supply::Sheet,
            piece: Rect,
            _budget: &mut ScanBudget,
        ) -> Result<Option<Candidate>> {
            if !sheet.is_empty() || !piece.fits_in(&sheet.size()) {
                return Ok(None);
            }
            Ok(Some(Candidate {
                x: 0,
                y: 0,
                rect: piece,
                rotated: false,
            }))
        }
    }

    #[test]
    fn test_custom_strategy() {
        let d = demands(&[(2, 2, 3)]);
        let layout = Solver::new(Supply::unbounded(10, 10), d.clone(), PackConfig::default())
            .with_strategy(OnePerSheet)
            .solve()
            .unwrap();
        assert_layout_valid(&layout, &d);
        assert_eq!(layout.sheet_count(), 3);
    }

    /// 30 pieces, 6 sizes, small plywood-like sheet.
    #[test]
    fn test_complex_mixed_sizes() {
        let d = demands(&[
            (80, 60, 5),
            (40, 30, 8),
            (60, 40, 4),
            (120, 60, 3),
            (30, 20, 6),
            (50, 50, 4),
        ]);
        let layout = pack(&d, &Supply::unbounded(244, 122)).unwrap();
        assert_layout_valid(&layout, &d);
        assert!(layout.unplaceable.is_empty());

        let min_sheets = layout
            .metrics
            .unwrap()
            .placed_area
            .div_ceil(Rect::new(244, 122).area()) as usize;
        assert!(layout.sheet_count() >= min_sheets);
    }
}
