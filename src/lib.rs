//! sheet_cutter - greedy planner for cutting rectangular pieces out of stock sheets.
//!
//! Pieces are expanded from demand lines, sorted largest first and placed one by one
//! at the first free spot of the first sheet that has room, rotating by 90° when the
//! declared orientation does not fit. New sheets are opened only when every open sheet
//! is exhausted, and only while the supply allows.
//!
//! # Example
//!
//! ```
//! use sheet_cutter::{PieceDemand, Supply, pack};
//!
//! let demands = [PieceDemand::new(8, 5, 2), PieceDemand::new(2, 1, 5)];
//! let layout = pack(&demands, &Supply::unbounded(13, 10)).unwrap();
//! assert_eq!(layout.placements.len(), 7);
//! assert_eq!(layout.sheet_count(), 1);
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod layout;
pub mod ledger;
pub mod metrics;
pub mod plot;
pub mod render;
pub mod search;
pub mod solver;
pub mod supply;
pub mod types;

pub use config::{PackConfig, ScanOrder};
pub use error::{PackError, Result};
pub use layout::{Layout, OpenedSheet};
pub use search::{PlacementStrategy, RasterScan};
pub use solver::{Solver, pack};
pub use supply::Supply;
pub use types::{PieceDemand, Placement, Rect, SheetStock};
