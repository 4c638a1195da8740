//! Error types for sheet cutting.

use thiserror::Error;

use crate::types::Rect;

/// Result type alias for packing operations.
pub type Result<T> = std::result::Result<T, PackError>;

/// Errors that stop a pack before a layout is produced.
///
/// Pieces that merely do not fit the available inventory are not errors; they are
/// reported in [`crate::layout::Layout::unplaceable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    #[error("invalid {what} dimensions {width}x{height}: both sides must be positive and fit in 32 bits")]
    InvalidDimension {
        what: &'static str,
        width: i64,
        height: i64,
    },

    #[error("invalid {what} quantity {quantity} for {width}x{height}: must be non-negative and fit in 32 bits")]
    InvalidQuantity {
        what: &'static str,
        width: i64,
        height: i64,
        quantity: i64,
    },

    #[error("piece {piece} does not fit in stock {stock} in either orientation")]
    PieceExceedsStock { piece: Rect, stock: Rect },

    #[error("search aborted after {checks} overlap checks")]
    Aborted { checks: u64 },

    #[error("search exceeded its time limit after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    #[error("{count} {what} exceed the limit of {limit}")]
    LimitExceeded {
        what: &'static str,
        count: u64,
        limit: u64,
    },
}

impl PackError {
    /// True for errors caused by malformed or unsatisfiable input, as opposed to
    /// exhausting the search budget.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PackError::InvalidDimension { .. }
                | PackError::InvalidQuantity { .. }
                | PackError::PieceExceedsStock { .. }
        )
    }
}

/// Fails with [`PackError::LimitExceeded`] when `count` is over `limit`.
pub(crate) fn ensure_within(what: &'static str, count: u64, limit: Option<u64>) -> Result<()> {
    match limit {
        Some(limit) if count > limit => Err(PackError::LimitExceeded { what, count, limit }),
        _ => Ok(()),
    }
}
