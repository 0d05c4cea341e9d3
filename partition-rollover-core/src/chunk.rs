//! Id-range slicing for chunked updates.

use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive `[min, max]` id range returned by a bounding query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdBounds {
    pub min: i64,
    pub max: i64,
}

/// Half-open id window `[lower, upper)`; `upper` is `None` only when the
/// window has to reach `i64::MAX`, which has no exclusive successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdWindow {
    pub lower: i64,
    pub upper: Option<i64>,
}

impl IdWindow {
    /// Narrows an UPDATE whose text ends in a WHERE clause to this window.
    pub fn restrict(&self, statement: &str) -> String {
        match self.upper {
            Some(upper) => format!(
                "{statement} AND id >= {lower} AND id < {upper}",
                lower = self.lower
            ),
            None => format!("{statement} AND id >= {lower}", lower = self.lower),
        }
    }
}

impl fmt::Display for IdWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "[{}, {upper})", self.lower),
            None => write!(f, "[{}, ..)", self.lower),
        }
    }
}

impl IdBounds {
    /// Built from a `min(id), max(id)` row; `None` when the candidate set is empty.
    pub fn from_row(min: Option<i64>, max: Option<i64>) -> Option<Self> {
        match (min, max) {
            (Some(min), Some(max)) if min <= max => Some(Self { min, max }),
            _ => None,
        }
    }

    /// Consecutive windows of at most `size` ids covering `[min, max]` exactly once.
    pub fn windows(&self, size: u64) -> Result<Vec<IdWindow>, PlanError> {
        if size == 0 {
            return Err(PlanError::ZeroChunkSize);
        }
        let step = i128::from(size);
        let end = i128::from(self.max) + 1;

        let mut windows = Vec::new();
        let mut lower = i128::from(self.min);
        while lower < end {
            let upper = (lower + step).min(end);
            windows.push(IdWindow {
                // lower <= max, so it always fits
                lower: i64::try_from(lower).unwrap_or(i64::MAX),
                upper: i64::try_from(upper).ok(),
            });
            lower = upper;
        }
        Ok(windows)
    }
}
