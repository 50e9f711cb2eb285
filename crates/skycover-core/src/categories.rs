//! Radial distortion-correction table.
//!
//! The lens deforms areas as a function of distance from the image center.
//! Each pixel's squared radial distance selects a category, and the category
//! carries the weight that pixel contributes to the area integration.

use std::borrow::Cow;

use serde::Deserialize;

use crate::error::{CoverError, Result};

/// Number of categories in the standard lens table.
pub const STANDARD_LEN: usize = 36;

/// Squared-distance upper bounds (inclusive) of each category, ascending.
pub const STANDARD_BOUNDARIES: [u64; STANDARD_LEN] = [
    4225, 44944, 88209, 133956, 184900, 242064, 308025, 386884, 492804, 929296,
    1028196, 1102500, 1162084, 1212201, 1258884, 1299600, 1336336, 1371241, 1401856, 1432809,
    1461681, 1488400, 1512900, 1537600, 1560001, 1582564, 1602756, 1623076, 1640961, 1661521,
    1679616, 1695204, 1713481, 1729225, 1745041, 1750329,
];

/// Area weight for each category, positionally paired with [`STANDARD_BOUNDARIES`].
pub const STANDARD_FACTORS: [f64; STANDARD_LEN] = [
    1.00, 0.99, 0.98, 0.97, 0.96, 0.95, 0.94, 0.93, 0.92, 0.91,
    1.00, 0.99, 0.98, 0.97, 0.96, 0.95, 0.94, 0.93, 0.92, 1.01,
    1.02, 1.03, 1.04, 1.05, 1.06, 1.07, 1.08, 1.09, 1.10, 1.11,
    1.12, 1.13, 1.14, 1.15, 1.16, 1.17,
];

/// Sorted squared-distance boundaries with their correction factors.
///
/// Factor `i` applies to squared distances in `(boundaries[i-1], boundaries[i]]`,
/// factor 0 to `[0, boundaries[0]]`. Distances above the last boundary are
/// outside the mapped region.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTable {
    boundaries: Cow<'static, [u64]>,
    factors: Cow<'static, [f64]>,
}

/// Serialized form of a custom table: two parallel arrays.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryTableSpec {
    pub boundaries: Vec<u64>,
    pub factors: Vec<f64>,
}

impl CategoryTable {
    /// The 36-category table calibrated for the reference whole-sky lens.
    pub const STANDARD: CategoryTable = CategoryTable {
        boundaries: Cow::Borrowed(&STANDARD_BOUNDARIES),
        factors: Cow::Borrowed(&STANDARD_FACTORS),
    };

    /// Build a table, checking it is non-empty, equally long, strictly
    /// ascending and carries only positive finite factors.
    pub fn new(boundaries: Vec<u64>, factors: Vec<f64>) -> Result<Self> {
        if boundaries.is_empty() {
            return Err(CoverError::config_range("categories", "table is empty"));
        }
        if boundaries.len() != factors.len() {
            return Err(CoverError::config_range(
                "categories",
                format!("{} boundaries but {} factors", boundaries.len(), factors.len()),
            ));
        }
        if let Some(i) = boundaries.windows(2).position(|w| w[0] >= w[1]) {
            return Err(CoverError::config_range(
                "categories",
                format!("boundaries not strictly ascending at index {}", i + 1),
            ));
        }
        if let Some(i) = factors.iter().position(|f| !f.is_finite() || *f <= 0.0) {
            return Err(CoverError::config_range(
                "categories",
                format!("factor {} at index {i} is not positive", factors[i]),
            ));
        }
        Ok(Self { boundaries: Cow::Owned(boundaries), factors: Cow::Owned(factors) })
    }

    pub fn from_spec(spec: CategoryTableSpec) -> Result<Self> {
        Self::new(spec.boundaries, spec.factors)
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn boundaries(&self) -> &[u64] {
        &self.boundaries
    }

    pub fn factors(&self) -> &[f64] {
        &self.factors
    }

    /// Largest squared distance still inside the mapped region.
    pub fn max_sq_distance(&self) -> u64 {
        self.boundaries.last().copied().unwrap_or(0)
    }

    /// Boundary search: index of the first boundary `>= sq_dist`.
    /// An exact hit resolves to that index; `None` past the last boundary.
    #[inline]
    pub fn search(&self, sq_dist: u64) -> Option<usize> {
        let idx = self.boundaries.partition_point(|&b| b < sq_dist);
        (idx < self.boundaries.len()).then_some(idx)
    }

    /// Correction weight for a squared distance, if it is inside the table.
    #[inline]
    pub fn factor_for(&self, sq_dist: u64) -> Option<f64> {
        self.search(sq_dist).map(|i| self.factors[i])
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::STANDARD
    }
}
