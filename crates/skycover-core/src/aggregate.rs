//! Radially weighted cloud cover integration.
//!
//! For every classified pixel (r, c):
//!   d² = (r − H/2)² + (c − W/2)²        (integer centre, truncated)
//!   i  = first category with boundary ≥ d²
//!   total += factor[i];  cloud += factor[i] if the pixel is cloud
//! CCI = cloud / total. Pixels past the last boundary do not contribute.

use log::debug;
use serde::Serialize;

use crate::categories::CategoryTable;
use crate::error::{CoverError, Result};
use crate::classify::PixelClass;
use crate::pixel_buffer::PixelBuffer;

/// Cloud cover index plus the totals it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverIndex {
    /// Weighted cloud area over weighted total area, in [0, 1].
    pub cci: f64,
    /// Weighted area of all counted pixels.
    pub total_area: f64,
    /// Weighted area of counted cloud pixels.
    pub cloud_area: f64,
    /// Number of counted pixels (sky + cloud within the table radius).
    pub pixel_count: usize,
    /// Number of counted cloud pixels.
    pub cloud_count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Partial {
    total_area: f64,
    cloud_area: f64,
    pixel_count: usize,
    cloud_count: usize,
}

impl Partial {
    fn add(mut self, other: Partial) -> Partial {
        self.total_area += other.total_area;
        self.cloud_area += other.cloud_area;
        self.pixel_count += other.pixel_count;
        self.cloud_count += other.cloud_count;
        self
    }
}

#[inline]
fn sq_distance(r: usize, c: usize, rc: usize, cc: usize) -> u64 {
    let dr = r.abs_diff(rc) as u64;
    let dc = c.abs_diff(cc) as u64;
    dr * dr + dc * dc
}

fn accumulate_row(row: &[u32], r: usize, rc: usize, cc: usize, table: &CategoryTable) -> Partial {
    let mut p = Partial::default();
    for (c, &px) in row.iter().enumerate() {
        let is_cloud = match PixelClass::from_argb(px) {
            Some(PixelClass::Sky) => false,
            Some(PixelClass::Cloud) => true,
            _ => continue,
        };
        let Some(factor) = table.factor_for(sq_distance(r, c, rc, cc)) else {
            continue;
        };
        p.total_area += factor;
        p.pixel_count += 1;
        if is_cloud {
            p.cloud_area += factor;
            p.cloud_count += 1;
        }
    }
    p
}

/// Compute the cloud cover index of a smoothed segmentation.
///
/// Row partials are summed in row order in both the sequential and the
/// `threading` build, so the two produce identical results.
pub fn cloud_cover_index(buf: &PixelBuffer, table: &CategoryTable) -> Result<CoverIndex> {
    let rc = buf.height() / 2;
    let cc = buf.width() / 2;

    #[cfg(feature = "threading")]
    let partials: Vec<Partial> = {
        use rayon::prelude::*;
        let rows: Vec<&[u32]> = buf.rows().collect();
        rows.par_iter()
            .enumerate()
            .map(|(r, row)| accumulate_row(row, r, rc, cc, table))
            .collect()
    };

    #[cfg(not(feature = "threading"))]
    let partials: Vec<Partial> = buf
        .rows()
        .enumerate()
        .map(|(r, row)| accumulate_row(row, r, rc, cc, table))
        .collect();

    let sum = partials.into_iter().fold(Partial::default(), Partial::add);
    debug!(
        "aggregated {} pixels ({} cloud), weighted area {:.3}",
        sum.pixel_count, sum.cloud_count, sum.total_area
    );

    if sum.pixel_count == 0 || sum.total_area <= 0.0 {
        return Err(CoverError::EmptyAggregation);
    }
    let cci = sum.cloud_area / sum.total_area;
    Ok(CoverIndex {
        cci,
        total_area: sum.total_area,
        cloud_area: sum.cloud_area,
        pixel_count: sum.pixel_count,
        cloud_count: sum.cloud_count,
    })
}
