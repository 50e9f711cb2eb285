//! Pipeline driver: region extraction → classification → smoothing → aggregation.

use log::info;
use serde::Serialize;

use crate::aggregate::{cloud_cover_index, CoverIndex};
use crate::categories::CategoryTable;
use crate::classify::classify;
use crate::error::{CoverError, Result};
use crate::pixel_buffer::PixelBuffer;
use crate::region::extract_region;
use crate::smooth::{smooth, SmoothingParams};

/// Default red/blue threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Numeric inputs of the classifier and smoother.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverParams {
    /// Red/blue ratio below which a pixel is sky.
    pub threshold: f64,
    pub smoothing: SmoothingParams,
}

impl CoverParams {
    /// `threshold` must lie in [0, 1]; see [`SmoothingParams::new`] for the rest.
    pub fn new(threshold: f64, side: usize, votes: usize) -> Result<Self> {
        check_threshold(threshold)?;
        Ok(Self { threshold, smoothing: SmoothingParams::new(side, votes)? })
    }
}

impl Default for CoverParams {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD, smoothing: SmoothingParams::default() }
    }
}

pub(crate) fn check_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(CoverError::config_range(
            "rb_threshold",
            format!("{threshold} is outside [0, 1]"),
        ));
    }
    Ok(())
}

/// Intermediate buffers a caller may want to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Photograph cut to the mask.
    Cropped,
    /// Classified and smoothed segmentation.
    Segmented,
}

/// Runs the four stages in order over one photograph.
pub struct CoverPipeline {
    params: CoverParams,
    table: CategoryTable,
}

impl CoverPipeline {
    pub fn new(params: CoverParams, table: CategoryTable) -> Self {
        Self { params, table }
    }

    pub fn params(&self) -> &CoverParams {
        &self.params
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Compute the cloud cover index of `photo` seen through `mask`.
    pub fn run(&self, photo: PixelBuffer, mask: PixelBuffer) -> Result<CoverIndex> {
        self.run_with(photo, mask, |_, _| {})
    }

    /// Like [`run`](Self::run), handing each intermediate buffer to `observe`
    /// before it is consumed by the next stage.
    pub fn run_with<F>(&self, photo: PixelBuffer, mask: PixelBuffer, mut observe: F) -> Result<CoverIndex>
    where
        F: FnMut(Stage, &PixelBuffer),
    {
        info!(
            "processing {}x{} photograph with {}x{} mask",
            photo.width(),
            photo.height(),
            mask.width(),
            mask.height()
        );

        // ── 1. Region extraction ────────────────────────────────────────────
        let cropped = extract_region(&photo, &mask)?;
        drop(photo);
        drop(mask);
        observe(Stage::Cropped, &cropped);

        // ── 2. Classification ───────────────────────────────────────────────
        let classified = classify(&cropped, self.params.threshold);
        drop(cropped);

        // ── 3. Smoothing ────────────────────────────────────────────────────
        let smoothed = smooth(&classified, self.params.smoothing);
        drop(classified);
        observe(Stage::Segmented, &smoothed);

        // ── 4. Aggregation ──────────────────────────────────────────────────
        let index = cloud_cover_index(&smoothed, &self.table)?;
        info!(
            "CCI {:.6} over {} pixels (weighted area {:.3})",
            index.cci, index.pixel_count, index.total_area
        );
        Ok(index)
    }
}

impl Default for CoverPipeline {
    fn default() -> Self {
        Self::new(CoverParams::default(), CategoryTable::STANDARD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::{pack_argb, CLOUD, SKY};

    #[test]
    fn params_reject_threshold_outside_unit_interval() {
        assert!(CoverParams::new(-0.1, 5, 10).is_err());
        assert!(CoverParams::new(1.1, 5, 10).is_err());
        assert!(CoverParams::new(f64::NAN, 5, 10).is_err());
        assert!(CoverParams::new(0.0, 5, 10).is_ok());
        assert!(CoverParams::new(1.0, 5, 10).is_ok());
    }

    #[test]
    fn five_by_five_cloud_field_is_fully_covered() {
        // red / blue = 2.0, above the 0.8 threshold.
        let photo = PixelBuffer::new(5, 5, pack_argb(0xFF, 200, 120, 100));
        let mask = PixelBuffer::new(5, 5, 0xFFFF_FFFF);
        let index = CoverPipeline::default().run(photo, mask).unwrap();
        assert_eq!(index.cci, 1.0);
        assert_eq!(index.pixel_count, 25);
    }

    #[test]
    fn observer_sees_cropped_then_segmented() {
        let photo = PixelBuffer::new(9, 9, pack_argb(0xFF, 20, 60, 200));
        let mask = PixelBuffer::new(5, 5, 0xFFFF_FFFF);
        let mut seen = Vec::new();
        let index = CoverPipeline::default()
            .run_with(photo, mask, |stage, buf| seen.push((stage, buf.width(), buf.count(SKY))))
            .unwrap();
        assert_eq!(seen, vec![(Stage::Cropped, 5, 0), (Stage::Segmented, 5, 25)]);
        assert_eq!(index.cci, 0.0);
    }

    #[test]
    fn geometry_error_propagates() {
        let photo = PixelBuffer::new(3, 3, CLOUD);
        let mask = PixelBuffer::new(5, 5, CLOUD);
        assert!(matches!(
            CoverPipeline::default().run(photo, mask),
            Err(CoverError::Geometry { .. })
        ));
    }
}
