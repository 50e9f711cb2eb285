//! Red/blue ratio segmentation.
//!
//! Clear sky scatters blue far more than red, clouds scatter both about
//! equally. A pixel whose `red / blue` ratio falls below the threshold is sky,
//! anything at or above it is cloud.

use crate::pixel_buffer::{blue, is_outside, red, PixelBuffer, CLOUD, OUTSIDE, SKY};

/// Classification state of a segmented pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelClass {
    Outside,
    Sky,
    Cloud,
}

impl PixelClass {
    /// Sentinel pixel value stored in segmented buffers.
    pub fn to_argb(self) -> u32 {
        match self {
            PixelClass::Outside => OUTSIDE,
            PixelClass::Sky => SKY,
            PixelClass::Cloud => CLOUD,
        }
    }

    /// Decode a sentinel. Any other value is not a classified pixel.
    pub fn from_argb(px: u32) -> Option<Self> {
        match px {
            OUTSIDE => Some(PixelClass::Outside),
            SKY => Some(PixelClass::Sky),
            CLOUD => Some(PixelClass::Cloud),
            _ => None,
        }
    }
}

/// Classify a single pixel against `threshold`.
///
/// A zero blue channel has no finite ratio and is classified as cloud.
#[inline]
pub fn classify_pixel(px: u32, threshold: f64) -> PixelClass {
    if is_outside(px) {
        return PixelClass::Outside;
    }
    let b = blue(px);
    if b == 0 {
        return PixelClass::Cloud;
    }
    let ratio = red(px) as f64 / b as f64;
    if ratio < threshold {
        PixelClass::Sky
    } else {
        PixelClass::Cloud
    }
}

/// Segment every pixel of `input` into the Outside/Sky/Cloud sentinels.
pub fn classify(input: &PixelBuffer, threshold: f64) -> PixelBuffer {
    let mut out = PixelBuffer::new(input.width(), input.height(), OUTSIDE);

    #[cfg(feature = "threading")]
    {
        use rayon::prelude::*;
        out.as_mut_slice()
            .par_iter_mut()
            .zip(input.as_slice().par_iter())
            .for_each(|(o, &px)| *o = classify_pixel(px, threshold).to_argb());
    }

    #[cfg(not(feature = "threading"))]
    {
        for (o, &px) in out.as_mut_slice().iter_mut().zip(input.as_slice()) {
            *o = classify_pixel(px, threshold).to_argb();
        }
    }

    out
}
