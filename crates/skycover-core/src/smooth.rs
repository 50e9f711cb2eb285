//! Neighbourhood-majority smoothing of a segmented buffer.
//!
//! Removes speckle along sky/cloud borders: a classified pixel flips class when
//! at least `votes` pixels of its `side × side` window hold a different value.
//!
//! Window layout for `side = 3` (k = 1), centre `*` at `(r, c)`:
//! ```text
//!   (r-1,c-1)  (r-1,c)  (r-1,c+1)
//!   (r,  c-1)     *     (r,  c+1)
//!   (r+1,c-1)  (r+1,c)  (r+1,c+1)
//! ```
//!
//! Pixels closer than `k` to any edge have no full window; they are copied
//! from the input unchanged. All neighbour reads come from the input buffer,
//! never from the output being written.

use serde::Serialize;

use crate::error::{CoverError, Result};
use crate::pixel_buffer::{PixelBuffer, ALPHA_MASK, OUTSIDE};

/// Window side and flip threshold for [`smooth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SmoothingParams {
    side: usize,
    votes: usize,
}

impl SmoothingParams {
    /// `side` must be odd and positive, `votes` within `[0, side²]`.
    pub fn new(side: usize, votes: usize) -> Result<Self> {
        if side == 0 || side % 2 == 0 {
            return Err(CoverError::config_range(
                "convolution.side",
                format!("{side} is not an odd positive integer"),
            ));
        }
        if votes > side * side {
            return Err(CoverError::config_range(
                "convolution.votes",
                format!("{votes} exceeds the {} pixels of a {side}x{side} window", side * side),
            ));
        }
        Ok(Self { side, votes })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn votes(&self) -> usize {
        self.votes
    }

    /// Half-width `k` of the window.
    pub fn half_width(&self) -> usize {
        self.side / 2
    }
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self { side: 5, votes: 10 }
    }
}

/// Number of pixels in the window centred on `(r, c)` whose value differs from
/// the centre. Caller guarantees the window lies inside the buffer.
#[inline]
fn disagreeing_neighbours(input: &PixelBuffer, r: usize, c: usize, k: usize) -> usize {
    let centre = input.get(r, c);
    let w = input.width();
    let data = input.as_slice();
    let mut n = 0;
    for wr in r - k..=r + k {
        let row = &data[wr * w + c - k..=wr * w + c + k];
        n += row.iter().filter(|&&px| px ^ centre != 0).count();
    }
    n
}

/// Smooth one output row. `row` is the row index, `out_row` its output slice.
fn smooth_row(input: &PixelBuffer, row: usize, out_row: &mut [u32], params: SmoothingParams) {
    let k = params.half_width();
    let h = input.height();
    let w = input.width();
    let src = &input.as_slice()[row * w..(row + 1) * w];
    out_row.copy_from_slice(src);

    if row < k || row + k >= h || w < params.side {
        return;
    }
    for c in k..w - k {
        let px = src[c];
        if px == OUTSIDE {
            continue;
        }
        out_row[c] = if disagreeing_neighbours(input, row, c, k) >= params.votes {
            ALPHA_MASK | !px
        } else {
            ALPHA_MASK | px
        };
    }
}

/// Single-pass majority-vote smoothing of a classified buffer.
pub fn smooth(input: &PixelBuffer, params: SmoothingParams) -> PixelBuffer {
    let w = input.width();
    let mut out = PixelBuffer::new(w, input.height(), OUTSIDE);
    if out.is_empty() {
        return out;
    }

    #[cfg(feature = "threading")]
    {
        use rayon::prelude::*;
        out.as_mut_slice()
            .par_chunks_mut(w)
            .enumerate()
            .for_each(|(r, out_row)| smooth_row(input, r, out_row, params));
    }

    #[cfg(not(feature = "threading"))]
    {
        for (r, out_row) in out.as_mut_slice().chunks_mut(w).enumerate() {
            smooth_row(input, r, out_row, params);
        }
    }

    out
}
