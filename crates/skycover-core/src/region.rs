//! Region-of-interest extraction: crop the photograph to the mask and cut it.

use log::debug;

use crate::error::{CoverError, Result};
use crate::pixel_buffer::PixelBuffer;

/// Offsets `(Δh, Δv)` that center a `mask` inside a `photo`.
pub fn centered_offsets(photo: &PixelBuffer, mask: &PixelBuffer) -> Result<(usize, usize)> {
    if mask.width() > photo.width() || mask.height() > photo.height() {
        return Err(CoverError::Geometry {
            mask_width: mask.width(),
            mask_height: mask.height(),
            image_width: photo.width(),
            image_height: photo.height(),
        });
    }
    Ok(((photo.width() - mask.width()) / 2, (photo.height() - mask.height()) / 2))
}

/// Intersect `photo` with `mask`.
///
/// The result has the mask's size; pixel `(r, c)` is
/// `mask(r, c) & photo(r + Δv, c + Δh)` over the full 32-bit value, so every
/// mask pixel with zero color channels cuts the photograph out of the region.
pub fn extract_region(photo: &PixelBuffer, mask: &PixelBuffer) -> Result<PixelBuffer> {
    let (dh, dv) = centered_offsets(photo, mask)?;
    let width = mask.width();
    let mut out = PixelBuffer::new(width, mask.height(), 0);

    for (r, (out_row, mask_row)) in out
        .as_mut_slice()
        .chunks_exact_mut(width.max(1))
        .zip(mask.rows())
        .enumerate()
    {
        let start = (r + dv) * photo.width() + dh;
        let photo_row = &photo.as_slice()[start..start + width];
        for ((o, &m), &p) in out_row.iter_mut().zip(mask_row).zip(photo_row) {
            *o = m & p;
        }
    }

    debug!(
        "extracted {}x{} region at offset ({dh}, {dv}) from {}x{} photograph",
        width,
        mask.height(),
        photo.width(),
        photo.height()
    );
    Ok(out)
}
