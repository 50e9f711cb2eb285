use crate::error::{CoverError, Result};

/// Outside the region of interest: fully transparent black.
pub const OUTSIDE: u32 = 0x0000_0000;
/// Sky pixel: fully opaque black.
pub const SKY: u32 = 0xFF00_0000;
/// Cloud pixel: fully opaque white.
pub const CLOUD: u32 = 0xFFFF_FFFF;

pub const ALPHA_MASK: u32 = 0xFF00_0000;
pub const COLOR_MASK: u32 = 0x00FF_FFFF;

#[inline]
pub fn alpha(px: u32) -> u8 {
    (px >> 24) as u8
}

#[inline]
pub fn red(px: u32) -> u8 {
    (px >> 16) as u8
}

#[inline]
pub fn green(px: u32) -> u8 {
    (px >> 8) as u8
}

#[inline]
pub fn blue(px: u32) -> u8 {
    px as u8
}

/// Pack channels as `0xAARRGGBB`.
#[inline]
pub fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// True when all three color channels are zero, whatever the alpha.
#[inline]
pub fn is_outside(px: u32) -> bool {
    px & COLOR_MASK == 0
}

/// A dense W×H grid of packed `0xAARRGGBB` pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u32>,
    width: usize,
    height: usize,
}

impl PixelBuffer {
    /// Create a buffer filled with `fill`.
    pub fn new(width: usize, height: usize, fill: u32) -> Self {
        Self { data: vec![fill; width * height], width, height }
    }

    /// Wrap existing row-major pixel data. Fails unless `data.len() == width * height`.
    pub fn from_raw(width: usize, height: usize, data: Vec<u32>) -> Result<Self> {
        let expected = width * height;
        if data.len() != expected {
            return Err(CoverError::BufferSize { expected, got: data.len() });
        }
        Ok(Self { data, width, height })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        assert!(row < self.height && col < self.width, "pixel ({row}, {col}) outside {}x{}", self.width, self.height);
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, px: u32) {
        assert!(row < self.height && col < self.width, "pixel ({row}, {col}) outside {}x{}", self.width, self.height);
        self.data[row * self.width + col] = px;
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u32> {
        self.data
    }

    /// Iterate over rows as `width`-long slices.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        // chunks_exact panics on a zero chunk size.
        self.data.chunks_exact(self.width.max(1))
    }

    /// Count pixels equal to `px`.
    pub fn count(&self, px: u32) -> usize {
        self.data.iter().filter(|&&v| v == px).count()
    }
}
