//! Decoding photographs and masks into [`PixelBuffer`]s, and writing buffers
//! back out as PNG.

use std::io::{BufRead, Cursor, Seek};
use std::path::Path;

use image::{ColorType, ImageDecoder, ImageError, ImageFormat, ImageReader, RgbaImage};
use log::debug;

use crate::error::{CoverError, Result};
use crate::pixel_buffer::{alpha, blue, green, pack_argb, red, PixelBuffer};

/// Decode the image file at `path`. The format is sniffed from its content.
pub fn decode_file(path: &Path) -> Result<PixelBuffer> {
    let origin = path.display().to_string();
    let reader = ImageReader::open(path).map_err(|e| CoverError::io(path, e))?;
    decode_reader(reader, &origin)
}

/// Decode an in-memory encoded image.
pub fn decode_bytes(bytes: &[u8]) -> Result<PixelBuffer> {
    decode_reader(ImageReader::new(Cursor::new(bytes)), "<memory>")
}

fn decode_reader<R: BufRead + Seek>(reader: ImageReader<R>, origin: &str) -> Result<PixelBuffer> {
    let reader = reader
        .with_guessed_format()
        .map_err(|e| CoverError::input_format(origin, e.to_string()))?;
    let decoder = reader
        .into_decoder()
        .map_err(|e| CoverError::input_format(origin, e.to_string()))?;

    let (w, h) = decoder.dimensions();
    let color = decoder.color_type();
    let channels = match color {
        ColorType::Rgb8 => 3,
        ColorType::Rgba8 => 4,
        other => {
            return Err(CoverError::input_format(
                origin,
                format!("unsupported pixel layout {other:?}, expected 8-bit RGB or RGBA"),
            ))
        }
    };

    // Decoders here always produce the header resolution, so the pixel
    // grid matches the radius mapping of the mask; only the size can be too
    // large to address.
    let (w, h) = (w as usize, h as usize);
    let len = usize::try_from(decoder.total_bytes())
        .map_err(|_| CoverError::input_format(origin, format!("{w}x{h} image is too large to decode")))?;
    let mut bytes = vec![0u8; len];
    decoder
        .read_image(&mut bytes)
        .map_err(|e| CoverError::input_format(origin, e.to_string()))?;

    let data: Vec<u32> = match channels {
        3 => bytes.chunks_exact(3).map(|p| pack_argb(0xFF, p[0], p[1], p[2])).collect(),
        _ => bytes.chunks_exact(4).map(|p| pack_argb(p[3], p[0], p[1], p[2])).collect(),
    };
    debug!("decoded {origin}: {w}x{h} {color:?}");
    PixelBuffer::from_raw(w, h, data)
}

/// Write `buf` as an 8-bit RGBA PNG.
pub fn encode_png(buf: &PixelBuffer, path: &Path) -> Result<()> {
    let origin = path.display().to_string();
    let too_large = || CoverError::input_format(&origin, "dimensions exceed PNG limits");
    let w = u32::try_from(buf.width()).map_err(|_| too_large())?;
    let h = u32::try_from(buf.height()).map_err(|_| too_large())?;

    let bytes: Vec<u8> = buf
        .as_slice()
        .iter()
        .flat_map(|&px| [red(px), green(px), blue(px), alpha(px)])
        .collect();
    let img = RgbaImage::from_raw(w, h, bytes).ok_or_else(too_large)?;
    img.save_with_format(path, ImageFormat::Png).map_err(|e| match e {
        ImageError::IoError(io) => CoverError::io(path, io),
        other => CoverError::input_format(&origin, other.to_string()),
    })?;
    debug!("wrote {origin}: {w}x{h}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::{CLOUD, OUTSIDE, SKY};
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn segmented_buffer_survives_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.png");
        let mut buf = PixelBuffer::new(4, 3, SKY);
        buf.set(0, 0, OUTSIDE);
        buf.set(2, 3, CLOUD);
        encode_png(&buf, &path).unwrap();
        assert_eq!(decode_file(&path).unwrap(), buf);
    }

    #[test]
    fn rgb_input_is_opaque() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(1, 0, Rgb([10, 20, 30]));
        img.save(&path).unwrap();

        let buf = decode_file(&path).unwrap();
        assert_eq!((buf.width(), buf.height()), (2, 2));
        assert_eq!(buf.get(0, 1), 0xFF0A_141E);
        assert_eq!(buf.get(1, 1), 0xFF00_0000);
    }

    #[test]
    fn decoded_grid_has_header_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.jpg");
        RgbImage::from_pixel(37, 19, Rgb([90, 120, 200])).save(&path).unwrap();
        let (hw, hh) = image::image_dimensions(&path).unwrap();
        let buf = decode_file(&path).unwrap();
        assert_eq!((buf.width(), buf.height()), (hw as usize, hh as usize));
        assert_eq!(buf.len(), 37 * 19);
    }

    #[test]
    fn grayscale_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grey.png");
        GrayImage::from_pixel(3, 3, Luma([128])).save(&path).unwrap();
        assert!(matches!(decode_file(&path), Err(CoverError::InputFormat { .. })));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(matches!(decode_bytes(b"not an image"), Err(CoverError::InputFormat { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(decode_file(&dir.path().join("none.jpg")), Err(CoverError::Io { .. })));
    }

    #[test]
    fn decode_bytes_reads_encoded_png() {
        let mut encoded = Vec::new();
        RgbImage::from_pixel(3, 1, Rgb([200, 100, 50]))
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .unwrap();
        let buf = decode_bytes(&encoded).unwrap();
        assert_eq!(buf.as_slice(), &[0xFFC8_6432; 3]);
    }
}
