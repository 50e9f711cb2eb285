//! Capture timestamp from a photograph's EXIF block.
//!
//! Cameras record local wall-clock time without a zone, so the timestamp is
//! only meaningful together with the site's [`UtcOffset`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{DateTime, Exif, In, Tag, Value};
use log::debug;

use crate::error::{CoverError, Result};
use crate::timedate::{CivilTime, UtcOffset};

/// Local time at which a photograph was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTime {
    local: CivilTime,
}

impl CaptureTime {
    pub fn new(local: CivilTime) -> Self {
        Self { local }
    }

    pub fn local(&self) -> CivilTime {
        self.local
    }

    pub fn to_utc(&self, offset: &UtcOffset) -> CivilTime {
        offset.to_utc(self.local)
    }

    /// Parse an EXIF `YYYY:MM:DD HH:MM:SS` value.
    pub fn from_exif_ascii(text: &[u8]) -> Result<Self> {
        let dt = DateTime::from_ascii(text).map_err(|e| CoverError::Metadata(format!("bad timestamp: {e}")))?;
        let local = CivilTime::new(
            dt.year as i32,
            dt.month as u32,
            dt.day as u32,
            dt.hour as u32,
            dt.minute as u32,
            dt.second as u32,
        )
        .map_err(|e| CoverError::Metadata(e.to_string()))?;
        Ok(Self { local })
    }

    /// `DateTimeOriginal`, falling back to the file-level `DateTime`.
    pub fn from_exif(exif: &Exif) -> Result<Self> {
        for tag in [Tag::DateTimeOriginal, Tag::DateTime] {
            let Some(field) = exif.get_field(tag, In::PRIMARY) else {
                continue;
            };
            if let Value::Ascii(ref parts) = field.value {
                if let Some(text) = parts.first() {
                    return Self::from_exif_ascii(text);
                }
            }
        }
        Err(CoverError::Metadata("no capture timestamp in EXIF".into()))
    }
}

/// Read the capture time of the photograph at `path`.
pub fn read_capture_time(path: &Path) -> Result<CaptureTime> {
    let file = File::open(path).map_err(|e| CoverError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| CoverError::Metadata(format!("{}: {e}", path.display())))?;
    let time = CaptureTime::from_exif(&exif)?;
    debug!("{} captured at {} local", path.display(), time.local);
    Ok(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const STAMP: &[u8; 20] = b"2013:06:09 20:30:15\0";

    /// Little-endian TIFF: IFD0 holding only the Exif pointer, Exif IFD holding
    /// only `DateTimeOriginal`.
    fn tiff_with_original_time() -> Vec<u8> {
        let mut t = Vec::new();
        t.extend_from_slice(b"II\x2A\x00");
        t.extend_from_slice(&8u32.to_le_bytes());
        // IFD0 at 8
        t.extend_from_slice(&1u16.to_le_bytes());
        t.extend_from_slice(&0x8769u16.to_le_bytes());
        t.extend_from_slice(&4u16.to_le_bytes());
        t.extend_from_slice(&1u32.to_le_bytes());
        t.extend_from_slice(&26u32.to_le_bytes());
        t.extend_from_slice(&0u32.to_le_bytes());
        // Exif IFD at 26
        t.extend_from_slice(&1u16.to_le_bytes());
        t.extend_from_slice(&0x9003u16.to_le_bytes());
        t.extend_from_slice(&2u16.to_le_bytes());
        t.extend_from_slice(&(STAMP.len() as u32).to_le_bytes());
        t.extend_from_slice(&44u32.to_le_bytes());
        t.extend_from_slice(&0u32.to_le_bytes());
        // value at 44
        t.extend_from_slice(STAMP);
        t
    }

    fn jpeg_with_exif() -> Vec<u8> {
        let mut payload = b"Exif\0\0".to_vec();
        payload.extend(tiff_with_original_time());
        let mut j = vec![0xFF, 0xD8, 0xFF, 0xE1];
        j.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        j.extend(payload);
        j.extend_from_slice(&[0xFF, 0xD9]);
        j
    }

    #[test]
    fn parses_exif_ascii() {
        let t = CaptureTime::from_exif_ascii(b"2013:06:09 20:30:15").unwrap();
        assert_eq!(t.local(), CivilTime::new(2013, 6, 9, 20, 30, 15).unwrap());
        assert!(matches!(CaptureTime::from_exif_ascii(b"yesterday"), Err(CoverError::Metadata(_))));
        assert!(matches!(CaptureTime::from_exif_ascii(b"2013:02:30 00:00:00"), Err(CoverError::Metadata(_))));
    }

    #[test]
    fn reads_original_time_from_raw_exif() {
        let exif = exif::Reader::new().read_raw(tiff_with_original_time()).unwrap();
        let t = CaptureTime::from_exif(&exif).unwrap();
        assert_eq!(t.local().hour, 20);
    }

    #[test]
    fn reads_capture_time_from_jpeg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sky.jpg");
        fs::write(&path, jpeg_with_exif()).unwrap();
        let t = read_capture_time(&path).unwrap();
        let utc = t.to_utc(&UtcOffset::parse("UTC-06:00").unwrap());
        assert_eq!(utc, CivilTime::new(2013, 6, 10, 2, 30, 15).unwrap());
    }

    #[test]
    fn png_without_exif_is_metadata_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.png");
        image::RgbImage::new(2, 2).save(&path).unwrap();
        assert!(matches!(read_capture_time(&path), Err(CoverError::Metadata(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_capture_time(&dir.path().join("gone.jpg")), Err(CoverError::Io { .. })));
    }
}
