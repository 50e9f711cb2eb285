//! Geographic description of the observing site.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoverError, Result};
use crate::timedate::UtcOffset;

/// Highest elevation accepted, in metres.
pub const MAX_ELEVATION: f64 = 8840.0;

/// Where the camera stands and which zone its clock keeps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SiteInfo {
    /// Degrees north, [-90, 90].
    pub latitude: f64,
    /// Degrees east, [-180, 180].
    pub longitude: f64,
    /// Metres above sea level.
    pub elevation: f64,
    pub timezone: UtcOffset,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SiteFile {
    latitude: f64,
    longitude: f64,
    elevation: f64,
    timezone: String,
}

impl SiteInfo {
    pub fn new(latitude: f64, longitude: f64, elevation: f64, timezone: UtcOffset) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoverError::Site(format!("latitude {latitude} outside [-90, 90]")));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoverError::Site(format!("longitude {longitude} outside [-180, 180]")));
        }
        if !(0.0..=MAX_ELEVATION).contains(&elevation) {
            return Err(CoverError::Site(format!("elevation {elevation} outside [0, {MAX_ELEVATION}]")));
        }
        Ok(Self { latitude, longitude, elevation, timezone })
    }

    /// Parse a site document. All four fields are required.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: SiteFile = serde_json::from_str(text).map_err(|e| CoverError::Site(e.to_string()))?;
        let timezone = UtcOffset::parse(&raw.timezone).map_err(|e| CoverError::Site(e.to_string()))?;
        Self::new(raw.latitude, raw.longitude, raw.elevation, timezone)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| CoverError::Site(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }
}

impl Default for SiteInfo {
    /// Mexico City basin.
    fn default() -> Self {
        Self { latitude: 19.3, longitude: -99.2, elevation: 2240.0, timezone: UtcOffset::from_minutes(-360) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_document() {
        let site = SiteInfo::from_json_str(
            r#"{"latitude": 51.48, "longitude": 0.0, "elevation": 46, "timezone": "UTC+00:00"}"#,
        )
        .unwrap();
        assert_eq!(site.latitude, 51.48);
        assert_eq!(site.elevation, 46.0);
        assert_eq!(site.timezone, UtcOffset::UTC);
    }

    #[test]
    fn default_site_keeps_central_time() {
        let site = SiteInfo::default();
        assert_eq!(site.timezone.to_string(), "UTC-06:00");
        assert_eq!(SiteInfo::new(site.latitude, site.longitude, site.elevation, site.timezone).unwrap(), site);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let tz = UtcOffset::UTC;
        assert!(matches!(SiteInfo::new(90.5, 0.0, 0.0, tz), Err(CoverError::Site(_))));
        assert!(SiteInfo::new(0.0, -180.1, 0.0, tz).is_err());
        assert!(SiteInfo::new(0.0, 0.0, -1.0, tz).is_err());
        assert!(SiteInfo::new(0.0, 0.0, 8841.0, tz).is_err());
        assert!(SiteInfo::new(-90.0, 180.0, MAX_ELEVATION, tz).is_ok());
    }

    #[test]
    fn unreadable_file_is_site_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(SiteInfo::load(&dir.path().join("nosite.json")), Err(CoverError::Site(_))));
        assert!(matches!(SiteInfo::load(dir.path()), Err(CoverError::Site(_))));
    }

    #[test]
    fn load_reads_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        fs::write(&path, r#"{"latitude": -33.9, "longitude": 18.4, "elevation": 10, "timezone": "UTC+02:00"}"#)
            .unwrap();
        assert_eq!(SiteInfo::load(&path).unwrap().timezone.minutes(), 120);
    }

    #[test]
    fn bad_timezone_and_missing_fields_are_site_errors() {
        let bad_tz = r#"{"latitude": 0, "longitude": 0, "elevation": 0, "timezone": "CET"}"#;
        assert!(matches!(SiteInfo::from_json_str(bad_tz), Err(CoverError::Site(_))));
        let missing = r#"{"latitude": 0, "longitude": 0}"#;
        assert!(matches!(SiteInfo::from_json_str(missing), Err(CoverError::Site(_))));
    }
}
