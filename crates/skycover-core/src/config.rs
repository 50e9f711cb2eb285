//! Run configuration: which mask and site to use and how to segment.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::categories::{CategoryTable, CategoryTableSpec};
use crate::error::{CoverError, Result};
use crate::pipeline::{check_threshold, CoverParams, DEFAULT_THRESHOLD};
use crate::smooth::SmoothingParams;

pub const DEFAULT_MASK_FILE: &str = "imagemask.png";

/// Smoothing window as written in the document. Signed, so that a negative
/// value is reported as out of range rather than as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvolutionConfig {
    pub side: i64,
    pub votes: i64,
}

impl Default for ConvolutionConfig {
    fn default() -> Self {
        let d = SmoothingParams::default();
        Self { side: d.side() as i64, votes: d.votes() as i64 }
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| CoverError::config_range(field, format!("{value} is negative")))
}

/// Parsed and validated run configuration. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub mask_file: PathBuf,
    /// Site description; the default site applies when absent.
    pub location_file: Option<PathBuf>,
    /// Camera orientation in degrees, [0, 360).
    pub azimuth: f64,
    pub rb_threshold: f64,
    pub convolution: ConvolutionConfig,
    /// Custom radial table; the standard lens table applies when absent.
    pub categories: Option<CategoryTableSpec>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mask_file: PathBuf::from(DEFAULT_MASK_FILE),
            location_file: None,
            azimuth: 0.0,
            rb_threshold: DEFAULT_THRESHOLD,
            convolution: ConvolutionConfig::default(),
            categories: None,
        }
    }
}

impl RunConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(text).map_err(CoverError::ConfigParse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file. Relative `mask_file` and `location_file`
    /// paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CoverError::io(path, e))?;
        let mut config = Self::from_json_str(&text)?;
        if let Some(dir) = path.parent() {
            config.mask_file = dir.join(&config.mask_file);
            config.location_file = config.location_file.map(|p| dir.join(p));
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..360.0).contains(&self.azimuth) {
            return Err(CoverError::config_range("azimuth", format!("{} is outside [0, 360)", self.azimuth)));
        }
        check_threshold(self.rb_threshold)?;
        self.smoothing()?;
        self.category_table()?;
        Ok(())
    }

    pub fn smoothing(&self) -> Result<SmoothingParams> {
        SmoothingParams::new(
            non_negative("convolution.side", self.convolution.side)?,
            non_negative("convolution.votes", self.convolution.votes)?,
        )
    }

    pub fn cover_params(&self) -> Result<CoverParams> {
        let smoothing = self.smoothing()?;
        CoverParams::new(self.rb_threshold, smoothing.side(), smoothing.votes())
    }

    pub fn category_table(&self) -> Result<CategoryTable> {
        match &self.categories {
            Some(spec) => CategoryTable::from_spec(spec.clone()),
            None => Ok(CategoryTable::STANDARD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: CoverError) -> &'static str {
        match err {
            CoverError::ConfigRange { field, .. } => field,
            other => panic!("expected a range error, got {other}"),
        }
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config = RunConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.cover_params().unwrap(), CoverParams::default());
        assert_eq!(config.category_table().unwrap(), CategoryTable::STANDARD);
    }

    #[test]
    fn full_document() {
        let config = RunConfig::from_json_str(
            r#"{
                "mask_file": "masks/east.png",
                "location_file": "site.json",
                "azimuth": 270.5,
                "rb_threshold": 0.65,
                "convolution": { "side": 3, "votes": 6 },
                "categories": { "boundaries": [100, 400], "factors": [1.0, 1.2] }
            }"#,
        )
        .unwrap();
        assert_eq!(config.mask_file, PathBuf::from("masks/east.png"));
        assert_eq!(config.location_file, Some(PathBuf::from("site.json")));
        let params = config.cover_params().unwrap();
        assert_eq!(params.threshold, 0.65);
        assert_eq!(params.smoothing.side(), 3);
        assert_eq!(params.smoothing.votes(), 6);
        assert_eq!(config.category_table().unwrap().len(), 2);
    }

    #[test]
    fn partial_convolution_keeps_other_default() {
        let config = RunConfig::from_json_str(r#"{"convolution": {"side": 7}}"#).unwrap();
        assert_eq!(config.convolution, ConvolutionConfig { side: 7, votes: 10 });
    }

    #[test]
    fn out_of_range_values_name_their_field() {
        let cases = [
            (r#"{"azimuth": 360}"#, "azimuth"),
            (r#"{"azimuth": -1}"#, "azimuth"),
            (r#"{"rb_threshold": 1.5}"#, "rb_threshold"),
            (r#"{"convolution": {"side": 4}}"#, "convolution.side"),
            (r#"{"convolution": {"side": 3, "votes": 10}}"#, "convolution.votes"),
            (r#"{"convolution": {"side": -3}}"#, "convolution.side"),
            (r#"{"convolution": {"votes": -1}}"#, "convolution.votes"),
            (r#"{"categories": {"boundaries": [5, 1], "factors": [1, 1]}}"#, "categories"),
        ];
        for (text, field) in cases {
            assert_eq!(field_of(RunConfig::from_json_str(text).unwrap_err()), field, "{text}");
        }
    }

    #[test]
    fn malformed_documents_are_parse_errors() {
        for text in ["", "{", r#"{"rb_threshold": "high"}"#, r#"{"colour": 1}"#] {
            assert!(matches!(RunConfig::from_json_str(text), Err(CoverError::ConfigParse(_))), "{text}");
        }
    }

    #[test]
    fn load_resolves_paths_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cci.json");
        fs::write(&path, r#"{"location_file": "site.json"}"#).unwrap();
        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.mask_file, dir.path().join(DEFAULT_MASK_FILE));
        assert_eq!(config.location_file, Some(dir.path().join("site.json")));
    }

    #[test]
    fn load_of_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(RunConfig::load(&dir.path().join("nope.json")), Err(CoverError::Io { .. })));
    }
}
