//! Error taxonomy for the cloud cover pipeline and its IO facades.
//!
//! Every stage reports failures through [`CoverError`]; nothing is recovered
//! locally. The command-line driver turns each variant into its own exit
//! status via [`CoverError::exit_code`].

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoverError>;

#[derive(Debug, Error)]
pub enum CoverError {
    /// Undecodable, rescaled or unsupported-depth image.
    #[error("image {origin}: {reason}")]
    InputFormat { origin: String, reason: String },

    /// Raw pixel data whose length does not match the declared geometry.
    #[error("pixel buffer: expected {expected} pixels, got {got}")]
    BufferSize { expected: usize, got: usize },

    /// A numeric configuration value outside its documented bounds.
    #[error("invalid {field}: {reason}")]
    ConfigRange { field: &'static str, reason: String },

    /// Configuration document that is not well-formed JSON of the right shape.
    #[error("malformed configuration: {0}")]
    ConfigParse(#[source] serde_json::Error),

    /// Mask larger than the photograph in either dimension.
    #[error(
        "mask {mask_width}x{mask_height} does not fit photograph {image_width}x{image_height}"
    )]
    Geometry {
        mask_width: usize,
        mask_height: usize,
        image_width: usize,
        image_height: usize,
    },

    /// No classified pixel fell within the radius covered by the category table.
    #[error("no classified pixel lies within the category table radius")]
    EmptyAggregation,

    /// Site geography file missing fields or holding out-of-range values.
    #[error("site description: {0}")]
    Site(String),

    /// Capture metadata (EXIF) missing or unreadable.
    #[error("capture metadata: {0}")]
    Metadata(String),

    /// Calendar fields that do not form a valid date or time.
    #[error("calendar: {0}")]
    Calendar(String),

    #[error("{}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoverError {
    pub(crate) fn input_format(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InputFormat { origin: origin.into(), reason: reason.into() }
    }

    pub(crate) fn config_range(field: &'static str, reason: impl Into<String>) -> Self {
        Self::ConfigRange { field, reason: reason.into() }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Process exit status for this error. Statuses 1–3 are reserved for the
    /// command-line layer (usage, unreadable input, unreadable config).
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConfigParse(_) => 4,
            Self::Site(_) => 5,
            Self::Metadata(_) => 6,
            Self::InputFormat { .. } => 7,
            Self::ConfigRange { .. } => 8,
            Self::Geometry { .. } => 9,
            Self::EmptyAggregation => 10,
            Self::BufferSize { .. } => 11,
            Self::Calendar(_) => 12,
            Self::Io { .. } => 13,
        }
    }
}
