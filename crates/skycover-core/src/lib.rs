//! Cloud cover index of whole-sky photographs.
//!
//! A photograph is cut to the circular sky region of a mask, each pixel is
//! classified as sky or cloud by its red/blue ratio, speckle is removed by a
//! neighbourhood vote, and the radially weighted cloud fraction is reported.

pub mod aggregate;
pub mod capture;
pub mod categories;
pub mod classify;
pub mod config;
pub mod error;
pub mod imageio;
pub mod pipeline;
pub mod pixel_buffer;
pub mod region;
pub mod site;
pub mod smooth;
pub mod timedate;

pub use aggregate::{cloud_cover_index, CoverIndex};
pub use capture::{read_capture_time, CaptureTime};
pub use categories::{CategoryTable, CategoryTableSpec};
pub use classify::{classify, classify_pixel, PixelClass};
pub use config::RunConfig;
pub use error::{CoverError, Result};
pub use pipeline::{CoverParams, CoverPipeline, Stage};
pub use pixel_buffer::PixelBuffer;
pub use region::extract_region;
pub use site::SiteInfo;
pub use smooth::{smooth, SmoothingParams};
pub use timedate::{julian_date, CivilTime, UtcOffset};
