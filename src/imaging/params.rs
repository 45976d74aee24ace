//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the pipeline (which decides which assets to transcode)
//! and the [`backend`](super::backend) (which does the pixel work), so a mock
//! backend can stand in during tests.

use crate::types::OutputFormat;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
///
/// Only constructible through [`Quality::new`], which clamps:
///
/// ```compile_fail
/// let q = optimize_images::imaging::Quality(0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Full specification for one transcode: decode `source`, fit to
/// `max_width`, encode as `format` at `quality`, write `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Widest allowed output; narrower images are left at their size.
    pub max_width: u32,
    pub quality: Quality,
    pub format: OutputFormat,
}
