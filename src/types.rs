//! Shared types used across the pipeline.
//!
//! These appear in `optimize.toml`, on the command line, and in the
//! imaging parameters, so they live in one place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoding every raster asset is transcoded into.
///
/// Only one format is produced per run. The output filename keeps its stem
/// and takes [`OutputFormat::extension`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy WebP.
    #[default]
    Webp,
    /// AVIF (AV1 still image), encoded with rav1e.
    Avif,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
