//! Extension-based asset classification.
//!
//! The decision of how to handle a file is made from its extension alone.
//! The table below is the whole policy: supporting a new format is a one-line
//! edit.

use std::path::Path;

/// What the pipeline does with an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationPolicy {
    /// Decode, resize and re-encode into the target format.
    Transcode,
    /// Duplicate byte-for-byte under the same relative path.
    Copy,
    /// Leave alone; no output is produced.
    Skip,
}

/// Normalized extension (lower-cased, leading dot) → policy.
const POLICY_TABLE: &[(&str, ClassificationPolicy)] = &[
    (".jpg", ClassificationPolicy::Transcode),
    (".jpeg", ClassificationPolicy::Transcode),
    (".png", ClassificationPolicy::Transcode),
    (".gif", ClassificationPolicy::Transcode),
    (".webp", ClassificationPolicy::Transcode),
    (".avif", ClassificationPolicy::Transcode),
    (".tif", ClassificationPolicy::Transcode),
    (".tiff", ClassificationPolicy::Transcode),
    (".svg", ClassificationPolicy::Copy),
];

/// Classify a normalized extension (see [`extension_of`]).
///
/// Anything not in the table, including the empty extension, is
/// [`ClassificationPolicy::Skip`].
pub fn classify(extension: &str) -> ClassificationPolicy {
    POLICY_TABLE
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, policy)| *policy)
        .unwrap_or(ClassificationPolicy::Skip)
}

/// Lower-cased extension of `path` with its leading dot, or `""` if none.
///
/// Dotfiles such as `.gitignore` have no extension.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
