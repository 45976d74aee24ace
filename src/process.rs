//! Transcoding, copying, and the pipeline driver.
//!
//! Every file under the source root goes through the same steps:
//!
//! ```text
//! Discovered → Classified → { Transcoded | Copied | Ignored } → Tallied
//! ```
//!
//! ## Output Structure
//!
//! ```text
//! public/images/              public/optimized/images/
//! ├── hero.png          →     ├── hero.webp        (≤ 1920px wide)
//! ├── logo.svg          →     ├── logo.svg         (byte-identical)
//! ├── notes.txt               │                    (ignored)
//! └── blog/                   └── blog/
//!     └── cover.JPG     →         └── cover.webp
//! ```
//!
//! ## Failure Isolation
//!
//! A per-asset failure (unreadable file, corrupt image, write error) is sent
//! as a [`ProcessEvent::AssetFailed`] and tallied as skipped. It never stops
//! the run. Nothing is retried: the output was not written, so the next run
//! sees it as stale and tries again.
//!
//! ## Parallel Processing
//!
//! Assets are independent, so they are processed with
//! [rayon](https://docs.rs/rayon). Each worker folds its own [`RunSummary`]
//! and the partial tallies are merged at the end.

use crate::classify::{ClassificationPolicy, classify};
use crate::config::{ImagesConfig, OptimizeConfig};
use crate::freshness::needs_build;
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, Quality, RustBackend, TranscodeParams, fit_to_width,
};
use crate::scan::{self, Asset, ScanError};
use crate::types::OutputFormat;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Failure that escapes the per-asset boundary; fatal for the run.
#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Failure of a single asset. Reported and tallied, never propagated.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("could not stat source: {source}")]
    Stat {
        path: PathBuf,
        source: io::Error,
    },
    #[error("transcode failed: {source}")]
    Transcode {
        path: PathBuf,
        source: BackendError,
    },
    #[error("copy failed: {source}")]
    Copy {
        path: PathBuf,
        source: io::Error,
    },
}

impl AssetError {
    /// Source file the failure belongs to.
    pub fn path(&self) -> &Path {
        match self {
            AssetError::Stat { path, .. }
            | AssetError::Transcode { path, .. }
            | AssetError::Copy { path, .. } => path,
        }
    }
}

/// What happened to one asset that was not ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Transcoded and written.
    Built,
    /// Copied byte-for-byte.
    Copied,
    /// Output already up to date; nothing written.
    Skipped,
}

/// Counts for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub built: u32,
    pub copied: u32,
    pub skipped: u32,
}

impl RunSummary {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Built => self.built += 1,
            Outcome::Copied => self.copied += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }

    /// Combine two partial tallies.
    pub fn merge(self, other: Self) -> Self {
        Self {
            built: self.built + other.built,
            copied: self.copied + other.copied,
            skipped: self.skipped + other.skipped,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "built={} copied={} skipped={}",
            self.built, self.copied, self.skipped
        )
    }
}

/// Where an asset's output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Destination under the output root.
    pub path: PathBuf,
    /// Destination relative to the output root.
    pub relative_path: PathBuf,
}

impl OutputTarget {
    /// Mirror `asset` under `output_root`.
    ///
    /// Copy-as-is assets keep their relative path. Everything else gets its
    /// final extension replaced by `format`'s (`a.b.png` → `a.b.webp`).
    pub fn derive(asset: &Asset, output_root: &Path, format: OutputFormat) -> Self {
        let relative_path = match classify(&asset.extension) {
            ClassificationPolicy::Copy => asset.relative_path.clone(),
            _ => asset.relative_path.with_extension(format.extension()),
        };
        Self {
            path: output_root.join(&relative_path),
            relative_path,
        }
    }
}

/// Progress events sent while a run is in flight.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    /// The source root does not exist; the run did nothing.
    SourceMissing { source_root: PathBuf },
    /// Extension not handled; no output.
    AssetIgnored { relative_path: PathBuf },
    AssetProcessed {
        relative_path: PathBuf,
        output_relative: PathBuf,
        outcome: Outcome,
    },
    AssetFailed { source_path: PathBuf, error: String },
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

/// Transcode one raster asset to `target` if it is stale (or `force`).
///
/// Returns [`Outcome::Built`] or [`Outcome::Skipped`].
pub fn transcode(
    backend: &impl ImageBackend,
    source: &Path,
    target: &Path,
    images: &ImagesConfig,
    force: bool,
) -> Result<Outcome, AssetError> {
    let fail = |e: BackendError| AssetError::Transcode {
        path: source.to_path_buf(),
        source: e,
    };
    ensure_parent(target).map_err(|e| fail(e.into()))?;
    if !force && !needs_build(source, target) {
        return Ok(Outcome::Skipped);
    }
    backend
        .transcode(&TranscodeParams {
            source: source.to_path_buf(),
            output: target.to_path_buf(),
            max_width: images.max_width,
            quality: Quality::new(images.quality),
            format: images.format,
        })
        .map_err(fail)?;
    Ok(Outcome::Built)
}

/// Copy one asset byte-for-byte to `target` if it is stale (or `force`).
///
/// Returns [`Outcome::Copied`] or [`Outcome::Skipped`].
pub fn copy_as_is(source: &Path, target: &Path, force: bool) -> Result<Outcome, AssetError> {
    let fail = |e: io::Error| AssetError::Copy {
        path: source.to_path_buf(),
        source: e,
    };
    ensure_parent(target).map_err(fail)?;
    if !force && !needs_build(source, target) {
        return Ok(Outcome::Skipped);
    }
    fs::copy(source, target).map_err(fail)?;
    Ok(Outcome::Copied)
}

/// Optimize the tree described by `config` with the pure-Rust backend.
pub fn optimize(
    config: &OptimizeConfig,
    force: bool,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<RunSummary, OptimizeError> {
    optimize_with_backend(&RustBackend::new(), config, force, progress)
}

/// Optimize using a specific backend (allows testing with mock).
///
/// A missing source root is not an error: a
/// [`ProcessEvent::SourceMissing`] is sent and an empty summary returned.
pub fn optimize_with_backend(
    backend: &impl ImageBackend,
    config: &OptimizeConfig,
    force: bool,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<RunSummary, OptimizeError> {
    let emit = |event: ProcessEvent| {
        if let Some(tx) = &progress {
            // A closed receiver only means nobody is listening.
            let _ = tx.send(event);
        }
    };

    if !config.source.exists() {
        emit(ProcessEvent::SourceMissing {
            source_root: config.source.clone(),
        });
        return Ok(RunSummary::default());
    }

    let entries = scan::walk(&config.source)?;

    let summary = entries
        .par_iter()
        .fold(RunSummary::default, |mut tally, entry| {
            let outcome = match entry {
                Ok(path) => process_asset(backend, config, force, path, &emit),
                Err(err) => {
                    emit(ProcessEvent::AssetFailed {
                        source_path: err.path.clone(),
                        error: err.to_string(),
                    });
                    Outcome::Skipped
                }
            };
            tally.record(outcome);
            tally
        })
        .reduce(RunSummary::default, RunSummary::merge);

    Ok(summary)
}

/// Run one discovered file through classify → transcode/copy. Failures are
/// reported through `emit` and come back as [`Outcome::Skipped`].
fn process_asset(
    backend: &impl ImageBackend,
    config: &OptimizeConfig,
    force: bool,
    path: &Path,
    emit: &(impl Fn(ProcessEvent) + Sync),
) -> Outcome {
    let result = Asset::from_path(&config.source, path)
        .map_err(|source| AssetError::Stat {
            path: path.to_path_buf(),
            source,
        })
        .and_then(|asset| {
            let policy = classify(&asset.extension);
            if policy == ClassificationPolicy::Skip {
                return Ok((asset, None));
            }
            let target = OutputTarget::derive(&asset, &config.output, config.images.format);
            let outcome = match policy {
                ClassificationPolicy::Transcode => transcode(
                    backend,
                    &asset.source_path,
                    &target.path,
                    &config.images,
                    force,
                )?,
                _ => copy_as_is(&asset.source_path, &target.path, force)?,
            };
            Ok((asset, Some((target, outcome))))
        });

    match result {
        Ok((asset, None)) => {
            emit(ProcessEvent::AssetIgnored {
                relative_path: asset.relative_path,
            });
            Outcome::Skipped
        }
        Ok((asset, Some((target, outcome)))) => {
            emit(ProcessEvent::AssetProcessed {
                relative_path: asset.relative_path,
                output_relative: target.relative_path,
                outcome,
            });
            outcome
        }
        Err(err) => {
            emit(ProcessEvent::AssetFailed {
                source_path: err.path().to_path_buf(),
                error: err.to_string(),
            });
            Outcome::Skipped
        }
    }
}

// ============================================================================
// Dry run
// ============================================================================

/// What a run would do with one asset, computed without writing anything.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAsset {
    pub relative_path: PathBuf,
    pub policy: ClassificationPolicy,
    /// `None` for ignored assets.
    pub output_relative: Option<PathBuf>,
    /// Whether the output would be regenerated.
    pub stale: bool,
    /// Source and fitted dimensions, for rasters the backend could identify.
    pub resize: Option<(Dimensions, Dimensions)>,
}

/// Plan a run with the pure-Rust backend.
pub fn plan(config: &OptimizeConfig) -> Result<Vec<PlannedAsset>, OptimizeError> {
    plan_with_backend(&RustBackend::new(), config)
}

/// Plan a run using a specific backend. Sorted by relative path.
///
/// Entries that cannot be followed or statted are left out; the real run
/// reports them.
pub fn plan_with_backend(
    backend: &impl ImageBackend,
    config: &OptimizeConfig,
) -> Result<Vec<PlannedAsset>, OptimizeError> {
    let mut planned: Vec<PlannedAsset> = scan::walk(&config.source)?
        .iter()
        .filter_map(|entry| entry.as_ref().ok())
        .filter_map(|path| Asset::from_path(&config.source, path).ok())
        .map(|asset| {
            let policy = classify(&asset.extension);
            if policy == ClassificationPolicy::Skip {
                return PlannedAsset {
                    relative_path: asset.relative_path,
                    policy,
                    output_relative: None,
                    stale: false,
                    resize: None,
                };
            }
            let target = OutputTarget::derive(&asset, &config.output, config.images.format);
            let resize = match policy {
                ClassificationPolicy::Transcode => {
                    backend.identify(&asset.source_path).ok().map(|src| {
                        let (width, height) =
                            fit_to_width((src.width, src.height), config.images.max_width);
                        (src, Dimensions { width, height })
                    })
                }
                _ => None,
            };
            PlannedAsset {
                stale: needs_build(&asset.source_path, &target.path),
                relative_path: asset.relative_path,
                policy,
                output_relative: Some(target.relative_path),
                resize,
            }
        })
        .collect();

    planned.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{set_mtime, write_file};
    use std::sync::mpsc;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn test_config(tmp: &TempDir) -> OptimizeConfig {
        OptimizeConfig {
            source: tmp.path().join("images"),
            output: tmp.path().join("optimized"),
            ..OptimizeConfig::default()
        }
    }

    fn run(
        backend: &MockBackend,
        config: &OptimizeConfig,
        force: bool,
    ) -> (RunSummary, Vec<ProcessEvent>) {
        let (tx, rx) = mpsc::channel();
        let summary = optimize_with_backend(backend, config, force, Some(tx)).unwrap();
        (summary, rx.into_iter().collect())
    }

    /// Push every source mtime a minute into the past so fresh outputs are
    /// strictly newer regardless of filesystem timestamp granularity.
    fn age_sources(config: &OptimizeConfig) {
        let past = SystemTime::now() - Duration::from_secs(60);
        for entry in scan::walk(&config.source).unwrap() {
            set_mtime(&entry.unwrap(), past);
        }
    }

    // =========================================================================
    // RunSummary / OutputTarget
    // =========================================================================

    #[test]
    fn summary_display_format() {
        let summary = RunSummary {
            built: 1,
            copied: 2,
            skipped: 3,
        };
        assert_eq!(summary.to_string(), "built=1 copied=2 skipped=3");
    }

    #[test]
    fn summary_record_and_merge() {
        let mut a = RunSummary::default();
        a.record(Outcome::Built);
        a.record(Outcome::Skipped);
        let mut b = RunSummary::default();
        b.record(Outcome::Copied);
        b.record(Outcome::Built);
        assert_eq!(
            a.merge(b),
            RunSummary {
                built: 2,
                copied: 1,
                skipped: 1
            }
        );
    }

    #[test]
    fn summary_serializes_to_json() {
        let summary = RunSummary {
            built: 1,
            copied: 0,
            skipped: 4,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json, serde_json::json!({"built": 1, "copied": 0, "skipped": 4}));
    }

    fn asset(relative: &str) -> Asset {
        Asset {
            source_path: Path::new("/src").join(relative),
            relative_path: PathBuf::from(relative),
            extension: crate::classify::extension_of(Path::new(relative)),
            size: 1,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn target_replaces_raster_extension() {
        let target = OutputTarget::derive(
            &asset("blog/2024/Cover.JPG"),
            Path::new("/out"),
            OutputFormat::Webp,
        );
        assert_eq!(target.relative_path, PathBuf::from("blog/2024/Cover.webp"));
        assert_eq!(target.path, PathBuf::from("/out/blog/2024/Cover.webp"));
    }

    #[test]
    fn target_replaces_only_final_extension() {
        let target =
            OutputTarget::derive(&asset("photo.v2.png"), Path::new("/out"), OutputFormat::Avif);
        assert_eq!(target.relative_path, PathBuf::from("photo.v2.avif"));
    }

    #[test]
    fn target_keeps_svg_path_verbatim() {
        let target =
            OutputTarget::derive(&asset("icons/Logo.SVG"), Path::new("/out"), OutputFormat::Webp);
        assert_eq!(target.relative_path, PathBuf::from("icons/Logo.SVG"));
    }

    // =========================================================================
    // Transcoder / Copier
    // =========================================================================

    #[test]
    fn transcode_creates_parent_and_builds() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.png");
        write_file(&source, b"png");
        let target = tmp.path().join("out/deep/a.webp");
        let backend = MockBackend::new();

        let outcome =
            transcode(&backend, &source, &target, &ImagesConfig::default(), false).unwrap();

        assert_eq!(outcome, Outcome::Built);
        assert!(target.exists());
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Transcode { max_width: 1920, quality: 80, format: OutputFormat::Webp, .. }
        ));
    }

    #[test]
    fn transcode_skips_current_output() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.png");
        let target = tmp.path().join("a.webp");
        write_file(&source, b"png");
        write_file(&target, b"webp");
        set_mtime(&source, SystemTime::now() - Duration::from_secs(60));
        let backend = MockBackend::new();

        let outcome =
            transcode(&backend, &source, &target, &ImagesConfig::default(), false).unwrap();

        assert_eq!(outcome, Outcome::Skipped);
        assert_eq!(backend.transcode_count(), 0);
    }

    #[test]
    fn transcode_force_ignores_staleness() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.png");
        let target = tmp.path().join("a.webp");
        write_file(&source, b"png");
        write_file(&target, b"webp");
        set_mtime(&source, SystemTime::now() - Duration::from_secs(60));
        let backend = MockBackend::new();

        let outcome =
            transcode(&backend, &source, &target, &ImagesConfig::default(), true).unwrap();

        assert_eq!(outcome, Outcome::Built);
        assert_eq!(backend.transcode_count(), 1);
    }

    #[test]
    fn transcode_failure_names_source() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("bad.png");
        write_file(&source, b"garbage");
        let backend = MockBackend::failing_on("bad.png");

        let err = transcode(
            &backend,
            &source,
            &tmp.path().join("bad.webp"),
            &ImagesConfig::default(),
            false,
        )
        .unwrap_err();

        assert!(matches!(err, AssetError::Transcode { .. }));
        assert_eq!(err.path(), source);
    }

    #[test]
    fn copy_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("logo.svg");
        let contents = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
        write_file(&source, contents);
        let target = tmp.path().join("out/logo.svg");

        assert_eq!(copy_as_is(&source, &target, false).unwrap(), Outcome::Copied);
        assert_eq!(fs::read(&target).unwrap(), contents);
    }

    #[test]
    fn copy_overwrites_empty_output() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("logo.svg");
        let target = tmp.path().join("copy.svg");
        write_file(&source, b"<svg/>");
        write_file(&target, b"");
        set_mtime(&source, SystemTime::now() - Duration::from_secs(60));

        assert_eq!(copy_as_is(&source, &target, false).unwrap(), Outcome::Copied);
        assert_eq!(fs::read(&target).unwrap(), b"<svg/>");
    }

    #[test]
    fn copy_skips_current_output() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("logo.svg");
        let target = tmp.path().join("copy.svg");
        write_file(&source, b"<svg/>");
        write_file(&target, b"<svg/>");
        set_mtime(&source, SystemTime::now() - Duration::from_secs(60));

        assert_eq!(copy_as_is(&source, &target, false).unwrap(), Outcome::Skipped);
    }

    #[test]
    fn copy_missing_source_errors() {
        let tmp = TempDir::new().unwrap();
        let err = copy_as_is(
            &tmp.path().join("gone.svg"),
            &tmp.path().join("out.svg"),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, AssetError::Copy { .. }));
    }

    // =========================================================================
    // Pipeline driver
    // =========================================================================

    #[test]
    fn example_tree_tallies() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_file(&config.source.join("a.png"), b"png");
        write_file(&config.source.join("logo.svg"), b"<svg/>");
        write_file(&config.source.join("notes.txt"), b"hello");
        let backend = MockBackend::new();

        let (summary, _) = run(&backend, &config, false);

        assert_eq!(summary.to_string(), "built=1 copied=1 skipped=1");
        assert!(config.output.join("a.webp").exists());
        assert_eq!(fs::read(config.output.join("logo.svg")).unwrap(), b"<svg/>");
        assert!(!config.output.join("notes.txt").exists());
        assert!(!config.output.join("notes.webp").exists());
    }

    #[test]
    fn output_mirrors_nested_structure() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_file(&config.source.join("blog/2024/cover.JPG"), b"jpg");
        write_file(&config.source.join("icons/ui/close.svg"), b"<svg/>");
        let backend = MockBackend::new();

        run(&backend, &config, false);

        assert!(config.output.join("blog/2024/cover.webp").exists());
        assert!(config.output.join("icons/ui/close.svg").exists());
    }

    #[test]
    fn avif_format_changes_output_extension() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(&tmp);
        config.images.format = OutputFormat::Avif;
        write_file(&config.source.join("a.png"), b"png");
        let backend = MockBackend::new();

        run(&backend, &config, false);

        assert!(config.output.join("a.avif").exists());
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Transcode { format: OutputFormat::Avif, .. }
        ));
    }

    #[test]
    fn second_run_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_file(&config.source.join("a.png"), b"png");
        write_file(&config.source.join("b/c.jpg"), b"jpg");
        write_file(&config.source.join("logo.svg"), b"<svg/>");
        age_sources(&config);
        let backend = MockBackend::new();

        let (first, _) = run(&backend, &config, false);
        let (second, _) = run(&backend, &config, false);

        assert_eq!(first.to_string(), "built=2 copied=1 skipped=0");
        assert_eq!(second.to_string(), "built=0 copied=0 skipped=3");
        assert_eq!(backend.transcode_count(), 2);
    }

    #[test]
    fn touching_source_triggers_one_rebuild() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_file(&config.source.join("a.png"), b"png");
        write_file(&config.source.join("b.png"), b"png");
        age_sources(&config);
        let backend = MockBackend::new();
        run(&backend, &config, false);

        set_mtime(
            &config.source.join("a.png"),
            SystemTime::now() + Duration::from_secs(60),
        );
        let (after_touch, _) = run(&backend, &config, false);
        assert_eq!(after_touch.built, 1);
        assert_eq!(after_touch.skipped, 1);

        // The rebuilt output is now newer than the touched source
        set_mtime(
            &config.output.join("a.webp"),
            SystemTime::now() + Duration::from_secs(120),
        );
        let (settled, _) = run(&backend, &config, false);
        assert_eq!(settled.built, 0);
    }

    #[test]
    fn force_rebuilds_everything() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_file(&config.source.join("a.png"), b"png");
        write_file(&config.source.join("logo.svg"), b"<svg/>");
        age_sources(&config);
        let backend = MockBackend::new();
        run(&backend, &config, false);

        let (forced, _) = run(&backend, &config, true);
        assert_eq!(forced.to_string(), "built=1 copied=1 skipped=0");
    }

    #[test]
    fn one_corrupt_asset_does_not_stop_the_run() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        for name in ["a.png", "b.png", "bad.png", "c.jpg"] {
            write_file(&config.source.join(name), b"img");
        }
        write_file(&config.source.join("logo.svg"), b"<svg/>");
        let backend = MockBackend::failing_on("bad.png");

        let (summary, events) = run(&backend, &config, false);

        assert_eq!(summary.to_string(), "built=3 copied=1 skipped=1");
        let failures: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ProcessEvent::AssetFailed { source_path, error } => Some((source_path, error)),
                _ => None,
            })
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, &config.source.join("bad.png"));
        assert!(failures[0].1.contains("transcode failed"));
        assert!(!config.output.join("bad.webp").exists());
    }

    #[test]
    fn failed_asset_is_retried_next_run() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_file(&config.source.join("flaky.png"), b"img");

        let (first, _) = run(&MockBackend::failing_on("flaky.png"), &config, false);
        assert_eq!(first.skipped, 1);

        let (second, _) = run(&MockBackend::new(), &config, false);
        assert_eq!(second.built, 1);
    }

    #[test]
    fn missing_source_root_is_empty_run() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let backend = MockBackend::new();

        let (summary, events) = run(&backend, &config, false);

        assert_eq!(summary, RunSummary::default());
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ProcessEvent::SourceMissing { source_root } if *source_root == config.source
        ));
        assert!(!config.output.exists());
    }

    #[test]
    fn events_cover_every_asset() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_file(&config.source.join("a.png"), b"png");
        write_file(&config.source.join("logo.svg"), b"<svg/>");
        write_file(&config.source.join("README"), b"text");
        let backend = MockBackend::new();

        let (_, events) = run(&backend, &config, false);

        assert_eq!(events.len(), 3);
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::AssetProcessed { outcome: Outcome::Built, output_relative, .. }
                if output_relative == Path::new("a.webp")
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::AssetProcessed { outcome: Outcome::Copied, .. }
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::AssetIgnored { relative_path } if relative_path == Path::new("README")
        )));
    }

    #[test]
    fn runs_without_progress_channel() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_file(&config.source.join("a.png"), b"png");

        let summary = optimize_with_backend(&MockBackend::new(), &config, false, None).unwrap();
        assert_eq!(summary.built, 1);
    }

    // =========================================================================
    // Dry run
    // =========================================================================

    #[test]
    fn plan_writes_nothing_and_reports_actions() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_file(&config.source.join("a.png"), b"png");
        write_file(&config.source.join("logo.svg"), b"<svg/>");
        write_file(&config.source.join("notes.txt"), b"hello");
        let backend =
            MockBackend::new().with_dimensions(&config.source.join("a.png"), 2000, 1000);

        let planned = plan_with_backend(&backend, &config).unwrap();

        assert!(!config.output.exists());
        assert_eq!(planned.len(), 3);
        assert_eq!(planned[0].relative_path, PathBuf::from("a.png"));
        assert_eq!(planned[0].policy, ClassificationPolicy::Transcode);
        assert_eq!(planned[0].output_relative, Some(PathBuf::from("a.webp")));
        assert!(planned[0].stale);
        let (src, fitted) = planned[0].resize.unwrap();
        assert_eq!((src.width, src.height), (2000, 1000));
        assert_eq!((fitted.width, fitted.height), (1920, 960));

        assert_eq!(planned[1].policy, ClassificationPolicy::Copy);
        assert_eq!(planned[1].resize, None);

        assert_eq!(planned[2].policy, ClassificationPolicy::Skip);
        assert_eq!(planned[2].output_relative, None);
        assert!(backend
            .get_operations()
            .iter()
            .all(|op| matches!(op, RecordedOp::Identify(_))));
    }

    #[test]
    fn plan_missing_root_errors() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let result = plan_with_backend(&MockBackend::new(), &config);
        assert!(matches!(result, Err(OptimizeError::Scan(ScanError::NotFound(_)))));
    }
}
