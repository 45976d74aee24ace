//! Optimizer configuration.
//!
//! Settings are layered, lowest priority first:
//!
//! 1. stock defaults ([`OptimizeConfig::default`])
//! 2. `optimize.toml` (optional; path set with `--config`)
//! 3. command-line flags ([`ConfigOverrides`])
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source = "public/images"             # Tree to optimize
//! output = "public/optimized/images"   # Mirror tree to write
//!
//! [images]
//! max_width = 1920   # Wider rasters are scaled down, narrower ones untouched
//! quality = 80       # Encoder quality (1-100)
//! format = "webp"    # "webp" or "avif"
//!
//! [processing]
//! max_processes = 4  # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "optimize.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything a pipeline run needs to know, passed in explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizeConfig {
    /// Root of the source image tree.
    pub source: PathBuf,
    /// Root of the mirrored output tree.
    pub output: PathBuf,
    /// Transcode settings.
    pub images: ImagesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("public/images"),
            output: PathBuf::from("public/optimized/images"),
            images: ImagesConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl OptimizeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.max_width == 0 {
            return Err(ConfigError::Validation(
                "images.max_width must be non-zero".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        // Otherwise every run re-optimizes the previous run's outputs.
        if self.output.starts_with(&self.source) {
            return Err(ConfigError::Validation(format!(
                "output directory {} must not be inside source directory {}",
                self.output.display(),
                self.source.display()
            )));
        }
        Ok(())
    }

    /// Apply command-line overrides on top of file/default values.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(source) = &overrides.source {
            self.source = source.clone();
        }
        if let Some(output) = &overrides.output {
            self.output = output.clone();
        }
        if let Some(max_width) = overrides.max_width {
            self.images.max_width = max_width;
        }
        if let Some(quality) = overrides.quality {
            self.images.quality = quality;
        }
        if let Some(format) = overrides.format {
            self.images.format = format;
        }
        if let Some(threads) = overrides.threads {
            self.processing.max_processes = Some(threads);
        }
    }
}

/// Transcode settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Widest output in pixels; aspect ratio is preserved.
    pub max_width: u32,
    /// Encoder quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Target encoding for every raster asset.
    pub format: OutputFormat,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            quality: 80,
            format: OutputFormat::Webp,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Values given on the command line. `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub max_width: Option<u32>,
    pub quality: Option<u32>,
    pub format: Option<OutputFormat>,
    pub threads: Option<usize>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(OptimizeConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load and resolve configuration.
///
/// `path` is the config file. When `required` is false a missing file means
/// "use defaults"; when true (the user named it explicitly) it is an error.
/// Command-line `overrides` are applied last, then the result is validated.
pub fn load_config(
    path: &Path,
    required: bool,
    overrides: &ConfigOverrides,
) -> Result<OptimizeConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = if path.exists() {
        let content = fs::read_to_string(path)?;
        let overlay: toml::Value = toml::from_str(&content)?;
        merge_toml(base, overlay)
    } else if required {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    } else {
        base
    };

    let mut config: OptimizeConfig = merged.try_into()?;
    config.apply(overrides);
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `optimize.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# optimize-images configuration
# =============================
# All settings are optional. Values shown below are the defaults.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# Directory scanned (recursively) for images.
source = "public/images"

# Directory the optimized mirror tree is written to.
output = "public/optimized/images"

[images]
# Rasters wider than this are scaled down, preserving aspect ratio.
# Narrower images keep their size (never upscaled).
max_width = 1920

# Encoder quality, 1 (smallest) to 100 (best).
quality = 80

# Output encoding for raster images: "webp" or "avif".
# SVG files are always copied as-is.
format = "webp"

[processing]
# Maximum parallel workers. Omit to use all CPU cores.
# max_processes = 4
"##
}
