//! # optimize-images
//!
//! A build-time image optimizer for static sites. Point it at a source tree
//! and it writes a mirror tree next to it:
//!
//! ```text
//! public/images/   ──►   public/optimized/images/
//!   *.jpg *.png …          resized to ≤ 1920px wide, re-encoded as WebP (q80)
//!   *.svg                  copied byte-for-byte
//!   anything else          ignored
//! ```
//!
//! Outputs that are non-empty and at least as new as their source are left
//! alone, so repeated runs only touch what changed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the source root into a flat list of files; describes each as an [`scan::Asset`] |
//! | [`classify`] | Extension → transcode / copy / skip table |
//! | [`freshness`] | mtime/size staleness check |
//! | [`imaging`] | Decode, fit to width, encode — behind the [`imaging::ImageBackend`] trait |
//! | [`process`] | Transcoder, copier, parallel pipeline driver and dry-run planner |
//! | [`config`] | `optimize.toml` loading, CLI overrides, validation |
//! | [`types`] | Shared enums ([`types::OutputFormat`]) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## No Build Cache
//!
//! The filesystem is the only state. Each run re-derives every output path
//! and re-checks staleness from mtimes and sizes. A touched source rebuilds
//! once; a failed asset is simply stale again next run.
//!
//! ## One Bad File Never Stops the Run
//!
//! Per-asset failures are reported and counted as skipped. Only failing to
//! enumerate an existing source root aborts a run.
//!
//! ## Explicit Configuration
//!
//! Roots, width, quality and format are passed into the pipeline as an
//! [`config::OptimizeConfig`] value rather than read from globals, so tests
//! run against temporary directories.

pub mod classify;
pub mod config;
pub mod freshness;
pub mod imaging;
pub mod output;
pub mod process;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
