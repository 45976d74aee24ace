//! Image processing — pure Rust apart from libwebp for lossy WebP.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions`, `avif-parse` |
//! | **Fit to width** | [`fit_to_width`] (pure) |
//! | **Transcode → WebP** | Lanczos3 + `webp` encoder |
//! | **Transcode → AVIF** | Lanczos3 + rav1e encoder |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::fit_to_width;
pub use params::{Quality, TranscodeParams};
pub use rust_backend::RustBackend;
