//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit `source` dimensions to a maximum width, preserving aspect ratio.
///
/// Images already at or below `max_width` are returned unchanged: this never
/// upscales. Height is rounded and never drops below 1.
///
/// # Examples
/// ```
/// # use optimize_images::imaging::fit_to_width;
/// assert_eq!(fit_to_width((2000, 1000), 1920), (1920, 960));
/// assert_eq!(fit_to_width((800, 600), 1920), (800, 600));
/// ```
pub fn fit_to_width(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w <= max_width {
        return source;
    }
    let ratio = max_width as f64 / src_w as f64;
    let h = ((src_h as f64 * ratio).round() as u32).max(1);
    (max_width, h)
}
