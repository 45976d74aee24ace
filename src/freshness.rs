//! Staleness check for generated outputs.
//!
//! The only build state is the filesystem itself: an output is considered
//! current when it exists, is non-empty, and is at least as new as its source.
//! There is no content hashing, so touching a source forces one rebuild.

use std::fs;
use std::path::Path;

/// Whether `output` must be (re)generated from `source`.
///
/// True when the output is missing, is zero bytes, or the source's mtime is
/// strictly newer than the output's. Any failure to stat either file counts
/// as stale; this never errors.
pub fn needs_build(source: &Path, output: &Path) -> bool {
    let (Ok(src), Ok(out)) = (fs::metadata(source), fs::metadata(output)) else {
        return true;
    };
    if out.len() == 0 {
        return true;
    }
    match (src.modified(), out.modified()) {
        (Ok(src_time), Ok(out_time)) => src_time > out_time,
        _ => true,
    }
}
