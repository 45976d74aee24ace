//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! built    hero.png → hero.webp
//! copied   logo.svg → logo.svg
//! current  blog/cover.jpg → blog/cover.webp
//! ignored  notes.txt
//! Failed for public/images/broken.png: transcode failed: ...   (stderr)
//! Done: built=1 copied=1 skipped=3
//! ```
//!
//! ## Check
//!
//! ```text
//! transcode  hero.png → hero.webp  2000x1000 → 1920x960  (stale)
//! copy       logo.svg → logo.svg  (up to date)
//! skip       notes.txt
//!
//! 3 assets: 1 transcode, 1 copy, 1 skip
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` (or `String`) and is pure.
//! The `print_*` wrappers decide between stdout and stderr.

use crate::classify::ClassificationPolicy;
use crate::process::{Outcome, PlannedAsset, ProcessEvent, RunSummary};
use std::path::Path;

/// Width of the action column so paths line up.
const LABEL_WIDTH: usize = 8;

fn label(action: &str) -> String {
    format!("{:<width$} ", action, width = LABEL_WIDTH)
}

/// Render a relative path with `/` separators on every platform.
fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Format the line shown when the source directory does not exist.
pub fn format_source_missing(source_root: &Path) -> String {
    format!(
        "No images directory found at {}. Skipping.",
        source_root.display()
    )
}

// ============================================================================
// Run output
// ============================================================================

/// Whether an event belongs on stderr.
pub fn is_warning(event: &ProcessEvent) -> bool {
    matches!(event, ProcessEvent::AssetFailed { .. })
}

/// Whether an event is per-asset detail that `--quiet` hides.
pub fn is_detail(event: &ProcessEvent) -> bool {
    matches!(
        event,
        ProcessEvent::AssetIgnored { .. } | ProcessEvent::AssetProcessed { .. }
    )
}

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::SourceMissing { source_root } => vec![format_source_missing(source_root)],
        ProcessEvent::AssetIgnored { relative_path } => {
            vec![format!("{}{}", label("ignored"), display_path(relative_path))]
        }
        ProcessEvent::AssetProcessed {
            relative_path,
            output_relative,
            outcome,
        } => {
            let action = match outcome {
                Outcome::Built => "built",
                Outcome::Copied => "copied",
                Outcome::Skipped => "current",
            };
            vec![format!(
                "{}{} \u{2192} {}",
                label(action),
                display_path(relative_path),
                display_path(output_relative)
            )]
        }
        ProcessEvent::AssetFailed { source_path, error } => {
            vec![format!("Failed for {}: {}", source_path.display(), error)]
        }
    }
}

/// Print an event, honoring `quiet` for per-asset detail.
pub fn print_process_event(event: &ProcessEvent, quiet: bool) {
    if quiet && is_detail(event) {
        return;
    }
    for line in format_process_event(event) {
        if is_warning(event) {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

/// Format the final one-line summary.
pub fn format_summary(summary: &RunSummary) -> String {
    format!("Done: {}", summary)
}

// ============================================================================
// Check output
// ============================================================================

fn policy_name(policy: ClassificationPolicy) -> &'static str {
    match policy {
        ClassificationPolicy::Transcode => "transcode",
        ClassificationPolicy::Copy => "copy",
        ClassificationPolicy::Skip => "skip",
    }
}

/// Format a dry-run plan: one line per asset plus a totals footer.
pub fn format_plan(planned: &[PlannedAsset]) -> Vec<String> {
    let mut lines = Vec::new();
    let (mut transcode, mut copy, mut skip) = (0, 0, 0);

    for asset in planned {
        let name = format!("{:<10} ", policy_name(asset.policy));
        match asset.policy {
            ClassificationPolicy::Transcode => transcode += 1,
            ClassificationPolicy::Copy => copy += 1,
            ClassificationPolicy::Skip => skip += 1,
        }

        let Some(output) = &asset.output_relative else {
            lines.push(format!("{}{}", name, display_path(&asset.relative_path)));
            continue;
        };

        let mut line = format!(
            "{}{} \u{2192} {}",
            name,
            display_path(&asset.relative_path),
            display_path(output)
        );
        if let Some((src, fitted)) = asset.resize {
            line.push_str(&format!(
                "  {}x{} \u{2192} {}x{}",
                src.width, src.height, fitted.width, fitted.height
            ));
        }
        line.push_str(if asset.stale {
            "  (stale)"
        } else {
            "  (up to date)"
        });
        lines.push(line);
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "{} assets: {} transcode, {} copy, {} skip",
        planned.len(),
        transcode,
        copy,
        skip
    ));
    lines
}

/// Print a dry-run plan to stdout.
pub fn print_plan(planned: &[PlannedAsset]) {
    for line in format_plan(planned) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use std::path::PathBuf;

    #[test]
    fn label_pads_to_column() {
        assert_eq!(label("built"), "built    ");
        assert_eq!(label("current"), "current  ");
    }

    #[test]
    fn source_missing_line() {
        assert_eq!(
            format_source_missing(Path::new("public/images")),
            "No images directory found at public/images. Skipping."
        );
    }

    #[test]
    fn format_built_event() {
        let event = ProcessEvent::AssetProcessed {
            relative_path: PathBuf::from("blog/hero.png"),
            output_relative: PathBuf::from("blog/hero.webp"),
            outcome: Outcome::Built,
        };
        assert_eq!(
            format_process_event(&event),
            vec!["built    blog/hero.png \u{2192} blog/hero.webp"]
        );
        assert!(!is_warning(&event));
        assert!(is_detail(&event));
    }

    #[test]
    fn format_up_to_date_event() {
        let event = ProcessEvent::AssetProcessed {
            relative_path: PathBuf::from("logo.svg"),
            output_relative: PathBuf::from("logo.svg"),
            outcome: Outcome::Skipped,
        };
        assert_eq!(
            format_process_event(&event),
            vec!["current  logo.svg \u{2192} logo.svg"]
        );
    }

    #[test]
    fn format_ignored_event() {
        let event = ProcessEvent::AssetIgnored {
            relative_path: PathBuf::from("notes.txt"),
        };
        assert_eq!(format_process_event(&event), vec!["ignored  notes.txt"]);
    }

    #[test]
    fn format_failed_event_is_warning() {
        let event = ProcessEvent::AssetFailed {
            source_path: PathBuf::from("public/images/bad.png"),
            error: "transcode failed: Processing failed: corrupt".to_string(),
        };
        assert_eq!(
            format_process_event(&event),
            vec!["Failed for public/images/bad.png: transcode failed: Processing failed: corrupt"]
        );
        assert!(is_warning(&event));
        assert!(!is_detail(&event));
    }

    #[test]
    fn source_missing_is_not_hidden_by_quiet() {
        let event = ProcessEvent::SourceMissing {
            source_root: PathBuf::from("x"),
        };
        assert!(!is_detail(&event));
        assert!(!is_warning(&event));
    }

    #[test]
    fn summary_line() {
        let summary = RunSummary {
            built: 1,
            copied: 1,
            skipped: 1,
        };
        assert_eq!(format_summary(&summary), "Done: built=1 copied=1 skipped=1");
    }

    #[test]
    fn plan_lines_and_totals() {
        let planned = vec![
            PlannedAsset {
                relative_path: PathBuf::from("hero.png"),
                policy: ClassificationPolicy::Transcode,
                output_relative: Some(PathBuf::from("hero.webp")),
                stale: true,
                resize: Some((
                    Dimensions {
                        width: 2000,
                        height: 1000,
                    },
                    Dimensions {
                        width: 1920,
                        height: 960,
                    },
                )),
            },
            PlannedAsset {
                relative_path: PathBuf::from("logo.svg"),
                policy: ClassificationPolicy::Copy,
                output_relative: Some(PathBuf::from("logo.svg")),
                stale: false,
                resize: None,
            },
            PlannedAsset {
                relative_path: PathBuf::from("notes.txt"),
                policy: ClassificationPolicy::Skip,
                output_relative: None,
                stale: false,
                resize: None,
            },
        ];
        let lines = format_plan(&planned);
        assert_eq!(
            lines[0],
            "transcode  hero.png \u{2192} hero.webp  2000x1000 \u{2192} 1920x960  (stale)"
        );
        assert_eq!(lines[1], "copy       logo.svg \u{2192} logo.svg  (up to date)");
        assert_eq!(lines[2], "skip       notes.txt");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "3 assets: 1 transcode, 1 copy, 1 skip");
    }

    #[test]
    fn empty_plan_has_only_totals() {
        assert_eq!(
            format_plan(&[]),
            vec!["0 assets: 0 transcode, 0 copy, 0 skip"]
        );
    }
}
