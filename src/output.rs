//! CLI output formatting.
//!
//! Every function here is pure: it turns a result into display lines and
//! leaves printing to the thin `print_*` wrappers. Tests assert on the
//! lines directly.
//!
//! # Output Format
//!
//! ## Pad
//!
//! ```text
//! [1/3] IMG_0001.jpg → IMG_0001_padded.jpg
//!     4000x3000 → 4500x3000 → 4950x3300
//!     Metadata: ICC, EXIF, 300 dpi
//! [2/3] IMG_0002.jpg: skipped (IMG_0002_padded.jpg exists)
//! [3/3] broken.png: FAILED Cannot read broken.png: ...
//!
//! Done! Processed 1 image, skipped 1, failed 1.
//! ```
//!
//! ## Check
//!
//! ```text
//! IMG_0001.jpg  4000x3000 → 4500x3000 → 4950x3300
//! IMG_0002.jpg  3000x2000 (unchanged)
//! ```

use crate::process::{BatchSummary, PadEvent, SizePlan};
use std::path::Path;

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Size chain for a job: `source → padded → final`, collapsing stages that
/// changed nothing.
pub fn format_sizes(plan: &SizePlan) -> String {
    let SizePlan {
        source_size,
        padded_size,
        final_size,
    } = plan;
    if source_size == final_size {
        return format!("{source_size} (unchanged)");
    }
    let mut chain = vec![source_size.to_string()];
    if padded_size != source_size {
        chain.push(padded_size.to_string());
    }
    if final_size != padded_size {
        chain.push(final_size.to_string());
    }
    chain.join(" \u{2192} ")
}

/// Format a single batch progress event as display lines.
pub fn format_pad_event(event: &PadEvent) -> Vec<String> {
    match event {
        PadEvent::Padded {
            index,
            total,
            input,
            output,
            report,
        } => {
            let plan = SizePlan {
                source_size: report.source_size,
                padded_size: report.padded_size,
                final_size: report.final_size,
            };
            let mut lines = vec![
                format!(
                    "[{index}/{total}] {} \u{2192} {}",
                    file_name(input),
                    file_name(output)
                ),
                format!("    {}", format_sizes(&plan)),
                format!("    Metadata: {}", report.metadata.describe()),
            ];
            if let Some(color) = report.coerced_from {
                lines.push(format!("    Converted from {color:?} to RGB8"));
            }
            lines
        }
        PadEvent::Skipped {
            index,
            total,
            input,
            output,
        } => vec![format!(
            "[{index}/{total}] {}: skipped ({} exists)",
            file_name(input),
            file_name(output)
        )],
        PadEvent::Failed {
            index,
            total,
            input,
            error,
        } => vec![format!(
            "[{index}/{total}] {}: FAILED {error}",
            file_name(input)
        )],
        PadEvent::Aborted { remaining } => {
            vec![format!("Aborted, {} not processed.", plural(*remaining, "image"))]
        }
    }
}

/// Print a batch progress event to stdout.
pub fn print_pad_event(event: &PadEvent) {
    for line in format_pad_event(event) {
        println!("{}", line);
    }
}

/// Format the closing summary of a batch.
pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    let mut lines = vec![String::new()];
    let mut head = format!("Processed {}", plural(summary.processed, "image"));
    if summary.skipped > 0 {
        head.push_str(&format!(", skipped {}", summary.skipped));
    }
    if !summary.failed.is_empty() {
        head.push_str(&format!(", failed {}", summary.failed.len()));
    }
    if summary.aborted {
        lines.push(format!("Stopped. {head}."));
    } else {
        lines.push(format!("Done! {head}."));
    }
    for (input, error) in &summary.failed {
        lines.push(format!("    {}: {error}", file_name(input)));
    }
    lines
}

/// Print the batch summary to stdout.
pub fn print_summary(summary: &BatchSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

/// Format one line of `check` output.
pub fn format_plan_line(input: &Path, plan: &Result<SizePlan, String>, name_width: usize) -> String {
    let name = file_name(input);
    match plan {
        Ok(plan) => format!("{name:<name_width$}  {}", format_sizes(plan)),
        Err(e) => format!("{name:<name_width$}  error: {e}"),
    }
}

/// Format the full `check` report with aligned names.
pub fn format_check_output(plans: &[(&Path, Result<SizePlan, String>)]) -> Vec<String> {
    if plans.is_empty() {
        return vec!["No supported images found.".to_string()];
    }
    let width = plans
        .iter()
        .map(|(p, _)| file_name(p).chars().count())
        .max()
        .unwrap_or(0);
    plans
        .iter()
        .map(|(input, plan)| format_plan_line(input, plan, width))
        .collect()
}

/// Print the `check` report to stdout.
pub fn print_check_output(plans: &[(&Path, Result<SizePlan, String>)]) {
    for line in format_check_output(plans) {
        println!("{}", line);
    }
}
