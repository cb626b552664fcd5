//! Text summary builder for CLI output.
//!
//! Formats a [`RunSummary`] into human-readable lines for text mode.

use crate::model::RunSummary;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn build_text_summary(summary: &RunSummary) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!("Endpoint: {}", summary.endpoint));
    if let Some(source) = summary.source.as_deref() {
        let media = summary.media_type.as_deref().unwrap_or("-");
        let size = summary
            .source_bytes
            .map(human_bytes)
            .unwrap_or_else(|| "-".into());
        lines.push(format!("Source: {source} ({media}, {size})"));
    }

    match (summary.preview_width, summary.preview_height) {
        (Some(w), Some(h)) => lines.push(format!("Preview: {w}x{h}")),
        _ => {
            if let Some(reason) = summary.preview_error.as_deref() {
                lines.push(format!("Preview: unavailable ({reason})"));
            }
        }
    }

    if let Some(bytes) = summary.result_bytes {
        let media = summary.result_media_type.as_deref().unwrap_or("-");
        lines.push(format!("Result: {} ({media})", human_bytes(bytes)));
    }
    if let Some(path) = summary.saved_path.as_ref() {
        lines.push(format!("Saved: {}", path.display()));
    }

    lines.push(format!("State: {}", summary.state.label()));
    if let Some(err) = summary.error.as_deref() {
        lines.push(format!("Error: {err}"));
    }

    TextSummary { lines }
}

fn human_bytes(n: usize) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
    if n < 1024 {
        return format!("{n} B");
    }
    let mut value = n as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorkflowState;
    use std::path::PathBuf;

    #[test]
    fn successful_run_lists_every_stage() {
        let summary = RunSummary {
            endpoint: "http://localhost:8000/api/colorize".into(),
            source: Some("photo.jpg".into()),
            media_type: Some("image/jpeg".into()),
            source_bytes: Some(2048),
            preview_width: Some(640),
            preview_height: Some(480),
            result_bytes: Some(3 * 1024 * 1024),
            result_media_type: Some("image/png".into()),
            saved_path: Some(PathBuf::from("/tmp/colorized_image.png")),
            state: WorkflowState::Ready,
            ..Default::default()
        };
        let lines = build_text_summary(&summary).lines;
        assert_eq!(
            lines,
            vec![
                "Endpoint: http://localhost:8000/api/colorize",
                "Source: photo.jpg (image/jpeg, 2.0 KiB)",
                "Preview: 640x480",
                "Result: 3.0 MiB (image/png)",
                "Saved: /tmp/colorized_image.png",
                "State: ready",
            ]
        );
    }

    #[test]
    fn failed_run_reports_error_and_missing_preview() {
        let summary = RunSummary {
            endpoint: "http://x".into(),
            source: Some("notes.txt".into()),
            media_type: Some("text/plain".into()),
            source_bytes: Some(12),
            preview_error: Some("unsupported format".into()),
            error: Some("Failed to colorize image. Please try again.".into()),
            ..Default::default()
        };
        let lines = build_text_summary(&summary).lines;
        assert!(lines.contains(&"Source: notes.txt (text/plain, 12 B)".to_string()));
        assert!(lines.contains(&"Preview: unavailable (unsupported format)".to_string()));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("Error: Failed to colorize image. Please try again.")
        );
    }
}
