//! Output helpers for the `pixelgate` binary.

use pixelgate_core::{DimensionCheck, FormatDetectionResult, OutputFormat, ValidationResult};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Human-readable byte count ("512 B", "1.50 KB", "2.00 MB").
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let value = bytes as f64;
    if value >= MB {
        format!("{:.2} MB", value / MB)
    } else if value >= KB {
        format!("{:.2} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Default destination for a sanitized copy: `<stem>.sanitized.<ext>` next to the input.
pub fn sanitized_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    input.with_file_name(format!("{}.sanitized.{}", stem, format.extension()))
}

pub fn render_validation(result: &ValidationResult) -> String {
    let summary = result.security_summary();
    let mut out = String::new();

    let verdict = if result.is_valid() { "VALID" } else { "INVALID" };
    let _ = writeln!(out, "{} ({})", verdict, summary.security_level);

    if let Some(metadata) = &result.metadata {
        let _ = writeln!(out, "  name:      {}", truncate_string(&metadata.original_name, 60));
        if metadata.sanitized_name != metadata.original_name {
            let _ = writeln!(out, "  sanitized: {}", metadata.sanitized_name);
        }
        let _ = writeln!(out, "  size:      {}", format_bytes(metadata.size));
        let declared = if metadata.mime_type.is_empty() {
            "-"
        } else {
            metadata.mime_type.as_str()
        };
        let _ = writeln!(
            out,
            "  mime:      {} (detected: {})",
            declared,
            metadata.detected_mime_type.as_deref().unwrap_or("-")
        );
        if let Some(dimensions) = metadata.dimensions {
            let _ = writeln!(
                out,
                "  pixels:    {}x{}",
                dimensions.width, dimensions.height
            );
        }
    }

    if let Some(format) = &result.format {
        let _ = writeln!(
            out,
            "  format:    {} ({} confidence, by {})",
            format.detected_format.as_deref().unwrap_or("unknown"),
            format.confidence,
            format.detection_method
        );
    }

    push_section(&mut out, "errors", result.error_messages());
    push_section(&mut out, "threats", result.threat_messages());
    push_section(&mut out, "warnings", result.warning_messages());
    out
}

pub fn render_classification(result: &FormatDetectionResult) -> String {
    let mut out = String::new();
    match &result.detected_format {
        Some(format) if result.is_valid => {
            let kind = if result.is_raw { "raw" } else { "standard" };
            let _ = writeln!(
                out,
                "{} [{}] ({} confidence, by {})",
                format, kind, result.confidence, result.detection_method
            );
        }
        _ => {
            let _ = writeln!(out, "unsupported");
        }
    }
    push_section(&mut out, "errors", result.errors.clone());
    push_section(&mut out, "warnings", result.warnings.clone());
    out
}

pub fn render_dimension_check(check: &DimensionCheck) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", if check.valid { "OK" } else { "REJECTED" });
    push_section(
        &mut out,
        "errors",
        check.errors.iter().map(|e| e.to_string()).collect(),
    );
    push_section(
        &mut out,
        "warnings",
        check.warnings.iter().map(|w| w.to_string()).collect(),
    );
    out
}

fn push_section(out: &mut String, title: &str, lines: Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {}:", title);
    for line in lines {
        let _ = writeln!(out, "    - {}", line);
    }
}
