// src/format.rs
use std::fmt::Write;

use crate::models::PredictionResult;

/// Formats a byte count with the unit a person would pick: B, KB, or MB.
pub fn format_file_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Renders a 0.0–1.0 confidence as a percentage with one decimal.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Plain-text rendition of the result card: top match first, then the
/// alternatives in significance order.
pub fn render_result(result: &PredictionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Top Match: {} ({})",
        result.top_prediction.breed,
        format_confidence(result.top_prediction.confidence)
    );

    if !result.alternative_predictions.is_empty() {
        let _ = writeln!(out, "Alternative Matches:");
        for prediction in &result.alternative_predictions {
            let _ = writeln!(
                out,
                "  {} ({})",
                prediction.breed,
                format_confidence(prediction.confidence)
            );
        }
    }

    out
}
