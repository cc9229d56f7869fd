// src/models.rs
use std::io;
use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One candidate breed match from the classifier backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedPrediction {
    pub breed: String,
    pub confidence: f64,
}

/// The classifier's answer for a single image: the best match plus the
/// runners-up in significance order, most likely first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub top_prediction: BreedPrediction,
    #[serde(default)]
    pub alternative_predictions: Vec<BreedPrediction>,
}

impl PredictionResult {
    /// The top match must score at least as high as every alternative.
    pub fn is_ranked(&self) -> bool {
        self.alternative_predictions
            .iter()
            .all(|p| p.confidence <= self.top_prediction.confidence)
    }
}

/// An image the user selected, held in memory until it is replaced or the
/// widget resets. `Bytes` keeps clones cheap while the same payload moves
/// through preview generation and multipart submission.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
    pub selected_at: DateTime<Utc>,
}

impl UploadFile {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
            selected_at: Utc::now(),
        }
    }

    /// Reads a file from disk, guessing the MIME type from the extension.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        let content_type = guess_content_type(path);
        Ok(Self::new(filename, content_type, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

fn guess_content_type(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Lifecycle of one widget instance. The result or error rides in the
/// variant so states like "succeeded without a result" cannot exist.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState {
    Idle,
    Ready,
    Submitting,
    Succeeded(PredictionResult),
    Failed(String),
}
