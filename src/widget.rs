// src/widget.rs
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use log::{info, warn};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::models::{RequestState, UploadFile};
use crate::services::{PredictApi, PredictError};

pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

const GENERIC_FAILURE_MESSAGE: &str = "Failed to analyze the image. Please try again.";

/// The widget's stand-in for a browser object URL: the selected image
/// written to a named temporary file. The file is removed when the handle
/// drops, which covers replacement, reset, and widget teardown.
pub struct Preview {
    file: NamedTempFile,
    content_type: String,
}

impl Preview {
    fn create(upload: &UploadFile) -> std::io::Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&upload.bytes)?;
        file.flush()?;
        Ok(Self {
            file,
            content_type: upload.content_type.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Renders the preview as a `data:` URL, the form the demo UI embeds.
    pub fn data_url(&self) -> std::io::Result<String> {
        let bytes = std::fs::read(self.file.path())?;
        Ok(format!(
            "data:{};base64,{}",
            self.content_type,
            general_purpose::STANDARD.encode(bytes)
        ))
    }
}

/// Manages one file selection and at most one in-flight prediction request.
///
/// Validation failures raise a transient message and leave everything else
/// untouched; they never transition `RequestState`.
pub struct UploadWidget {
    id: Uuid,
    api: Arc<dyn PredictApi>,
    max_upload_bytes: usize,
    file: Option<UploadFile>,
    preview: Option<Preview>,
    state: RequestState,
    validation_error: Option<String>,
}

impl UploadWidget {
    pub fn new(api: Arc<dyn PredictApi>) -> Self {
        Self::with_max_upload(api, crate::config::DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn with_max_upload(api: Arc<dyn PredictApi>, max_upload_bytes: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            api,
            max_upload_bytes,
            file: None,
            preview: None,
            state: RequestState::Idle,
            validation_error: None,
        }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn selected_file(&self) -> Option<&UploadFile> {
        self.file.as_ref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Accepts a candidate file. Wrong MIME type or an oversized payload
    /// raises a validation message without touching the current selection.
    /// A valid file replaces the previous one, releases its preview, and
    /// clears any earlier result or error.
    pub fn select_file(&mut self, candidate: UploadFile) {
        if !is_allowed_type(&candidate.content_type) {
            warn!(
                "widget {}: rejected {} with type {}",
                self.id, candidate.filename, candidate.content_type
            );
            self.validation_error =
                Some("Please upload a valid image (JPEG, JPG, or PNG)".to_string());
            return;
        }

        if candidate.size() > self.max_upload_bytes {
            self.validation_error = Some(format!(
                "File size exceeds {}MB",
                self.max_upload_bytes / (1024 * 1024)
            ));
            return;
        }

        // Build the new preview before letting go of the old one, so a
        // failed write cannot leave the widget previewless.
        let preview = match Preview::create(&candidate) {
            Ok(preview) => preview,
            Err(err) => {
                warn!("widget {}: preview creation failed: {err}", self.id);
                self.validation_error = Some("Could not read the selected file".to_string());
                return;
            }
        };

        info!(
            "widget {}: selected {} ({} bytes)",
            self.id,
            candidate.filename,
            candidate.size()
        );
        self.preview = Some(preview);
        self.file = Some(candidate);
        self.validation_error = None;
        self.state = RequestState::Ready;
    }

    /// Returns to `Idle`, releasing the preview and dropping any result or
    /// error. Safe from any state.
    pub fn reset(&mut self) {
        self.preview = None;
        self.file = None;
        self.validation_error = None;
        self.state = RequestState::Idle;
    }

    /// Submits the current file for prediction. No-op without a file or
    /// while a request is already in flight; otherwise ends in exactly one
    /// of `Succeeded` or `Failed`.
    pub async fn submit(&mut self) {
        if matches!(self.state, RequestState::Submitting) {
            return;
        }
        let Some(file) = self.file.clone() else {
            return;
        };

        self.state = RequestState::Submitting;
        info!("widget {}: submitting {}", self.id, file.filename);

        self.state = match self.api.predict(&file).await {
            Ok(result) => RequestState::Succeeded(result),
            Err(PredictError::Api { status, message }) => {
                warn!("widget {}: prediction rejected with status {status}", self.id);
                RequestState::Failed(message.unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()))
            }
            Err(PredictError::Network(err)) => {
                warn!("widget {}: prediction request failed: {err}", self.id);
                RequestState::Failed(GENERIC_FAILURE_MESSAGE.to_string())
            }
        };
    }
}

fn is_allowed_type(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BreedPrediction, PredictionResult};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubApi {
        calls: AtomicUsize,
        reply: Result<PredictionResult, PredictError>,
    }

    impl StubApi {
        fn succeeding(result: PredictionResult) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: Ok(result),
            })
        }

        fn failing(error: PredictError) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: Err(error),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PredictApi for StubApi {
        async fn predict(&self, _upload: &UploadFile) -> Result<PredictionResult, PredictError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn sample_result() -> PredictionResult {
        PredictionResult {
            top_prediction: BreedPrediction {
                breed: "Golden Retriever".to_string(),
                confidence: 0.92,
            },
            alternative_predictions: vec![BreedPrediction {
                breed: "Labrador Retriever".to_string(),
                confidence: 0.05,
            }],
        }
    }

    fn png_upload(len: usize) -> UploadFile {
        UploadFile::new("dog.png", "image/png", vec![7u8; len])
    }

    fn widget_with(api: Arc<StubApi>) -> UploadWidget {
        UploadWidget::with_max_upload(api, 1024)
    }

    #[test]
    fn rejects_unsupported_mime_without_state_change() {
        let mut widget = widget_with(StubApi::succeeding(sample_result()));
        widget.select_file(UploadFile::new("dog.gif", "image/gif", vec![1, 2]));

        assert_eq!(
            widget.validation_error(),
            Some("Please upload a valid image (JPEG, JPG, or PNG)")
        );
        assert_eq!(widget.state(), &RequestState::Idle);
        assert!(widget.selected_file().is_none());
        assert!(widget.preview().is_none());
    }

    #[test]
    fn rejects_oversized_file_with_size_message() {
        let api = StubApi::succeeding(sample_result());
        let mut widget = UploadWidget::with_max_upload(api, 2 * 1024 * 1024);
        widget.select_file(png_upload(2 * 1024 * 1024 + 1));

        assert_eq!(widget.validation_error(), Some("File size exceeds 2MB"));
        assert_eq!(widget.state(), &RequestState::Idle);
    }

    #[test]
    fn invalid_selection_keeps_the_previous_file() {
        let mut widget = widget_with(StubApi::succeeding(sample_result()));
        widget.select_file(png_upload(10));
        let kept = widget.preview().unwrap().path().to_path_buf();

        widget.select_file(UploadFile::new("dog.gif", "image/gif", vec![1]));

        assert_eq!(widget.state(), &RequestState::Ready);
        assert_eq!(widget.selected_file().unwrap().filename, "dog.png");
        assert_eq!(widget.preview().unwrap().path(), kept);
        assert!(kept.exists());
    }

    #[test]
    fn valid_selection_reaches_ready_with_a_live_preview() {
        let mut widget = widget_with(StubApi::succeeding(sample_result()));
        widget.select_file(png_upload(10));

        assert_eq!(widget.state(), &RequestState::Ready);
        assert!(widget.validation_error().is_none());
        let preview = widget.preview().unwrap();
        assert!(preview.path().exists());
        assert!(
            preview
                .data_url()
                .unwrap()
                .starts_with("data:image/png;base64,")
        );
    }

    #[test]
    fn reselecting_releases_exactly_the_previous_preview() {
        let mut widget = widget_with(StubApi::succeeding(sample_result()));
        widget.select_file(png_upload(10));
        let first = widget.preview().unwrap().path().to_path_buf();

        widget.select_file(UploadFile::new("other.jpg", "image/jpeg", vec![9u8; 20]));
        let second = widget.preview().unwrap().path().to_path_buf();

        assert_ne!(first, second);
        assert!(!first.exists());
        assert!(second.exists());
    }

    #[test]
    fn reset_returns_to_idle_and_releases_the_preview() {
        let mut widget = widget_with(StubApi::succeeding(sample_result()));
        widget.select_file(png_upload(10));
        let preview_path = widget.preview().unwrap().path().to_path_buf();

        widget.reset();

        assert_eq!(widget.state(), &RequestState::Idle);
        assert!(widget.selected_file().is_none());
        assert!(!preview_path.exists());
    }

    #[test]
    fn dropping_the_widget_releases_the_preview() {
        let path: PathBuf;
        {
            let mut widget = widget_with(StubApi::succeeding(sample_result()));
            widget.select_file(png_upload(10));
            path = widget.preview().unwrap().path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn submit_without_a_file_dispatches_nothing() {
        let api = StubApi::succeeding(sample_result());
        let mut widget = widget_with(api.clone());

        widget.submit().await;

        assert_eq!(api.calls(), 0);
        assert_eq!(widget.state(), &RequestState::Idle);
    }

    #[tokio::test]
    async fn successful_submission_ends_in_succeeded() {
        let api = StubApi::succeeding(sample_result());
        let mut widget = widget_with(api.clone());
        widget.select_file(png_upload(10));

        widget.submit().await;

        assert_eq!(api.calls(), 1);
        assert_eq!(widget.state(), &RequestState::Succeeded(sample_result()));
    }

    #[tokio::test]
    async fn api_rejection_surfaces_the_error_field() {
        let api = StubApi::failing(PredictError::Api {
            status: 502,
            message: Some("model not loaded".to_string()),
        });
        let mut widget = widget_with(api);
        widget.select_file(png_upload(10));

        widget.submit().await;

        assert_eq!(
            widget.state(),
            &RequestState::Failed("model not loaded".to_string())
        );
    }

    #[tokio::test]
    async fn network_failure_surfaces_the_generic_message() {
        let api = StubApi::failing(PredictError::Network("connection reset".to_string()));
        let mut widget = widget_with(api);
        widget.select_file(png_upload(10));

        widget.submit().await;

        assert_eq!(
            widget.state(),
            &RequestState::Failed(GENERIC_FAILURE_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn reselecting_after_success_clears_the_result() {
        let api = StubApi::succeeding(sample_result());
        let mut widget = widget_with(api);
        widget.select_file(png_upload(10));
        widget.submit().await;
        assert!(matches!(widget.state(), RequestState::Succeeded(_)));

        widget.select_file(png_upload(12));
        assert_eq!(widget.state(), &RequestState::Ready);
    }
}
