// src/services/predict_api.rs
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use thiserror::Error;

use crate::handlers::IMAGE_FIELD;
use crate::models::{PredictionResult, UploadFile};

/// How a submission can fail, as seen from the widget.
#[derive(Error, Debug, Clone)]
pub enum PredictError {
    /// The endpoint answered with a non-success status. `message` is the
    /// response body's `error` field when one was present.
    #[error("prediction request rejected with status {status}")]
    Api { status: u16, message: Option<String> },

    #[error("network error: {0}")]
    Network(String),
}

/// Seam between the upload widget and the prediction endpoint. Tests swap in
/// a scripted stub; production uses [`HttpPredictApi`].
#[async_trait]
pub trait PredictApi: Send + Sync {
    async fn predict(&self, upload: &UploadFile) -> Result<PredictionResult, PredictError>;
}

/// Submits the selected image to the proxy endpoint as a multipart form.
pub struct HttpPredictApi {
    client: Client,
    endpoint: String,
}

impl HttpPredictApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PredictApi for HttpPredictApi {
    async fn predict(&self, upload: &UploadFile) -> Result<PredictionResult, PredictError> {
        let part = Part::stream(reqwest::Body::from(upload.bytes.clone()))
            .file_name(upload.filename.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| PredictError::Network(format!("invalid content type: {e}")))?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PredictError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| {
                    body.get("error")
                        .and_then(|e| e.as_str())
                        .map(str::to_string)
                });
            return Err(PredictError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<PredictionResult>()
            .await
            .map_err(|e| PredictError::Network(format!("malformed prediction response: {e}")))
    }
}
