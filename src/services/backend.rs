// src/services/backend.rs
use std::time::Duration;

use bytes::Bytes;
use log::{info, warn};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tokio::time::sleep;
use uuid::Uuid;

use crate::errors::BreedLensError;
use crate::handlers::IMAGE_FIELD;
use crate::models::{BreedPrediction, PredictionResult, UploadFile};

/// What the proxy sends back for an accepted upload.
pub enum PredictOutcome {
    /// The backend answered successfully; its JSON body is relayed verbatim.
    Relayed(Bytes),
    /// The backend was unreachable; the fixed demo result stands in.
    MockFallback(PredictionResult),
}

/// Single-attempt forwarder to the external classifier backend. Stateless
/// apart from the shared reqwest connection pool.
pub struct BackendClient {
    client: Client,
    base_url: String,
    mock_delay: Duration,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, mock_delay: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mock_delay,
        }
    }

    /// Forwards the uploaded image to `{base_url}/predict` unchanged and maps
    /// the reply:
    ///
    /// - success: relayed as-is
    /// - non-success: propagated with the backend's status and `detail`
    /// - connection failure: demo fallback after the configured delay
    pub async fn predict(
        &self,
        request_id: Uuid,
        image: &UploadFile,
    ) -> Result<PredictOutcome, BreedLensError> {
        let part = Part::stream(reqwest::Body::from(image.bytes.clone()))
            .file_name(image.filename.clone())
            .mime_str(&image.content_type)
            .map_err(|e| BreedLensError::Internal(format!("invalid content type: {e}")))?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let url = format!("{}/predict", self.base_url);
        match self.client.post(&url).multipart(form).send().await {
            Ok(response) if response.status().is_success() => {
                let body = response.bytes().await.map_err(|e| {
                    BreedLensError::Internal(format!("failed to read backend response: {e}"))
                })?;
                info!("[{request_id}] backend returned a prediction");
                Ok(PredictOutcome::Relayed(body))
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let message = response
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|body| {
                        body.get("detail")
                            .and_then(|d| d.as_str())
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| "Failed to analyze image".to_string());
                warn!("[{request_id}] backend rejected the image: {status} {message}");
                Err(BreedLensError::Backend { status, message })
            }
            Err(err) if err.is_connect() => {
                warn!("[{request_id}] backend unreachable, serving demo fallback: {err}");
                sleep(self.mock_delay).await;
                Ok(PredictOutcome::MockFallback(demo_fallback_result()))
            }
            Err(err) => Err(BreedLensError::Internal(format!(
                "forwarding to backend failed: {err}"
            ))),
        }
    }
}

/// Fixed result served when no classifier backend is deployed, so the demo
/// stays usable offline. Demo mode only: not a cache, not a retry.
pub fn demo_fallback_result() -> PredictionResult {
    PredictionResult {
        top_prediction: BreedPrediction {
            breed: "Golden Retriever".to_string(),
            confidence: 0.92,
        },
        alternative_predictions: vec![
            BreedPrediction {
                breed: "Labrador Retriever".to_string(),
                confidence: 0.05,
            },
            BreedPrediction {
                breed: "Nova Scotia Duck Tolling Retriever".to_string(),
                confidence: 0.02,
            },
            BreedPrediction {
                breed: "Flat-Coated Retriever".to_string(),
                confidence: 0.01,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_upload() -> UploadFile {
        UploadFile::new("dog.png", "image/png", vec![0u8; 16])
    }

    #[test]
    fn demo_fallback_is_ranked_and_retriever_heavy() {
        let result = demo_fallback_result();
        assert!(result.is_ranked());
        assert_eq!(result.top_prediction.breed, "Golden Retriever");
        assert_eq!(result.alternative_predictions.len(), 3);
    }

    #[tokio::test]
    async fn connection_refused_serves_the_demo_fallback() {
        // Port 9 (discard) refuses connections on the loopback interface.
        let client = BackendClient::new("http://127.0.0.1:9", Duration::from_millis(10));

        let started = std::time::Instant::now();
        let outcome = client
            .predict(Uuid::new_v4(), &sample_upload())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(10));

        match outcome {
            PredictOutcome::MockFallback(result) => {
                assert_eq!(result, demo_fallback_result());
            }
            PredictOutcome::Relayed(_) => panic!("expected the demo fallback"),
        }
    }

    #[test]
    fn trailing_slash_in_base_url_is_tolerated() {
        let client = BackendClient::new("http://localhost:8000/", Duration::ZERO);
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
