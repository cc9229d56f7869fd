// src/handlers.rs
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use bytes::BytesMut;
use futures_util::TryStreamExt;
use log::info;
use uuid::Uuid;

use crate::AppState;
use crate::errors::BreedLensError;
use crate::models::UploadFile;
use crate::services::PredictOutcome;

/// Multipart field name carrying the image, end to end.
pub const IMAGE_FIELD: &str = "image";

/// Accepts one multipart image upload and relays the classifier backend's
/// answer. A missing `image` field is a 400 before any outbound call.
pub async fn predict(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, BreedLensError> {
    let request_id = Uuid::new_v4();
    let mut image: Option<UploadFile> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| BreedLensError::Upload(e.to_string()))?
    {
        if field.name() != IMAGE_FIELD || image.is_some() {
            // Drain and ignore anything that is not the first image field.
            while field
                .try_next()
                .await
                .map_err(|e| BreedLensError::Upload(e.to_string()))?
                .is_some()
            {}
            continue;
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .unwrap_or("upload")
            .to_string();
        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut image_data = BytesMut::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| BreedLensError::Upload(e.to_string()))?
        {
            image_data.extend_from_slice(&chunk);
        }

        image = Some(UploadFile::new(filename, content_type, image_data.freeze()));
    }

    let image = image.ok_or(BreedLensError::MissingImage)?;
    info!(
        "[{request_id}] received {} ({} bytes, {})",
        image.filename,
        image.size(),
        image.content_type
    );

    match data.backend.predict(request_id, &image).await? {
        PredictOutcome::Relayed(body) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .body(body)),
        PredictOutcome::MockFallback(result) => Ok(HttpResponse::Ok().json(result)),
    }
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "breedlens",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    }))
}
