use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::models::{DetectionRequest, DetectionResponse, FailureKind};
use crate::services::catalog::{self, SpeciesListing};
use crate::services::image::{encode_data_url, DEFAULT_IMAGE_MIME};
use crate::AppState;

fn status_for(response: &DetectionResponse) -> StatusCode {
    match response.failure {
        None => StatusCode::OK,
        Some(FailureKind::Rejected) => StatusCode::BAD_REQUEST,
        Some(FailureKind::Upstream) => StatusCode::BAD_GATEWAY,
    }
}

/// Identify the snake in a referenced image.
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<DetectionRequest>,
) -> (StatusCode, Json<DetectionResponse>) {
    if let Err(e) = request.validate() {
        tracing::warn!(error = %e, "Rejected detection request");
        let response = DetectionResponse::failed(
            format!("Invalid detection request: {}", e),
            FailureKind::Rejected,
            0.0,
        );
        return (StatusCode::BAD_REQUEST, Json(response));
    }

    let response = state.detector.detect(&request).await;
    (status_for(&response), Json(response))
}

/// Identify the snake in an uploaded image file.
///
/// Fields: `image` (file), `userId`, `sessionId`, optional `location`.
pub async fn upload_and_detect(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DetectionResponse>), AppError> {
    let mut image: Option<(String, Vec<u8>)> = None;
    let mut user_id = None;
    let mut session_id = None;
    let mut location = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let mime_type = field
                    .content_type()
                    .filter(|ct| !ct.is_empty())
                    .unwrap_or(DEFAULT_IMAGE_MIME)
                    .to_string();
                let filename = field.file_name().unwrap_or("-").to_string();
                let data = field.bytes().await?;

                tracing::info!(filename = %filename, size = data.len(), "Received image upload");
                image = Some((mime_type, data.to_vec()));
            }
            "userId" => user_id = Some(field.text().await?),
            "sessionId" => session_id = Some(field.text().await?),
            "location" => location = Some(field.text().await?),
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    let (mime_type, data) = image
        .filter(|(_, data)| !data.is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing image file")))?;
    let user_id =
        user_id.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing userId field")))?;
    let session_id = session_id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing sessionId field")))?;

    tracing::info!(
        user_id = %user_id,
        session_id = %session_id,
        location = location.as_deref().unwrap_or("-"),
        "Snake detection upload request received"
    );

    let request = DetectionRequest {
        image_url: encode_data_url(&mime_type, &data),
        confidence_threshold: state.config.detection.confidence_threshold,
        user_id: Some(user_id),
        session_id: Some(session_id),
    };

    let response = state.detector.detect(&request).await;
    Ok((status_for(&response), Json(response)))
}

pub async fn species() -> Json<SpeciesListing> {
    Json(catalog::species_listing())
}
