use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};

use snapshare_types::UploadImageResponse;

use crate::api::error::{ApiError, ApiResult};
use crate::image_host::data_uri;
use crate::state::AppState;

/// Multipart field carrying the file
const IMAGE_FIELD: &str = "image";

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Image exceeds the upload size limit.".to_string())
    } else {
        ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// POST /upload-image
///
/// Forwards the `image` field to the image host and returns its public URL.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadImageResponse>> {
    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        image = Some((content_type, bytes));
        break;
    }

    let (content_type, bytes) = match image {
        Some((content_type, bytes)) if !bytes.is_empty() => (content_type, bytes),
        _ => return Err(ApiError::BadRequest("No image file provided.".to_string())),
    };

    let mime_type = content_type
        .filter(|mime| mime.starts_with("image/"))
        .ok_or_else(|| ApiError::BadRequest("Uploaded file is not an image.".to_string()))?;

    tracing::debug!("Uploading {} bytes of {}", bytes.len(), mime_type);

    let image_url = state
        .image_host
        .upload(data_uri(&mime_type, &bytes))
        .await
        .map_err(|e| ApiError::UploadFailed(e.to_string()))?;

    Ok(Json(UploadImageResponse { image_url }))
}
