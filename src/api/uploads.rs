use std::time::Duration;

use axum::extract::State;
use axum::{routing::post, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::{validate_upload, ValidatedJson};
use crate::core::state::AppState;
use crate::schemas::upload::{PresignUploadRequest, PresignUploadResponse};
use crate::services::storage;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/presign", post(presign_upload))
}

async fn presign_upload(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<PresignUploadRequest>,
) -> Result<Json<PresignUploadResponse>, ApiError> {
    let Some(storage_service) = state.storage() else {
        return Err(ApiError::ServiceUnavailable("File storage is not configured".to_string()));
    };

    let settings = state.settings().storage();
    let extension =
        validate_upload(&payload.filename, &payload.content_type, payload.kind, settings)?;

    let key = storage::object_key(payload.kind, &user.id, &extension);
    let expires_in = settings.upload_url_expire_minutes * 60;
    let upload_url = storage_service
        .presign_put(&key, payload.content_type.trim(), Duration::from_secs(expires_in))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to sign upload URL"))?;

    tracing::debug!(user_id = %user.id, key = %key, "Upload URL signed");

    Ok(Json(PresignUploadResponse {
        upload_url,
        file_url: storage_service.public_url(&key),
        key,
        expires_in,
    }))
}
