use std::path::Path;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::api::errors::ApiError;
use crate::core::config::StorageSettings;
use crate::schemas::upload::UploadKind;

/// JSON body that has passed its `validator` rules. Every failure is a
/// 400 with a `{message}` body.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ValidatedJson<T>(pub(crate) T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) =
            Json::<T>::from_request(req, state).await.map_err(rejection_to_error)?;

        value.validate().map_err(|errors| ApiError::BadRequest(first_message(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

/// Query string whose rejection renders as a JSON 400 instead of axum's
/// plain-text body.
#[derive(Debug, Clone, Default)]
pub(crate) struct QueryParams<T>(pub(crate) T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::BadRequest("Missing 'Content-Type: application/json' header".to_string())
        }
        JsonRejection::JsonDataError(err) => {
            let detail = err.body_text();
            if let Some(field) = detail.split("missing field `").nth(1).and_then(|s| s.split('`').next())
            {
                ApiError::BadRequest(format!("{field} is required"))
            } else if detail.contains("unknown variant") {
                let tail = detail.split("target type: ").nth(1).unwrap_or(detail.as_str());
                ApiError::BadRequest(format!("Invalid value: {tail}"))
            } else {
                ApiError::BadRequest("Invalid field type in request".to_string())
            }
        }
        _ => ApiError::BadRequest("Invalid request body".to_string()),
    }
}

/// Deterministic pick: errors sorted by field name, first message wins.
fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|err| {
                err.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .unwrap_or_else(|| "Invalid request body".to_string())
}

pub(crate) fn validate_course_id(course_id: &str) -> Result<(), ApiError> {
    Uuid::parse_str(course_id)
        .map(|_| ())
        .map_err(|_| ApiError::BadRequest("Valid course ID is required".to_string()))
}

/// Returns the lowercased extension once the filename and MIME type pass
/// the allow-list for `kind`.
pub(crate) fn validate_upload(
    filename: &str,
    content_type: &str,
    kind: UploadKind,
    storage: &StorageSettings,
) -> Result<String, ApiError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    let allowed = match kind {
        UploadKind::Image => &storage.allowed_image_extensions,
        UploadKind::Attachment => &storage.allowed_attachment_extensions,
    };
    if !allowed.iter().any(|candidate| candidate == &extension) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    let mime = content_type.trim().to_ascii_lowercase();
    if mime_allowed_for_extension(&mime, &extension) {
        Ok(extension)
    } else {
        Err(ApiError::BadRequest(format!(
            "MIME type '{mime}' does not match extension '.{extension}'"
        )))
    }
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "jpg" | "jpeg" => matches!(mime, "image/jpeg" | "image/jpg"),
        "png" => mime == "image/png",
        "webp" => mime == "image/webp",
        "gif" => mime == "image/gif",
        "pdf" => mime == "application/pdf",
        "doc" => mime == "application/msword",
        "docx" => {
            mime == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        "txt" => mime == "text/plain",
        "zip" => matches!(mime, "application/zip" | "application/x-zip-compressed"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> StorageSettings {
        StorageSettings {
            allowed_image_extensions: vec!["png".to_string(), "jpg".to_string()],
            allowed_attachment_extensions: vec!["pdf".to_string()],
            upload_url_expire_minutes: 15,
            public_base_url: String::new(),
        }
    }

    #[test]
    fn accepts_matching_image() {
        let ext = validate_upload("Graph.PNG", "image/png", UploadKind::Image, &storage());
        assert_eq!(ext.expect("ext"), "png");
    }

    #[test]
    fn rejects_extension_outside_kind() {
        assert!(validate_upload("notes.pdf", "application/pdf", UploadKind::Image, &storage())
            .is_err());
        assert!(validate_upload("notes.pdf", "application/pdf", UploadKind::Attachment, &storage())
            .is_ok());
        assert!(validate_upload("noext", "image/png", UploadKind::Image, &storage()).is_err());
    }

    #[test]
    fn rejects_mismatched_mime() {
        let result = validate_upload("a.jpg", "image/png", UploadKind::Image, &storage());
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn course_id_must_be_uuid() {
        assert!(validate_course_id("not-a-uuid").is_err());
        assert!(validate_course_id(&Uuid::new_v4().to_string()).is_ok());
    }
}
