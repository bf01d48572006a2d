use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum UploadKind {
    Image,
    Attachment,
}

impl UploadKind {
    pub(crate) fn key_segment(self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Attachment => "attachments",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PresignUploadRequest {
    #[validate(length(min = 1, max = 255, message = "filename must be 1-255 characters"))]
    pub(crate) filename: String,
    #[validate(length(min = 1, message = "content_type is required"))]
    pub(crate) content_type: String,
    pub(crate) kind: UploadKind,
}

#[derive(Debug, Serialize)]
pub(crate) struct PresignUploadResponse {
    pub(crate) upload_url: String,
    pub(crate) file_url: String,
    pub(crate) key: String,
    pub(crate) expires_in: u64,
}
