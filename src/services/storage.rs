use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use std::time::Duration;
use uuid::Uuid;

use crate::core::config::Settings;
use crate::schemas::upload::UploadKind;

/// Client for the S3-compatible asset host. Objects are written by clients
/// through presigned URLs; the service itself never streams file bodies.
#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl StorageService {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        let s3 = settings.s3();
        if !s3.is_configured() {
            tracing::info!("Asset storage not configured; upload signing disabled");
            return Ok(None);
        }

        let creds = Credentials::new(
            s3.access_key.clone(),
            s3.secret_key.clone(),
            None,
            None,
            "question-bank-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(s3.endpoint.clone())
            .region(aws_config::Region::new(s3.region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let client = Client::new(&config);

        let public_base_url = settings.storage().public_base_url.trim_end_matches('/').to_string();

        Ok(Some(Self { client, bucket: s3.bucket.clone(), public_base_url }))
    }

    pub(crate) async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    pub(crate) fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

/// `questions/<kind>s/<user id>/<uuid>.<ext>`
pub(crate) fn object_key(kind: UploadKind, user_id: &str, extension: &str) -> String {
    format!("questions/{}/{}/{}.{}", kind.key_segment(), user_id, Uuid::new_v4(), extension)
}
