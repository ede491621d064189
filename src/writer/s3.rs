use crate::cert::bundle::CertificateBundle;
use crate::utils::errors::{CertshipError, Result};
use crate::writer::{archive, ResultWriter};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

/// Packages the bundle into a zip archive and uploads it to an S3 bucket
/// under `<domain>/<archive name>` (any leading wildcard label stripped).
pub struct S3Writer {
    bucket: String,
    client: aws_sdk_s3::Client,
}

impl S3Writer {
    pub async fn new(bucket: String) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            bucket,
            client: aws_sdk_s3::Client::new(&config),
        }
    }

    fn object_key(domain: &str, file_name: &str) -> String {
        let domain = domain.strip_prefix("*.").unwrap_or(domain);
        format!("{domain}/{file_name}")
    }
}

#[async_trait]
impl ResultWriter for S3Writer {
    async fn write(&self, bundle: &CertificateBundle) -> Result<()> {
        let staged = archive::stage(bundle)?;

        // Preflight: fail before uploading anything if the bucket is not
        // reachable; the SDK's own error is surfaced unchanged
        self.client.head_bucket().bucket(&self.bucket).send().await?;

        let key = Self::object_key(&bundle.domain, staged.file_name());
        let body = ByteStream::from_path(staged.archive_path())
            .await
            .map_err(|e| CertshipError::Storage(format!("Failed to read archive: {e}")))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .send()
            .await?;

        tracing::info!("Uploaded certificate archive to s3://{}/{key}", self.bucket);
        Ok(())
        // `staged` drops here, removing the temp directory on every path
    }
}
