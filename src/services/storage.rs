use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::config::get_config;
use crate::error::AppError;

/// Opaque blob storage. The rest of the system only stores and hands around
/// string keys; bytes are never inspected here.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
    fn public_url(&self, key: &str) -> String;
}

pub struct S3Store {
    client: Client,
    bucket_name: String,
    public_base: String,
}

impl S3Store {
    pub async fn new() -> Self {
        let config = get_config();

        let credentials = aws_sdk_s3::config::Credentials::new(
            config.aws_access_key_id.clone(),
            config.aws_secret_access_key.clone(),
            None,
            None,
            "manual_config",
        );

        let region = aws_sdk_s3::config::Region::new(config.aws_region.clone());

        let mut s3_config_builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.s3_endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        let client = Client::from_conf(s3_config_builder.build());

        let public_base = if let Some(endpoint) = &config.s3_endpoint {
            format!("{}/{}", endpoint, config.s3_bucket_name)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com",
                config.s3_bucket_name, config.aws_region
            )
        };

        Self {
            client,
            bucket_name: config.s3_bucket_name.clone(),
            public_base,
        }
    }
}

#[async_trait]
impl BlobStore for S3Store {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .acl(aws_sdk_s3::types::ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Storage | put {} failed: {:?}", key, e);
                AppError::InternalServerError(format!("Failed to store blob: {}", e))
            })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Storage | get {} failed: {:?}", key, e);
                AppError::InternalServerError(format!("Failed to fetch blob: {}", e))
            })?;

        let data = resp.body.collect().await.map_err(|e| {
            AppError::InternalServerError(format!("Failed to read blob body: {}", e))
        })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Storage | delete {} failed: {:?}", key, e);
                AppError::InternalServerError(format!("Failed to delete blob: {}", e))
            })?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}
