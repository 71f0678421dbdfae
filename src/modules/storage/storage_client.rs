//! S3-compatible storage client for film images.
//!
//! One public bucket; uploads get a collision-resistant key and resolve to a
//! direct public URL. Uses rust-s3 for lightweight S3 operations.

use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};

pub struct StorageClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
}

impl StorageClient {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create storage credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create storage bucket: {}", e)))?;

        // Path-style URLs (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        Ok(Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            public_endpoint: config.public_endpoint,
        })
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<()> {
        let bucket_config = BucketConfiguration::default();

        match Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            bucket_config,
        )
        .await
        {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                // Bucket already exists - this is fine
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                    Ok(())
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                    Ok(())
                }
            }
        }
    }

    /// Collision-resistant object key preserving the original extension.
    pub fn object_key(original_filename: &str) -> String {
        let id = Uuid::new_v4();
        match original_filename.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => format!("{}.{}", id, ext.to_lowercase()),
            _ => id.to_string(),
        }
    }

    /// Upload a file and return its object key.
    pub async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        self.bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to upload file '{}': {}", key, e)))?;

        debug!("Uploaded file '{}' to bucket '{}'", key, self.bucket.name());
        Ok(key.to_string())
    }

    /// Delete a file by object key.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete file '{}': {}", key, e)))?;

        debug!(
            "Deleted file '{}' from bucket '{}'",
            key,
            self.bucket.name()
        );
        Ok(())
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    /// Direct public URL for an object key.
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }

    /// Recover the object key from a previously issued URL.
    ///
    /// Returns None when the URL does not belong to this client's endpoints
    /// and bucket.
    pub fn extract_key_from_url(&self, url: &str) -> Option<String> {
        let public_prefix = format!("{}/{}/", self.public_endpoint, self.bucket.name());
        if url.starts_with(&public_prefix) {
            return Some(url[public_prefix.len()..].to_string());
        }

        let internal_prefix = format!("{}/{}/", self.endpoint, self.bucket.name());
        if url.starts_with(&internal_prefix) {
            return Some(url[internal_prefix.len()..].to_string());
        }

        None
    }
}
