//! Storage module for intervention attachments
//!
//! Services depend on the [`ObjectStorage`] trait; production wires in the
//! MinIO/S3-compatible client.

mod minio_client;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use minio_client::MinIOClient;

/// Object store holding uploaded files
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Full object key for a path relative to the configured prefix
    fn key_for(&self, path: &str) -> String;

    /// URL under which a stored object is served
    fn url_for(&self, key: &str) -> String;

    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}
