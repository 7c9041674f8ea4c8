use crate::error::UploadError;
use async_trait::async_trait;
use std::path::Path;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload an image and return its direct URL
    async fn upload(&self, image: &Path) -> Result<String, UploadError>;
}
