use std::path::Path;
use uuid::Uuid;

use crate::api::error;
use crate::modules::attachment::model::UploadConfig;

/// Collaborator lưu blob: nhận bytes, trả về URL content-addressable.
/// Production trỏ seam này vào object storage; bản disk dưới đây đủ cho
/// deploy đơn máy và test.
#[async_trait::async_trait]
pub trait BlobStorage: Send + Sync {
    async fn store(
        &self,
        original_filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, error::SystemError>;
}

pub struct DiskBlobStorage {
    config: UploadConfig,
}

impl DiskBlobStorage {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    /// Tên file duy nhất, giữ extension gốc
    fn generate_filename(original_filename: &str) -> String {
        let extension =
            Path::new(original_filename).extension().and_then(|ext| ext.to_str()).unwrap_or("");
        let id = Uuid::now_v7();
        if extension.is_empty() {
            id.to_string()
        } else {
            format!("{id}.{extension}")
        }
    }
}

#[async_trait::async_trait]
impl BlobStorage for DiskBlobStorage {
    async fn store(
        &self,
        original_filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, error::SystemError> {
        let filename = Self::generate_filename(original_filename);

        tokio::fs::create_dir_all(&self.config.upload_dir).await?;

        let file_path = format!("{}/{}", self.config.upload_dir, filename);
        tokio::fs::write(&file_path, bytes).await?;

        Ok(format!("{}/{}", self.config.base_url, filename))
    }
}
