use serde::Serialize;

use crate::{modules::message::schema::GroupMessageKind, ENV};

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub upload_dir: String,
    pub base_url: String,
    pub max_file_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: ENV.upload_dir.clone(),
            base_url: ENV.upload_base_url.clone(),
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Kết quả stage: URL content-addressable để client gắn vào frame
/// image/doc gửi qua WebSocket.
#[derive(Debug, Clone, Serialize)]
pub struct StagedAttachment {
    pub url: String,
    pub kind: GroupMessageKind,
    pub mime_type: String,
    pub file_size: usize,
}
