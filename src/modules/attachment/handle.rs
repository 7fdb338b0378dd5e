use actix_multipart::Multipart;
use actix_web::{post, web};
use futures_util::TryStreamExt;
use std::sync::Arc;

use crate::api::{error, success};
use crate::modules::attachment::model::{StagedAttachment, UploadConfig};
use crate::modules::attachment::storage::BlobStorage;
use crate::modules::message::schema::GroupMessageKind;

/// Stage attachment trước khi gửi: multipart → blob storage → URL.
/// Message image/doc chỉ được router chấp nhận khi mang URL đã stage.
#[post("/attachments")]
pub async fn stage_attachment(
    mut payload: Multipart,
    storage: web::Data<Arc<dyn BlobStorage>>,
    config: web::Data<UploadConfig>,
) -> Result<success::Success<StagedAttachment>, error::Error> {
    if let Some(mut field) = payload.try_next().await.map_err(|_| error::Error::InternalServer)? {
        let content_disposition = field
            .content_disposition()
            .ok_or_else(|| error::Error::bad_request("Missing content disposition"))?;

        let filename = content_disposition
            .get_filename()
            .ok_or_else(|| error::Error::bad_request("Missing filename"))?
            .to_string();

        let mime_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| {
                mime_guess::from_path(&filename).first_or_octet_stream().to_string()
            });

        let kind = if mime_type.starts_with("image/") {
            GroupMessageKind::Image
        } else {
            GroupMessageKind::Doc
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|_| error::Error::InternalServer)? {
            bytes.extend_from_slice(&chunk);
            if bytes.len() > config.max_file_size {
                return Err(error::Error::bad_request(format!(
                    "File size exceeds maximum allowed size of {} bytes",
                    config.max_file_size
                )));
            }
        }

        let file_size = bytes.len();
        let url = storage.store(&filename, bytes).await?;

        return Ok(success::Success::created(Some(StagedAttachment {
            url,
            kind,
            mime_type,
            file_size,
        })));
    }

    Err(error::Error::bad_request("No file found in request"))
}
