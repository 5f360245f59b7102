use super::base_headers;
use crate::api::{HttpTransport, MultipartForm};
use crate::config::PublishOptions;
use crate::error::UploadError;
use crate::models::{MediaAsset, MediaReference};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Загрузка изображения на инстанцию, POST /api/v2/media.
/// Делается ровно одна попытка; повторять ли загрузку, решает вызывающий.
///
/// https://docs.joinmastodon.org/methods/media/
pub struct MediaUploader {
    transport: Arc<dyn HttpTransport>,
    options: Arc<PublishOptions>,
}

impl MediaUploader {
    pub fn new(transport: Arc<dyn HttpTransport>, options: Arc<PublishOptions>) -> Self {
        MediaUploader { transport, options }
    }

    pub async fn upload(&self, asset: MediaAsset) -> Result<MediaReference, UploadError> {
        debug!(
            "Uploading media: {} ({} bytes, thumbnail: {})",
            asset.filename,
            asset.data.len(),
            asset.thumbnail.is_some()
        );

        let form = build_form(asset);

        let response = self
            .transport
            .post_multipart(&self.options.media_url(), base_headers(&self.options), form)
            .await
            .map_err(|e| {
                error!("image upload transport error: {}", e);
                UploadError::Transport(e)
            })?;

        // 202: сервер ещё обрабатывает файл, но id уже можно прикреплять к посту
        if !response.is_status(&[200, 202]) {
            error!("image upload error: HTTP/{}", response.status);
            return Err(UploadError::Status {
                status: response.status,
                reason: response.reason,
            });
        }

        let json: Value = response.json().map_err(|e| {
            error!("image upload response json decode error: {}", e);
            UploadError::Decode(e)
        })?;

        let id = match &json["id"] {
            Value::String(id) => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => {
                error!("image upload response has no media id");
                return Err(UploadError::MissingId);
            }
        };

        info!("upload successful, media id: \"{}\"", id);
        Ok(MediaReference::new(id))
    }
}

/// Порядок частей: description, focus, file, thumbnail
fn build_form(asset: MediaAsset) -> MultipartForm {
    let mut form = MultipartForm::new().text(
        "description",
        asset.description,
        &[("Content-Encoding", "UTF-8")],
    );

    if let Some(focus) = asset.focus {
        form = form.text("focus", focus.to_string(), &[]);
    }

    let binary = [("Content-Transfer-Encoding", "binary")];

    // миниатюра получает то же расширение: MIME определяется по имени файла
    let thumbnail_name = format!("thumbnail-{}", asset.filename);

    form = form.file("file", asset.data, asset.filename, &binary);

    if let Some(thumbnail) = asset.thumbnail {
        form = form.file("thumbnail", thumbnail, thumbnail_name, &binary);
    }

    form
}
