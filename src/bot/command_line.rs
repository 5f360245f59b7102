use super::hooks::{NoopHooks, SubmitHooks};
use super::{MediaUploader, PostSubmitter, TootBot};
use crate::api::HttpTransport;
use crate::config::{Config, PublishOptions};
use crate::error::AppResult;
use crate::models::{FocalPoint, MediaAsset, PostRequest, SubmitOutcome};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Изображение на диске, которое надо приложить к посту
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub path: PathBuf,
    pub description: String,
    pub thumbnail: Option<PathBuf>,
    pub focus: Option<FocalPoint>,
}

impl ImageSource {
    pub fn from_config(config: &Config) -> AppResult<Option<Self>> {
        let Some(path) = &config.image else {
            return Ok(None);
        };

        Ok(Some(ImageSource {
            path: path.clone(),
            description: config.description.clone(),
            thumbnail: config.thumbnail.clone(),
            focus: config.focal_point()?,
        }))
    }

    async fn load(&self) -> AppResult<MediaAsset> {
        let data = tokio::fs::read(&self.path).await?;
        let mut asset = MediaAsset::new(data, &self.description, file_name(&self.path));

        if let Some(thumbnail) = &self.thumbnail {
            asset = asset.with_thumbnail(tokio::fs::read(thumbnail).await?);
        }
        if let Some(focus) = self.focus {
            asset = asset.with_focus(focus);
        }

        Ok(asset)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

/// Бот, публикующий текст из командной строки и, при наличии, одно изображение
pub struct CommandLineBot<H = NoopHooks> {
    uploader: MediaUploader,
    submitter: PostSubmitter<H>,
    options: Arc<PublishOptions>,
    text: String,
    image: Option<ImageSource>,
}

impl CommandLineBot<NoopHooks> {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        options: Arc<PublishOptions>,
        text: impl Into<String>,
    ) -> Self {
        CommandLineBot {
            uploader: MediaUploader::new(Arc::clone(&transport), Arc::clone(&options)),
            submitter: PostSubmitter::new(transport, Arc::clone(&options)),
            options,
            text: text.into(),
            image: None,
        }
    }
}

impl<H: SubmitHooks> CommandLineBot<H> {
    pub fn with_hooks<T: SubmitHooks>(self, hooks: T) -> CommandLineBot<T> {
        CommandLineBot {
            uploader: self.uploader,
            submitter: self.submitter.with_hooks(hooks),
            options: self.options,
            text: self.text,
            image: self.image,
        }
    }

    pub fn with_image(mut self, image: Option<ImageSource>) -> Self {
        self.image = image;
        self
    }

    pub fn into_hooks(self) -> H {
        self.submitter.into_hooks()
    }
}

#[async_trait]
impl<H: SubmitHooks> TootBot for CommandLineBot<H> {
    async fn post(&mut self) -> AppResult<()> {
        let mut request = PostRequest::new(&self.text, self.options.visibility());

        if let Some(image) = &self.image {
            debug!("Loading image {}", image.path.display());
            let asset = image.load().await?;

            // без картинки пост всё равно уходит
            match self.uploader.upload(asset).await {
                Ok(media) => request = request.with_media(media),
                Err(e) => warn!("Posting without image: {}", e),
            }
        }

        match self.submitter.submit(&request).await {
            SubmitOutcome::Success(_) => info!("Post published to {}", self.options.instance()),
            SubmitOutcome::ExhaustedRetries(last) => warn!(
                "Post not published, last status: {:?}",
                last.map(|r| r.status)
            ),
        }

        Ok(())
    }
}
