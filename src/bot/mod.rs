pub mod command_line;
pub mod hooks;
pub mod submitter;
pub mod uploader;

pub use command_line::{CommandLineBot, ImageSource};
pub use hooks::{NoopHooks, PostJournal, SubmitHooks};
pub use submitter::PostSubmitter;
pub use uploader::MediaUploader;

use crate::config::PublishOptions;
use crate::error::AppResult;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

/// Бот, которого по расписанию (cron, CI runner) вызывают один раз за запуск
#[async_trait]
pub trait TootBot: Send {
    /// Готовит контент и публикует один пост
    async fn post(&mut self) -> AppResult<()>;
}

/// Заголовки, общие для всех запросов к инстанции
fn base_headers(options: &PublishOptions) -> HeaderMap {
    let mut headers = HeaderMap::new();
    // user agent уже проверен в PublishOptionsBuilder::build
    if let Ok(value) = HeaderValue::from_str(options.user_agent()) {
        headers.insert(USER_AGENT, value);
    }
    headers
}
