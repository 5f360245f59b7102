use crate::error::{AppError, AppResult};
use crate::models::FocalPoint;
use crate::util;
use clap::Parser;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_INSTANCE: &str = "https://botsin.space";
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_SECS: u64 = 2;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = concat!("tootbot/", env!("CARGO_PKG_VERSION"));

/// Видимость поста
/// https://docs.joinmastodon.org/methods/statuses/#form-data-parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
            Visibility::Direct => "direct",
        }
    }
}

impl FromStr for Visibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "unlisted" => Ok(Visibility::Unlisted),
            "private" => Ok(Visibility::Private),
            "direct" => Ok(Visibility::Direct),
            other => Err(AppError::Config(format!(
                "invalid toot visibility: \"{}\"",
                other
            ))),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Уровень логирования в терминах PSR-3, сводится к уровням tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_tracing(&self) -> tracing::Level {
        match self {
            LogLevel::Emergency | LogLevel::Alert | LogLevel::Critical | LogLevel::Error => {
                tracing::Level::ERROR
            }
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Notice | LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
        }
    }

    /// Директива для EnvFilter, если RUST_LOG не задан
    pub fn filter_directive(&self) -> String {
        self.as_tracing().as_str().to_lowercase()
    }
}

impl FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "emergency" => Ok(LogLevel::Emergency),
            "alert" => Ok(LogLevel::Alert),
            "critical" => Ok(LogLevel::Critical),
            "error" => Ok(LogLevel::Error),
            "warning" => Ok(LogLevel::Warning),
            "notice" => Ok(LogLevel::Notice),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(AppError::Config(format!("invalid loglevel: \"{}\"", other))),
        }
    }
}

/// Неизменяемые параметры одного запуска бота.
/// Создаются только через `PublishOptions::builder()`.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    instance: String,
    api_token: String,
    visibility: Visibility,
    loglevel: LogLevel,
    retries: u32,
    retry_delay: Duration,
    user_agent: String,
    timeout: Duration,
    data_dir: Option<PathBuf>,
    build_dir: Option<PathBuf>,
}

impl PublishOptions {
    pub fn builder() -> PublishOptionsBuilder {
        PublishOptionsBuilder::default()
    }

    /// Адрес инстанции без завершающего слэша
    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn loglevel(&self) -> LogLevel {
        self.loglevel
    }

    /// Сколько раз повторять отправку после первой неудачной попытки
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Проверен как значение HTTP заголовка
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn build_dir(&self) -> Option<&Path> {
        self.build_dir.as_deref()
    }

    pub fn statuses_url(&self) -> String {
        format!("{}{}", self.instance, crate::api::STATUSES_PATH)
    }

    pub fn media_url(&self) -> String {
        format!("{}{}", self.instance, crate::api::MEDIA_PATH)
    }
}

/// Строитель PublishOptions. Перечисления проверяются в `build()`,
/// ошибка возвращается сразу, а не при первом запросе.
#[derive(Debug, Clone)]
pub struct PublishOptionsBuilder {
    instance: String,
    api_token: String,
    visibility: String,
    loglevel: String,
    retries: u32,
    retry_delay: Duration,
    user_agent: String,
    timeout: Duration,
    data_dir: Option<PathBuf>,
    build_dir: Option<PathBuf>,
}

impl Default for PublishOptionsBuilder {
    fn default() -> Self {
        PublishOptionsBuilder {
            instance: DEFAULT_INSTANCE.to_string(),
            api_token: String::new(),
            visibility: Visibility::default().to_string(),
            loglevel: "info".to_string(),
            retries: DEFAULT_RETRIES,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir: None,
            build_dir: None,
        }
    }
}

impl PublishOptionsBuilder {
    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = token.into();
        self
    }

    pub fn visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = visibility.into();
        self
    }

    pub fn loglevel(mut self, loglevel: impl Into<String>) -> Self {
        self.loglevel = loglevel.into();
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> AppResult<PublishOptions> {
        let instance = self.instance.trim_end_matches('/').to_string();
        if instance.is_empty() {
            return Err(AppError::Config("instance URL must not be empty".to_string()));
        }

        let visibility = self.visibility.parse::<Visibility>()?;
        let loglevel = self.loglevel.parse::<LogLevel>()?;

        if HeaderValue::from_str(&self.user_agent).is_err() {
            return Err(AppError::Config(format!(
                "invalid user agent: \"{}\"",
                self.user_agent
            )));
        }

        let data_dir = self.data_dir.map(util::mkdir).transpose()?;
        let build_dir = self.build_dir.map(util::mkdir).transpose()?;

        Ok(PublishOptions {
            instance,
            api_token: self.api_token,
            visibility,
            loglevel,
            retries: self.retries,
            retry_delay: self.retry_delay,
            user_agent: self.user_agent,
            timeout: self.timeout,
            data_dir,
            build_dir,
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "tootbot")]
#[command(author = "Dabe Vlohn")]
#[command(version)]
#[command(about = "Posts a status (optionally with an image) to a Mastodon instance")]
pub struct Config {
    /// Домашняя инстанция бота, например https://botsin.space/
    /// env: TOOTBOT_INSTANCE
    #[arg(long, env = "TOOTBOT_INSTANCE", default_value = DEFAULT_INSTANCE)]
    pub instance: String,

    /// Access token из настроек приложения на инстанции
    /// env: TOOTBOT_TOKEN
    #[arg(long, env = "TOOTBOT_TOKEN", hide_env_values = true)]
    pub token: String,

    /// public, unlisted, private или direct
    #[arg(long, env = "TOOTBOT_VISIBILITY", default_value = "public")]
    pub visibility: String,

    /// emergency, alert, critical, error, warning, notice, info, debug
    #[arg(long, env = "TOOTBOT_LOGLEVEL", default_value = "info")]
    pub loglevel: String,

    /// Количество повторов отправки поста
    #[arg(long, env = "TOOTBOT_RETRIES", default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,

    /// Пауза между повторами, секунды
    #[arg(long, env = "TOOTBOT_RETRY_DELAY", default_value_t = DEFAULT_RETRY_DELAY_SECS)]
    pub retry_delay: u64,

    #[arg(long, env = "TOOTBOT_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Таймаут HTTP запроса, секунды
    #[arg(long, env = "TOOTBOT_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Каталог данных (создаётся при запуске)
    #[arg(long, env = "TOOTBOT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Каталог сборки (создаётся при запуске)
    #[arg(long, env = "TOOTBOT_BUILD_DIR")]
    pub build_dir: Option<PathBuf>,

    /// Текст поста
    #[arg(long, env = "TOOTBOT_TEXT")]
    pub text: String,

    /// Изображение для вложения
    #[arg(long, env = "TOOTBOT_IMAGE")]
    pub image: Option<PathBuf>,

    /// Alt-текст изображения
    #[arg(long, env = "TOOTBOT_DESCRIPTION", default_value = "")]
    pub description: String,

    /// Миниатюра изображения
    #[arg(long, env = "TOOTBOT_THUMBNAIL")]
    pub thumbnail: Option<PathBuf>,

    /// Фокус изображения в виде "x,y", обе координаты в [-1, 1]
    #[arg(long, env = "TOOTBOT_FOCUS", allow_hyphen_values = true)]
    pub focus: Option<String>,
}

impl Config {
    /// Валидирует конфигурацию при запуске
    pub fn validate(&self) -> AppResult<()> {
        if self.token.trim().is_empty() {
            return Err(AppError::Config(
                "API token is required (--token or TOOTBOT_TOKEN)".to_string(),
            ));
        }

        if self.image.is_none() && (self.thumbnail.is_some() || self.focus.is_some()) {
            return Err(AppError::Config(
                "--thumbnail and --focus require --image".to_string(),
            ));
        }

        if self.image.is_some() && self.description.trim().is_empty() {
            return Err(AppError::Config(
                "--image requires an alt-text --description".to_string(),
            ));
        }

        self.focal_point()?;

        Ok(())
    }

    pub fn focal_point(&self) -> AppResult<Option<FocalPoint>> {
        self.focus
            .as_deref()
            .map(str::parse::<FocalPoint>)
            .transpose()
    }

    pub fn publish_options(&self) -> AppResult<PublishOptions> {
        let mut builder = PublishOptions::builder()
            .instance(&self.instance)
            .api_token(&self.token)
            .visibility(&self.visibility)
            .loglevel(&self.loglevel)
            .retries(self.retries)
            .retry_delay(Duration::from_secs(self.retry_delay))
            .user_agent(&self.user_agent)
            .timeout(Duration::from_secs(self.timeout));

        if let Some(dir) = &self.data_dir {
            builder = builder.data_dir(dir);
        }
        if let Some(dir) = &self.build_dir {
            builder = builder.build_dir(dir);
        }

        builder.build()
    }
}
