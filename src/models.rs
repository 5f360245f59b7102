use crate::api::ApiResponse;
use crate::config::Visibility;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Тело запроса POST /api/v1/statuses
#[derive(Debug, Clone, Serialize)]
pub struct PostRequest {
    pub status: String,
    pub visibility: Visibility,
    /// Лимит на количество вложений задаёт сервер, здесь он не проверяется
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media_ids: Vec<MediaReference>,
    /// Любые дополнительные поля API (spoiler_text, language, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PostRequest {
    pub fn new(status: impl Into<String>, visibility: Visibility) -> Self {
        PostRequest {
            status: status.into(),
            visibility,
            media_ids: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_media(mut self, media: MediaReference) -> Self {
        self.media_ids.push(media);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Фокус изображения, обе координаты в [-1, 1]
/// https://docs.joinmastodon.org/api/guidelines/#focal-points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocalPoint {
    x: f64,
    y: f64,
}

impl FocalPoint {
    pub fn new(x: f64, y: f64) -> AppResult<Self> {
        let valid = |v: f64| (-1.0..=1.0).contains(&v);
        if !valid(x) || !valid(y) {
            return Err(AppError::InvalidFocalPoint { x, y });
        }
        Ok(FocalPoint { x, y })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

impl fmt::Display for FocalPoint {
    // Формат поля `focus`: "%f,%f"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.x, self.y)
    }
}

impl FromStr for FocalPoint {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| AppError::Config(format!("invalid focus \"{}\", expected x,y", s)))?;

        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| AppError::Config(format!("invalid focus coordinate \"{}\": {}", v, e)))
        };

        FocalPoint::new(parse(x)?, parse(y)?)
    }
}

/// Изображение для загрузки на сервер
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub data: Vec<u8>,
    /// Alt-текст
    pub description: String,
    /// По расширению сервер определяет MIME тип
    pub filename: String,
    pub thumbnail: Option<Vec<u8>>,
    pub focus: Option<FocalPoint>,
}

impl MediaAsset {
    pub fn new(
        data: Vec<u8>,
        description: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        MediaAsset {
            data,
            description: description.into(),
            filename: filename.into(),
            thumbnail: None,
            focus: None,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: Vec<u8>) -> Self {
        self.thumbnail = Some(thumbnail);
        self
    }

    pub fn with_focus(mut self, focus: FocalPoint) -> Self {
        self.focus = Some(focus);
        self
    }
}

/// Непрозрачный id медиа на сервере. Живёт ровно до следующей отправки поста.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaReference(String);

impl MediaReference {
    pub fn new(id: impl Into<String>) -> Self {
        MediaReference(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Итог `PostSubmitter::submit`
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Success(ApiResponse),
    /// Ответ последней попытки, если он вообще был получен
    ExhaustedRetries(Option<ApiResponse>),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Success(_))
    }
}
