pub mod mastodon;

use crate::error::AppResult;
use crate::models::PostRequest;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

pub const STATUSES_PATH: &str = "/api/v1/statuses";
pub const MEDIA_PATH: &str = "/api/v2/media";

/// Полученный HTTP ответ: код, reason phrase и тело
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub reason: String,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, reason: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        ApiResponse {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    pub fn is_status(&self, codes: &[u16]) -> bool {
        codes.contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Содержимое части multipart тела
#[derive(Debug, Clone, PartialEq)]
pub enum PartBody {
    Text(String),
    File { data: Vec<u8>, filename: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub body: PartBody,
    pub headers: Vec<(String, String)>,
}

/// Упорядоченное описание multipart/form-data тела; в байты его превращает транспорт
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>, headers: &[(&str, &str)]) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            body: PartBody::Text(value.into()),
            headers: owned_headers(headers),
        });
        self
    }

    pub fn file(
        mut self,
        name: &str,
        data: Vec<u8>,
        filename: impl Into<String>,
        headers: &[(&str, &str)],
    ) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            body: PartBody::File {
                data,
                filename: filename.into(),
            },
            headers: owned_headers(headers),
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }
}

fn owned_headers(headers: &[(&str, &str)]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Отправка подготовленных запросов на инстанцию.
///
/// `Err` означает сбой транспорта (сеть, таймаут): ответа нет.
/// Любой полученный ответ, в том числе 4xx/5xx, возвращается как `Ok`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &PostRequest,
    ) -> AppResult<ApiResponse>;

    async fn post_multipart(
        &self,
        url: &str,
        headers: HeaderMap,
        form: MultipartForm,
    ) -> AppResult<ApiResponse>;
}
