use super::{ApiResponse, HttpTransport, MultipartForm, PartBody};
use crate::config::PublishOptions;
use crate::error::{AppError, AppResult};
use crate::models::PostRequest;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, error};

/// HTTP транспорт поверх reqwest. Подставляет bearer токен в каждый запрос;
/// токен считается бессрочным, обновление не поддерживается.
pub struct MastodonTransport {
    http_client: Client,
    token: String,
}

impl MastodonTransport {
    pub fn new(options: &PublishOptions) -> AppResult<Self> {
        let http_client = Self::http_client(options.timeout(), options.user_agent())?;

        Ok(MastodonTransport {
            http_client,
            token: options.api_token().to_string(),
        })
    }

    fn http_client(timeout: Duration, user_agent: &str) -> AppResult<Client> {
        Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                error!("Failed to build HTTP client: {}", e);
                AppError::Config(format!("cannot build HTTP client: {}", e))
            })
    }

    fn map_send_error(e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout
        } else {
            AppError::NetworkError(e)
        }
    }

    async fn into_api_response(response: Response) -> AppResult<ApiResponse> {
        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            error!("Failed to read response body: {}", e);
            Self::map_send_error(e)
        })?;

        Ok(ApiResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.to_vec(),
        })
    }

    fn build_form(form: MultipartForm) -> AppResult<Form> {
        form.into_parts()
            .into_iter()
            .try_fold(Form::new(), |acc, part| -> AppResult<Form> {
                let headers = Self::part_headers(&part.headers)?;
                let wire = match part.body {
                    PartBody::Text(value) => Part::text(value),
                    PartBody::File { data, filename } => {
                        let mime = mime_guess::from_path(&filename).first_or_octet_stream();
                        Part::bytes(data)
                            .file_name(filename)
                            .mime_str(mime.as_ref())
                            .map_err(|e| AppError::ApiError(format!("Invalid MIME type: {}", e)))?
                    }
                };
                Ok(acc.part(part.name, wire.headers(headers)))
            })
    }

    fn part_headers(pairs: &[(String, String)]) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AppError::ApiError(format!("Invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AppError::ApiError(format!("Invalid header value: {}", e)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl HttpTransport for MastodonTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &PostRequest,
    ) -> AppResult<ApiResponse> {
        debug!("POST {} (json)", url);

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.token)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::into_api_response(response).await
    }

    async fn post_multipart(
        &self,
        url: &str,
        headers: HeaderMap,
        form: MultipartForm,
    ) -> AppResult<ApiResponse> {
        debug!("POST {} (multipart, {} parts)", url, form.parts().len());

        let form = Self::build_form(form)?;

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.token)
            .headers(headers)
            .multipart(form)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::into_api_response(response).await
    }
}
