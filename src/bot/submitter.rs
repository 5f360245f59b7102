use super::base_headers;
use super::hooks::{NoopHooks, SubmitHooks};
use crate::api::HttpTransport;
use crate::config::PublishOptions;
use crate::models::{PostRequest, SubmitOutcome};
use rand::RngCore;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

const IDEMPOTENCY_KEY: &str = "idempotency-key";

/// Отправка поста, POST /api/v1/statuses, с ограниченным числом повторов.
///
/// Все попытки одного `submit()` несут один и тот же `Idempotency-Key`:
/// если ответ на успешную попытку потерялся, сервер не создаст дубликат.
/// После полученного не-200 ответа перед следующей попыткой выдерживается
/// пауза `retry_delay`; после сбоя транспорта повтор идёт сразу.
///
/// https://docs.joinmastodon.org/methods/statuses/#create
pub struct PostSubmitter<H = NoopHooks> {
    transport: Arc<dyn HttpTransport>,
    options: Arc<PublishOptions>,
    hooks: H,
}

impl PostSubmitter<NoopHooks> {
    pub fn new(transport: Arc<dyn HttpTransport>, options: Arc<PublishOptions>) -> Self {
        PostSubmitter {
            transport,
            options,
            hooks: NoopHooks,
        }
    }
}

impl<H: SubmitHooks> PostSubmitter<H> {
    pub fn with_hooks<T: SubmitHooks>(self, hooks: T) -> PostSubmitter<T> {
        PostSubmitter {
            transport: self.transport,
            options: self.options,
            hooks,
        }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn into_hooks(self) -> H {
        self.hooks
    }

    /// Не более `retries + 1` попыток. Ошибки наружу не пробрасываются:
    /// результат виден в `SubmitOutcome` и в вызванном хуке.
    pub async fn submit(&mut self, request: &PostRequest) -> SubmitOutcome {
        let url = self.options.statuses_url();
        let headers = self.headers();
        let mut retry: u32 = 0;
        let mut last_response = None;

        loop {
            match self.transport.post_json(&url, headers.clone(), request).await {
                Err(e) => {
                    warn!("submit post exception: {} (retry #{})", e, retry);
                    last_response = None;
                    retry += 1;
                }
                Ok(response) if response.status == 200 => {
                    info!("post submitted (retry #{})", retry);
                    self.hooks.on_success(&response);
                    return SubmitOutcome::Success(response);
                }
                Ok(response) => {
                    warn!("submit post error: {} (retry #{})", response.reason, retry);
                    last_response = Some(response);
                    retry += 1;

                    if retry <= self.options.retries() {
                        // не долбим сервер, ждём
                        sleep(self.options.retry_delay()).await;
                    }
                }
            }

            if retry > self.options.retries() {
                break;
            }
        }

        error!("submit post failed after {} attempts", retry);
        self.hooks.on_failure(last_response.as_ref());
        SubmitOutcome::ExhaustedRetries(last_response)
    }

    /// Ключ генерируется один раз на вызов `submit()`, не на попытку
    fn headers(&self) -> HeaderMap {
        let mut headers = base_headers(&self.options);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(key) = HeaderValue::from_str(&idempotency_key()) {
            headers.insert(IDEMPOTENCY_KEY, key);
        }
        headers
    }
}

fn idempotency_key() -> String {
    let mut seed = [0u8; 128];
    rand::rng().fill_bytes(&mut seed);
    hex::encode(Sha256::digest(seed))
}
