use crate::api::ApiResponse;
use crate::util;
use chrono::Utc;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{error, info};

const LAST_POST_FILE: &str = "last_post.json";
const LAST_FAILURE_FILE: &str = "last_failure.json";

/// Обработка результата отправки поста: сохранить id, отметить
/// использованный элемент набора данных и т.п. По умолчанию ничего не делает.
pub trait SubmitHooks: Send {
    fn on_success(&mut self, _response: &ApiResponse) {}

    /// Вызывается один раз, когда попытки закончились. `None`, если последняя
    /// попытка упала на транспорте и ответа не было.
    fn on_failure(&mut self, _response: Option<&ApiResponse>) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl SubmitHooks for NoopHooks {}

impl<H: SubmitHooks> SubmitHooks for Option<H> {
    fn on_success(&mut self, response: &ApiResponse) {
        if let Some(hooks) = self {
            hooks.on_success(response);
        }
    }

    fn on_failure(&mut self, response: Option<&ApiResponse>) {
        if let Some(hooks) = self {
            hooks.on_failure(response);
        }
    }
}

/// Записывает id опубликованного поста (или причину неудачи) в каталог данных
#[derive(Debug, Clone)]
pub struct PostJournal {
    data_dir: PathBuf,
}

impl PostJournal {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        PostJournal {
            data_dir: data_dir.into(),
        }
    }

    pub fn last_post_path(&self) -> PathBuf {
        self.data_dir.join(LAST_POST_FILE)
    }

    pub fn last_failure_path(&self) -> PathBuf {
        self.data_dir.join(LAST_FAILURE_FILE)
    }

    fn write(&self, path: PathBuf, entry: Value) {
        if let Err(e) = util::save_json(&path, &entry) {
            error!("Failed to write {}: {}", path.display(), e);
        }
    }
}

impl SubmitHooks for PostJournal {
    fn on_success(&mut self, response: &ApiResponse) {
        let status: Value = response.json().unwrap_or(Value::Null);
        let entry = json!({
            "id": status.get("id").cloned().unwrap_or(Value::Null),
            "url": status.get("url").cloned().unwrap_or(Value::Null),
            "posted_at": Utc::now().to_rfc3339(),
        });

        info!("Recording post {} in {}", entry["id"], self.data_dir.display());
        self.write(self.last_post_path(), entry);
    }

    fn on_failure(&mut self, response: Option<&ApiResponse>) {
        let entry = json!({
            "status": response.map(|r| r.status),
            "reason": response.map(|r| r.reason.as_str()),
            "failed_at": Utc::now().to_rfc3339(),
        });

        self.write(self.last_failure_path(), entry);
    }
}
