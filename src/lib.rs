//! Основа для Mastodon ботов: загрузка изображений и отправка поста
//! с ограниченным числом повторов и `Idempotency-Key`.
//!
//! Типичный запуск: [`bot::MediaUploader::upload`] для каждого изображения,
//! затем [`bot::PostSubmitter::submit`] с полученными id, затем хук
//! [`bot::SubmitHooks`].

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod models;
pub mod util;

pub use api::{ApiResponse, HttpTransport, MultipartForm};
pub use bot::{MediaUploader, PostSubmitter, SubmitHooks, TootBot};
pub use config::{PublishOptions, Visibility};
pub use error::{AppError, AppResult, UploadError};
pub use models::{FocalPoint, MediaAsset, MediaReference, PostRequest, SubmitOutcome};
