//! Error types for the giveaway server

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("key not found")]
  NotFound,

  #[error("key already claimed")]
  AlreadyClaimed,

  #[error("secret already present in inventory")]
  DuplicateSecret,

  #[error("missing or empty fields")]
  MissingFields,

  #[error("honeypot tripped")]
  BotSuspected,

  #[error("claim cooldown active, retry in {retry_after_ms}ms")]
  Cooldown { retry_after_ms: i64 },

  #[error("bad admin token")]
  Unauthorized,

  #[error("admin token not configured")]
  Misconfigured,

  #[error("no store match for title")]
  NoCoverMatch,

  #[error("store lookup failed: {0}")]
  Upstream(#[from] reqwest::Error),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    // Internal detail stays in the logs, clients get a generic code.
    match &self {
      Error::Database(err) => tracing::error!("database error: {err}"),
      Error::Upstream(err) => tracing::warn!("cover lookup failed: {err}"),
      _ => {}
    }

    let (status, code) = match &self {
      Error::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
      Error::NotFound => (StatusCode::NOT_FOUND, "not_found"),
      Error::AlreadyClaimed => (StatusCode::CONFLICT, "already_claimed"),
      Error::DuplicateSecret => (StatusCode::CONFLICT, "duplicate_key"),
      Error::MissingFields => (StatusCode::BAD_REQUEST, "missing_fields"),
      Error::BotSuspected => (StatusCode::BAD_REQUEST, "bot_detected"),
      Error::Cooldown { .. } => (StatusCode::TOO_MANY_REQUESTS, "cooldown"),
      Error::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
      Error::Misconfigured => {
        (StatusCode::INTERNAL_SERVER_ERROR, "admin_not_configured")
      }
      Error::NoCoverMatch => (StatusCode::NOT_FOUND, "not_found"),
      Error::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
    };

    let mut body = json::json!({ "error": code });
    if let Error::Cooldown { retry_after_ms } = &self {
      body["retryAfterMs"] = json::json!(retry_after_ms);
    }

    (status, Json(body)).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
