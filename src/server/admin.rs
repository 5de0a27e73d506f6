//! Operator-only inventory curation, gated on the `x-admin-token` header.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use serde::Deserialize;

use crate::entity::key;
use crate::prelude::*;
use crate::state::AppState;

/// Absent and mismatched tokens fail identically. An unconfigured token
/// fails closed instead of granting access.
fn require_admin(app: &AppState, headers: &HeaderMap) -> Result<()> {
  let expected = app.admin_token.as_deref().ok_or(Error::Misconfigured)?;

  let provided =
    headers.get("x-admin-token").and_then(|token| token.to_str().ok());
  if provided != Some(expected) {
    return Err(Error::Unauthorized);
  }

  Ok(())
}

pub async fn list_keys(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<key::Model>>> {
  require_admin(&app, &headers)?;
  Ok(Json(app.sv().key.list_all().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddKeyReq {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub image_url: String,
  #[serde(default)]
  pub secret: String,
}

pub async fn add_key(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  body: Result<Json<AddKeyReq>, JsonRejection>,
) -> Result<Json<json::Value>> {
  require_admin(&app, &headers)?;

  let Ok(Json(req)) = body else {
    return Err(Error::MissingFields);
  };

  let key = app.sv().key.insert(&req.title, &req.image_url, &req.secret).await?;
  info!("Key {} added: {}", key.id, key.title);

  Ok(Json(json::json!({ "ok": true, "id": key.id })))
}

pub async fn delete_key(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(id): Path<i32>,
) -> Result<Json<json::Value>> {
  require_admin(&app, &headers)?;

  if !app.sv().key.delete(id).await? {
    return Err(Error::NotFound);
  }
  info!("Key {id} deleted");

  Ok(Json(json::json!({ "ok": true })))
}
