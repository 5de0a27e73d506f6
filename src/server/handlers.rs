use std::net::SocketAddr;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::entity::key;
use crate::limiter;
use crate::prelude::*;
use crate::state::AppState;

/// Public projection of a key row. The secret field does not exist here, so
/// no listing can leak it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKey {
  pub id: i32,
  pub title: String,
  pub image_url: String,
}

impl From<key::Model> for PublicKey {
  fn from(key: key::Model) -> Self {
    Self { id: key.id, title: key.title, image_url: key.image_url }
  }
}

pub async fn health() -> &'static str {
  "OK"
}

pub async fn list_keys(
  State(app): State<Arc<AppState>>,
) -> Result<Json<Vec<PublicKey>>> {
  let keys = app.sv().key.list_unclaimed().await?;
  Ok(Json(keys.into_iter().map(PublicKey::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct ClaimReq {
  /// Honeypot. Humans never see this form field; scripted submitters fill
  /// it or drop it entirely.
  pub website: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClaimRes {
  pub secret: String,
}

pub async fn claim(
  State(app): State<Arc<AppState>>,
  ConnectInfo(peer): ConnectInfo<SocketAddr>,
  headers: HeaderMap,
  Path(id): Path<i32>,
  body: Result<Json<ClaimReq>, JsonRejection>,
) -> Result<Json<ClaimRes>> {
  // Decoy check comes first: no limiter or store access for bots. The field
  // must be present and empty; a missing/unparseable body counts as a bot.
  let decoy = match body {
    Ok(Json(req)) => req.website,
    Err(_) => None,
  };
  if decoy.as_deref().map(str::trim) != Some("") {
    return Err(Error::BotSuspected);
  }

  let client = limiter::client_ip(&headers, peer);
  let secret = app.sv().claim.claim(id, client).await?;

  Ok(Json(ClaimRes { secret }))
}
