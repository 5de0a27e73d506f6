use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::prelude::*;
use crate::state::AppState;
use crate::steam::Cover;

#[derive(Debug, Deserialize)]
pub struct CoverQuery {
  pub title: Option<String>,
}

pub async fn cover(
  State(app): State<Arc<AppState>>,
  Query(query): Query<CoverQuery>,
) -> Result<Json<Cover>> {
  let title = query
    .title
    .as_deref()
    .map(str::trim)
    .filter(|title| !title.is_empty())
    .ok_or(Error::MissingFields)?;

  Ok(Json(app.cover.resolve(title).await?))
}
