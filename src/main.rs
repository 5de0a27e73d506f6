//! Keydrop - first-come giveaway server for game key codes
//!
//! Architecture:
//! - SeaORM for database access (SQLite)
//! - Axum for the HTTP API with rate limiting
//! - Tokio for async runtime

mod entity;
mod error;
mod limiter;
mod prelude;
mod server;
mod state;
mod steam;
mod sv;

use std::env;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::prelude::*;
use crate::state::AppState;

#[tokio::main]
async fn main() {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "keydrop=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_url = env::var("DATABASE_URL").expect("DATABASE_URL not set");

  let admin_token =
    env::var("ADMIN_TOKEN").ok().filter(|token| !token.trim().is_empty());
  if admin_token.is_none() {
    warn!("ADMIN_TOKEN not set, admin endpoints will refuse every request");
  }

  info!("Starting keydrop v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(&db_url, admin_token).await);

  if let Err(err) = server::serve(app).await {
    error!("Server error: {err:#}");
  }
}
