mod admin;
mod handlers;
mod steam;

use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use axum::routing::{delete, get, post};
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::prelude::*;
use crate::state::AppState;

pub fn router(app: Arc<AppState>) -> Router {
  let public = Path::new(&app.config.public_dir);
  let assets = ServeDir::new(public)
    .not_found_service(ServeFile::new(public.join("index.html")));

  Router::new()
    .route("/health", get(handlers::health))
    .route("/api/keys", get(handlers::list_keys))
    .route("/api/claim/{id}", post(handlers::claim))
    .route("/api/admin/keys", get(admin::list_keys))
    .route("/api/admin/add", post(admin::add_key))
    .route("/api/admin/keys/{id}", delete(admin::delete_key))
    .route("/api/cover", get(steam::cover))
    .fallback_service(assets)
    .with_state(app)
}

pub async fn serve(app: Arc<AppState>) -> anyhow::Result<()> {
  let governor_conf = Arc::new(
    GovernorConfigBuilder::default()
      .per_second(2)
      .burst_size(100)
      .finish()
      .context("Failed to build rate limiter config")?,
  );

  let governor_limiter = governor_conf.limiter().clone();

  let router = router(app)
    .layer(
      ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(
          CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        ),
    )
    .into_make_service_with_connect_info::<SocketAddr>();

  let port: u16 =
    std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);
  let addr = SocketAddr::from(([0, 0, 0, 0], port));

  let listener =
    tokio::net::TcpListener::bind(addr).await.context("Failed to bind")?;
  info!("HTTP server listening on {addr}");

  let limiter = async {
    loop {
      time::sleep(Duration::from_secs(60)).await;
      governor_limiter.retain_recent();
    }
  };

  let server =
    async { axum::serve(listener, router).await.context("Axum server error") };

  tokio::select! {
    result = server => {
      match &result {
        Ok(_) => info!("Server stopped gracefully"),
        Err(err) => error!("Server stopped with error: {err}"),
      }
      result
    }
    _ = limiter => {
      error!("Rate limiter cleaner stopped unexpectedly!");
      Ok(())
    }
  }
}
