use migration::Migrator;

use crate::limiter::ClaimLimiter;
use crate::prelude::*;
use crate::steam::CoverResolver;
use crate::sv;

#[derive(Debug, Clone)]
pub struct Config {
  pub public_dir: String,
  /// Short window applied to every admitted claim attempt, in seconds.
  pub claim_window_secs: i64,
  /// Long cooldown started only by a winning claim, in seconds.
  pub claim_cooldown_secs: i64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      public_dir: String::from("./public"),

      claim_window_secs: 10,
      claim_cooldown_secs: 30 * 60,
    }
  }
}

pub struct Services<'a> {
  pub key: sv::Key<'a>,
  pub claim: sv::Claim<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub admin_token: Option<String>,
  pub limiter: ClaimLimiter,
  pub cover: CoverResolver,
  pub config: Config,
}

impl AppState {
  pub async fn new(db_url: &str, admin_token: Option<String>) -> Self {
    Self::with_config(db_url, admin_token, Config::default()).await
  }

  pub async fn with_config(
    db_url: &str,
    admin_token: Option<String>,
    config: Config,
  ) -> Self {
    info!("Connecting to database...");
    let db =
      Database::connect(db_url).await.expect("Failed to connect to database");

    info!("Running migrations...");
    Migrator::up(&db, None).await.expect("Failed to run migrations");

    let limiter = ClaimLimiter::new(
      TimeDelta::seconds(config.claim_window_secs),
      TimeDelta::seconds(config.claim_cooldown_secs),
    );

    Self { db, admin_token, limiter, cover: CoverResolver::new(), config }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      key: sv::Key::new(&self.db),
      claim: sv::Claim::new(&self.db, &self.limiter),
    }
  }
}
