use std::net::IpAddr;

use crate::limiter::ClaimLimiter;
use crate::prelude::*;
use crate::sv;

/// Orchestrates one claim attempt: throttle, conditional flip, reveal.
pub struct Claim<'a> {
  db: &'a DatabaseConnection,
  limiter: &'a ClaimLimiter,
}

impl<'a> Claim<'a> {
  pub fn new(db: &'a DatabaseConnection, limiter: &'a ClaimLimiter) -> Self {
    Self { db, limiter }
  }

  /// At most one caller ever receives the secret for a given id. Losers of
  /// the store race get `AlreadyClaimed`; the long cooldown starts only for
  /// the winner, so a failed attempt never costs an eligible client its
  /// next try.
  pub async fn claim(&self, id: i32, client: IpAddr) -> Result<String> {
    let now = Utc::now().naive_utc();
    self.limiter.check(client, now)?;

    let keys = sv::Key::new(self.db);
    if keys.try_claim(id, now).await? {
      let secret = keys.secret(id).await?;
      self.limiter.record_success(client, now);
      return Ok(secret);
    }

    // Zero rows changed: tell a missing id apart from a lost race
    match keys.by_id(id).await? {
      Some(_) => Err(Error::AlreadyClaimed),
      None => Err(Error::NotFound),
    }
  }
}
