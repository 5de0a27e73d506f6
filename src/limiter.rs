//! Per-client claim throttling.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use axum::http::HeaderMap;

use crate::prelude::*;

#[derive(Debug, Default, Clone, Copy)]
struct Attempt {
  last_attempt: Option<DateTime>,
  last_success: Option<DateTime>,
}

/// Tracks claim attempts per client address.
///
/// Two windows apply: every admitted attempt starts the short window, and a
/// winning claim additionally starts the long cooldown. Entries are never
/// evicted; a stale entry simply ages past both windows. Under a flood of
/// spoofed identities the map grows unbounded for the process lifetime.
pub struct ClaimLimiter {
  attempts: DashMap<IpAddr, Attempt>,
  window: TimeDelta,
  cooldown: TimeDelta,
}

impl ClaimLimiter {
  pub fn new(window: TimeDelta, cooldown: TimeDelta) -> Self {
    Self { attempts: DashMap::new(), window, cooldown }
  }

  /// Gate an inbound attempt. An admitted attempt records its timestamp; a
  /// rejected one does not refresh the window, so waiting out the reported
  /// `retry_after_ms` is always enough.
  pub fn check(&self, client: IpAddr, now: DateTime) -> Result<()> {
    let mut entry = self.attempts.entry(client).or_default();

    if let Some(at) = entry.last_success {
      let left = self.cooldown - (now - at);
      if left > TimeDelta::zero() {
        return Err(Error::Cooldown { retry_after_ms: left.num_milliseconds() });
      }
    }

    if let Some(at) = entry.last_attempt {
      let left = self.window - (now - at);
      if left > TimeDelta::zero() {
        return Err(Error::Cooldown { retry_after_ms: left.num_milliseconds() });
      }
    }

    entry.last_attempt = Some(now);
    Ok(())
  }

  /// Start the long cooldown. Called only on the winning claim path.
  pub fn record_success(&self, client: IpAddr, now: DateTime) {
    self.attempts.entry(client).or_default().last_success = Some(now);
  }
}

/// Client identity for throttling: the first `x-forwarded-for` entry when it
/// parses as an address (proxy chain honored), else the transport peer.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
  let forwarded = headers
    .get("x-forwarded-for")
    .and_then(|value| value.to_str().ok())
    .and_then(|value| value.split(',').next())
    .and_then(|first| first.trim().parse::<IpAddr>().ok());

  canonical(forwarded.unwrap_or_else(|| peer.ip()))
}

/// `::ffff:1.2.3.4` and `::1` are the same clients as their IPv4 forms.
fn canonical(ip: IpAddr) -> IpAddr {
  match ip.to_canonical() {
    IpAddr::V6(v6) if v6 == Ipv6Addr::LOCALHOST => {
      IpAddr::V4(Ipv4Addr::LOCALHOST)
    }
    other => other,
  }
}
