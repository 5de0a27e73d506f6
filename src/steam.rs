//! Steam storefront cover lookup.
//!
//! Best effort and fully isolated: an upstream failure maps to an error
//! response and never touches key or claim state.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

const SEARCH_URL: &str = "https://store.steampowered.com/api/storesearch/";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Deserialize)]
struct SearchResults {
  #[serde(default)]
  items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
  id: u64,
  #[serde(default)]
  name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cover {
  pub app_id: u64,
  pub matched_title: String,
  pub header_image_url: String,
}

pub struct CoverResolver {
  client: Client,
  search_url: String,
}

impl CoverResolver {
  pub fn new() -> Self {
    Self::with_search_url(SEARCH_URL)
  }

  /// The search URL is injectable so tests can point at a stub server.
  pub fn with_search_url(url: impl Into<String>) -> Self {
    let client = Client::builder()
      .user_agent(USER_AGENT)
      .timeout(Duration::from_secs(10))
      .build()
      .expect("Failed to build HTTP client");

    Self { client, search_url: url.into() }
  }

  /// First match wins; the header image derives from the matched app id.
  pub async fn resolve(&self, title: &str) -> Result<Cover> {
    let results: SearchResults = self
      .client
      .get(&self.search_url)
      .query(&[("term", title), ("l", "english"), ("cc", "US")])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    let item = results.items.into_iter().next().ok_or(Error::NoCoverMatch)?;

    Ok(Cover {
      app_id: item.id,
      matched_title: item.name,
      header_image_url: header_image(item.id),
    })
  }
}

fn header_image(app_id: u64) -> String {
  format!("https://cdn.cloudflare.steamstatic.com/steam/apps/{app_id}/header.jpg")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_image_derivation() {
    assert_eq!(
      header_image(440),
      "https://cdn.cloudflare.steamstatic.com/steam/apps/440/header.jpg"
    );
  }

  #[test]
  fn test_search_response_parsing() {
    let raw = r#"{
      "total": 2,
      "items": [
        { "id": 440, "name": "Team Fortress 2", "tiny_image": "https://x/capsule_sm_120.jpg" },
        { "id": 570, "name": "Dota 2" }
      ]
    }"#;

    let results: SearchResults = json::from_str(raw).unwrap();
    assert_eq!(results.items.len(), 2);
    assert_eq!(results.items[0].id, 440);
    assert_eq!(results.items[0].name, "Team Fortress 2");
  }

  #[test]
  fn test_empty_search_response_parsing() {
    let results: SearchResults = json::from_str(r#"{"total": 0}"#).unwrap();
    assert!(results.items.is_empty());
  }
}
