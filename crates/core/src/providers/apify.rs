//! Metadata resolver backed by an Apify scraper actor.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::ResolverConfig;

use super::error::ProviderError;
use super::traits::MetadataResolver;
use super::types::ReelMetadata;

const CONTEXT: &str = "Failed to fetch reel data";

/// Runs the reel scraper actor synchronously and reads its first dataset item.
pub struct ApifyResolver {
    client: reqwest::Client,
    config: ResolverConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActorInput<'a> {
    username: [&'a str; 1],
    results_limit: u32,
}

impl ApifyResolver {
    pub fn new(config: ResolverConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::http(CONTEXT, e))?;
        Ok(Self { client, config })
    }

    fn run_url(&self) -> String {
        format!(
            "{}/v2/acts/{}/run-sync-get-dataset-items",
            self.config.api_base.trim_end_matches('/'),
            self.config.actor_id
        )
    }
}

#[async_trait]
impl MetadataResolver for ApifyResolver {
    fn name(&self) -> &str {
        "apify"
    }

    async fn resolve(&self, source_url: &str) -> Result<ReelMetadata, ProviderError> {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        debug!(actor = %self.config.actor_id, "Running metadata actor");

        let response = self
            .client
            .post(self.run_url())
            .query(&[("token", self.config.api_token.as_str())])
            .json(&ActorInput {
                username: [source_url],
                results_limit: 1,
            })
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(CONTEXT, e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                context: CONTEXT.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let items: Vec<Value> = response
            .json()
            .await
            .map_err(|e| ProviderError::json(CONTEXT, e))?;

        let item = items.first().ok_or_else(|| {
            ProviderError::Unavailable(
                "No data returned from Instagram. The reel may be private or unavailable."
                    .to_string(),
            )
        })?;

        Ok(parse_item(item))
    }
}

/// Extracts metadata from one dataset item, tolerating both field spellings.
fn parse_item(item: &Value) -> ReelMetadata {
    ReelMetadata {
        media_url: media_url(item),
        caption: first_str(item, &["caption", "text"]),
        like_count: first_u64(item, &["likesCount", "likes_count"]),
        comment_count: first_u64(item, &["commentsCount", "comments_count"]),
        play_count: first_u64(item, &["videoPlayCount", "play_count"]),
        duration_secs: ["videoDuration", "video_duration"]
            .iter()
            .find_map(|key| item.get(key).and_then(Value::as_f64)),
    }
}

fn media_url(item: &Value) -> Option<String> {
    if let Some(url) = item.get("videoUrl").and_then(Value::as_str) {
        return Some(url.to_string());
    }

    // Pick the widest rendition
    if let Some(versions) = item.get("videoVersions").and_then(Value::as_array) {
        return versions
            .iter()
            .max_by_key(|v| v.get("width").and_then(Value::as_u64).unwrap_or(0))
            .and_then(|v| v.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string);
    }

    item.get("video_url")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn first_str(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| item.get(key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_u64(item: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .find_map(|key| item.get(key).and_then(Value::as_u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config() -> ResolverConfig {
        ResolverConfig {
            api_token: "token".to_string(),
            actor_id: "apify~instagram-reel-scraper".to_string(),
            api_base: "https://api.apify.com/".to_string(),
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_run_url() {
        let resolver = ApifyResolver::new(test_config()).unwrap();
        assert_eq!(
            resolver.run_url(),
            "https://api.apify.com/v2/acts/apify~instagram-reel-scraper/run-sync-get-dataset-items"
        );
        assert_eq!(resolver.name(), "apify");
    }

    #[test]
    fn test_parse_item_camel_case() {
        let item = json!({
            "videoUrl": "https://cdn.example.com/v.mp4",
            "caption": "Morning routine",
            "likesCount": 120,
            "commentsCount": 8,
            "videoPlayCount": 5000,
            "videoDuration": 31.5
        });
        let meta = parse_item(&item);
        assert_eq!(meta.media_url.as_deref(), Some("https://cdn.example.com/v.mp4"));
        assert_eq!(meta.caption.as_deref(), Some("Morning routine"));
        assert_eq!(meta.like_count, Some(120));
        assert_eq!(meta.comment_count, Some(8));
        assert_eq!(meta.play_count, Some(5000));
        assert_eq!(meta.duration_secs, Some(31.5));
    }

    #[test]
    fn test_parse_item_picks_widest_version() {
        let item = json!({
            "videoVersions": [
                { "width": 480, "url": "https://cdn.example.com/480.mp4" },
                { "width": 1080, "url": "https://cdn.example.com/1080.mp4" },
                { "width": 720, "url": "https://cdn.example.com/720.mp4" }
            ],
            "text": "fallback caption",
            "likes_count": 3
        });
        let meta = parse_item(&item);
        assert_eq!(
            meta.media_url.as_deref(),
            Some("https://cdn.example.com/1080.mp4")
        );
        assert_eq!(meta.caption.as_deref(), Some("fallback caption"));
        assert_eq!(meta.like_count, Some(3));
    }

    #[test]
    fn test_parse_item_without_media() {
        let meta = parse_item(&json!({ "caption": "private" }));
        assert!(meta.media_url.is_none());
        assert_eq!(meta.caption.as_deref(), Some("private"));
    }
}
