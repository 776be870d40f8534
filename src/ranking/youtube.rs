//! YouTube Data API v3 video search.

use super::{VideoMetadata, VideoSearch};
use crate::config::{HttpSettings, YoutubeSettings};
use crate::error::{Result, SokordError};
use crate::http::{body_excerpt, build_client, DEFAULT_USER_AGENT};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// YouTube search client (`search.list` followed by `videos.list`).
pub struct YoutubeSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Snippet {
    title: String,
    description: String,
}

/// Counts arrive as decimal strings and are omitted when hidden by the uploader.
#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

fn parse_count(value: Option<&String>) -> u64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}

impl From<VideoItem> for VideoMetadata {
    fn from(item: VideoItem) -> Self {
        VideoMetadata {
            video_id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            view_count: parse_count(item.statistics.view_count.as_ref()),
            like_count: parse_count(item.statistics.like_count.as_ref()),
            comment_count: parse_count(item.statistics.comment_count.as_ref()),
        }
    }
}

impl YoutubeSearch {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout, DEFAULT_USER_AGENT)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Create a client from settings. Fails if no API key is configured.
    pub fn from_settings(settings: &YoutubeSettings, http: &HttpSettings) -> Result<Self> {
        let api_key = settings.api_key().ok_or_else(|| {
            SokordError::Config(
                "YouTube API key not set. Set youtube.api_key or export YOUTUBE_API_KEY".to_string(),
            )
        })?;
        Self::new(
            &settings.base_url,
            &api_key,
            Duration::from_secs(http.timeout_seconds),
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, endpoint))
            .map_err(|e| SokordError::Config(format!("invalid YouTube base URL: {e}")))?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("key", &self.api_key);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SokordError::SearchUnavailable(format!("{endpoint} request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SokordError::SearchUnavailable(format!("{endpoint} response unreadable: {}", e.without_url())))?;

        if !status.is_success() {
            return Err(SokordError::SearchUnavailable(format!(
                "{endpoint} returned {}: {}",
                status,
                body_excerpt(&body)
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| SokordError::SearchUnavailable(format!("unexpected {endpoint} response: {e}")))
    }
}

#[async_trait]
impl VideoSearch for YoutubeSearch {
    #[instrument(skip(self))]
    async fn search(&self, keyword: &str, max_results: u32) -> Result<Vec<VideoMetadata>> {
        let max = max_results.to_string();
        let search: SearchListResponse = self
            .get_json(
                "search",
                &[
                    ("part", "id,snippet"),
                    ("type", "video"),
                    ("maxResults", max.as_str()),
                    ("q", keyword),
                ],
            )
            .await?;

        let ids: Vec<String> = search
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect();

        if ids.is_empty() {
            debug!("No videos found");
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let videos: VideoListResponse = self
            .get_json("videos", &[("part", "snippet,statistics"), ("id", joined.as_str())])
            .await?;

        Ok(videos.items.into_iter().map(VideoMetadata::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_item_with_hidden_stats() {
        let item: VideoItem = serde_json::from_str(
            r#"{
                "id": "abc",
                "snippet": {"title": "AI explained", "description": "intro"},
                "statistics": {"viewCount": "100", "commentCount": "2"}
            }"#,
        )
        .unwrap();

        let video = VideoMetadata::from(item);
        assert_eq!(video.view_count, 100);
        assert_eq!(video.like_count, 0);
        assert_eq!(video.comment_count, 2);
        assert_eq!(video.engagement(), 102);
    }

    #[test]
    fn test_video_item_without_statistics() {
        let item: VideoItem = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        let video = VideoMetadata::from(item);
        assert_eq!(video.title, "");
        assert_eq!(video.engagement(), 0);
    }

    #[test]
    fn test_search_item_without_video_id() {
        let response: SearchListResponse = serde_json::from_str(
            r#"{"items": [{"id": {"kind": "youtube#channel", "channelId": "c"}}, {"id": {"videoId": "v1"}}]}"#,
        )
        .unwrap();
        let ids: Vec<_> = response.items.into_iter().filter_map(|i| i.id.video_id).collect();
        assert_eq!(ids, vec!["v1".to_string()]);
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let settings = YoutubeSettings {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        if std::env::var("YOUTUBE_API_KEY").is_err() {
            assert!(matches!(
                YoutubeSearch::from_settings(&settings, &HttpSettings::default()),
                Err(SokordError::Config(_))
            ));
        }
    }
}
