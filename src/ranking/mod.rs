//! SEO ranking of keywords by YouTube search engagement.
//!
//! Each keyword is searched in turn; the engagement of videos whose title or
//! description mention the keyword becomes its raw score, which is then
//! normalized against the best keyword in the batch.

mod scoring;
mod youtube;

pub use scoring::{normalize_and_sort, raw_score, relevance_score};
pub use youtube::YoutubeSearch;

use crate::config::FailurePolicy;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Metadata of one search result, fetched per keyword and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}

impl VideoMetadata {
    /// Views + likes + comments.
    pub fn engagement(&self) -> u64 {
        self.view_count
            .saturating_add(self.like_count)
            .saturating_add(self.comment_count)
    }
}

/// Score of one keyword within a ranked batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordScore {
    pub keyword: String,
    pub raw_score: u64,
    /// 0 to 100, relative to the best keyword in the batch.
    pub normalized_score: f64,
}

/// A keyword whose external lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordFailure {
    pub keyword: String,
    pub error: String,
}

/// Ranked keywords plus any keywords that could not be scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Sorted by `normalized_score`, descending.
    pub scores: Vec<KeywordScore>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<KeywordFailure>,
}

impl Ranking {
    /// Keywords in ranked order.
    pub fn keywords(&self) -> Vec<String> {
        self.scores.iter().map(|s| s.keyword.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty() && self.failures.is_empty()
    }
}

/// Trait for video search providers.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Search videos for `keyword`, returning at most `max_results` with statistics.
    async fn search(&self, keyword: &str, max_results: u32) -> Result<Vec<VideoMetadata>>;
}

/// Ranks keyword batches using a [`VideoSearch`] provider.
pub struct SeoRanker {
    search: Arc<dyn VideoSearch>,
    max_results: u32,
    policy: FailurePolicy,
}

impl SeoRanker {
    pub fn new(search: Arc<dyn VideoSearch>, max_results: u32, policy: FailurePolicy) -> Self {
        Self {
            search,
            max_results,
            policy,
        }
    }

    /// Rank `keywords`. Searches run one keyword at a time, in order.
    ///
    /// With [`FailurePolicy::Abort`] the first search failure is returned as the
    /// error for the whole batch. With [`FailurePolicy::Isolate`] the failing
    /// keyword is listed in [`Ranking::failures`] and left out of normalization.
    #[instrument(skip(self, keywords), fields(count = keywords.len(), policy = %self.policy))]
    pub async fn rank(&self, keywords: &[String]) -> Result<Ranking> {
        let mut raw = Vec::with_capacity(keywords.len());
        let mut failures = Vec::new();

        for keyword in keywords {
            match self.search.search(keyword, self.max_results).await {
                Ok(videos) => {
                    let score = raw_score(keyword, &videos);
                    debug!("{}: {} videos, raw score {}", keyword, videos.len(), score);
                    raw.push((keyword.clone(), score));
                }
                Err(e) if self.policy == FailurePolicy::Isolate => {
                    warn!("Search failed for '{}': {}", keyword, e);
                    failures.push(KeywordFailure {
                        keyword: keyword.clone(),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let scores = normalize_and_sort(raw);
        info!("Ranked {} keywords ({} failed)", scores.len(), failures.len());

        Ok(Ranking { scores, failures })
    }
}
