//! Engagement-weighted relevance scoring.
//!
//! ```text
//! relevance = (title_match + description_match) * (views + likes + comments)
//! raw_score = Σ relevance over the keyword's search results
//! normalized = 100 * raw_score / max(raw_score in batch), or 0 when the max is 0
//! ```

use super::{KeywordScore, VideoMetadata};

/// 1 if `keyword` occurs in `text`, ignoring case, else 0.
fn match_score(keyword: &str, text: &str) -> u64 {
    u64::from(text.to_lowercase().contains(&keyword.to_lowercase()))
}

/// Relevance of one video for one keyword.
pub fn relevance_score(keyword: &str, video: &VideoMetadata) -> u64 {
    let title_score = match_score(keyword, &video.title);
    let description_score = match_score(keyword, &video.description);
    (title_score + description_score).saturating_mul(video.engagement())
}

/// Sum of relevance over all videos returned for a keyword.
pub fn raw_score(keyword: &str, videos: &[VideoMetadata]) -> u64 {
    videos
        .iter()
        .fold(0u64, |acc, video| acc.saturating_add(relevance_score(keyword, video)))
}

/// Normalize raw scores against the batch maximum and sort descending.
///
/// The sort is stable, so equal scores keep input order.
pub fn normalize_and_sort(raw: Vec<(String, u64)>) -> Vec<KeywordScore> {
    let max_score = raw.iter().map(|(_, score)| *score).max().unwrap_or(0);

    let mut scores: Vec<KeywordScore> = raw
        .into_iter()
        .map(|(keyword, raw_score)| {
            let normalized_score = if max_score > 0 {
                raw_score as f64 / max_score as f64 * 100.0
            } else {
                0.0
            };
            KeywordScore {
                keyword,
                raw_score,
                normalized_score,
            }
        })
        .collect();

    scores.sort_by(|a, b| b.normalized_score.total_cmp(&a.normalized_score));
    scores
}
