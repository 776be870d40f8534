//! Rank command - score keywords by YouTube engagement.

use super::extract::to_json;
use crate::cli::Output;
use crate::config::Settings;
use crate::ranking::{SeoRanker, YoutubeSearch};
use anyhow::Result;
use std::sync::Arc;

/// Rank `keywords` and print the ranking as JSON.
pub async fn run_rank(keywords: &[String], pretty: bool, settings: Settings) -> Result<()> {
    let search = YoutubeSearch::from_settings(&settings.youtube, &settings.http)?;
    let ranker = SeoRanker::new(
        Arc::new(search),
        settings.youtube.max_results,
        settings.ranking.failure_policy,
    );

    let spinner = Output::spinner(&format!("Ranking {} keywords...", keywords.len()));
    let ranking = ranker.rank(keywords).await;
    spinner.finish_and_clear();

    let ranking = ranking?;
    for failure in &ranking.failures {
        Output::warning(&format!("{}: {}", failure.keyword, failure.error));
    }
    println!("{}", to_json(&ranking, pretty)?);
    Ok(())
}
