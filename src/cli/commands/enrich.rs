//! Enrich command - look up Wikidata taxonomy terms for keywords.

use super::extract::to_json;
use crate::cli::Output;
use crate::config::Settings;
use crate::enrichment::{Enricher, WikidataClient};
use anyhow::Result;
use std::sync::Arc;

/// Enrich `keywords` and print the term map as JSON.
pub async fn run_enrich(keywords: &[String], pretty: bool, settings: Settings) -> Result<()> {
    let client = WikidataClient::from_settings(&settings.wikidata, &settings.http)?;
    let enricher = Enricher::new(Arc::new(client), settings.enrichment.failure_policy);

    let spinner = Output::spinner(&format!("Querying Wikidata for {} keywords...", keywords.len()));
    let enrichment = enricher.enrich(keywords).await;
    spinner.finish_and_clear();

    let enrichment = enrichment?;
    for failure in &enrichment.failures {
        Output::warning(&format!("{}: {}", failure.keyword, failure.error));
    }
    println!("{}", to_json(&enrichment, pretty)?);
    Ok(())
}
