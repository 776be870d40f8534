//! Wikidata entity search and SPARQL taxonomy lookup.

use super::{EntityId, KnowledgeGraph};
use crate::config::{HttpSettings, WikidataSettings};
use crate::error::{Result, SokordError};
use crate::http::{body_excerpt, build_client};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// "subclass of"
const SUBCLASS_OF: &str = "P279";

/// Wikidata client for `wbsearchentities` and the SPARQL endpoint.
pub struct WikidataClient {
    client: reqwest::Client,
    api_url: String,
    sparql_url: String,
    language: String,
}

#[derive(Deserialize)]
struct SearchEntitiesResponse {
    #[serde(default)]
    search: Vec<EntityMatch>,
}

#[derive(Deserialize)]
struct EntityMatch {
    id: String,
}

#[derive(Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<Binding>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Binding {
    property: Option<BindingValue>,
    property_label: Option<BindingValue>,
    value_label: Option<BindingValue>,
}

#[derive(Deserialize)]
struct BindingValue {
    value: String,
}

impl Binding {
    fn is_subclass_of(&self) -> bool {
        let by_uri = self
            .property
            .as_ref()
            .is_some_and(|p| p.value.rsplit('/').next() == Some(SUBCLASS_OF));
        let by_label = self
            .property_label
            .as_ref()
            .is_some_and(|l| l.value == "subclass of");
        by_uri || by_label
    }
}

impl WikidataClient {
    pub fn new(
        api_url: &str,
        sparql_url: &str,
        language: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        if language.is_empty()
            || !language.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(SokordError::Config(format!(
                "invalid Wikidata language code: {language:?}"
            )));
        }

        Ok(Self {
            client: build_client(timeout, user_agent)?,
            api_url: api_url.to_string(),
            sparql_url: sparql_url.to_string(),
            language: language.to_string(),
        })
    }

    pub fn from_settings(settings: &WikidataSettings, http: &HttpSettings) -> Result<Self> {
        Self::new(
            &settings.api_url,
            &settings.sparql_url,
            &settings.language,
            &settings.user_agent,
            Duration::from_secs(http.timeout_seconds),
        )
    }

    /// SPARQL for P31/P279/P2283 claims of `entity` with labels.
    fn build_query(&self, entity: &EntityId) -> String {
        format!(
            r#"SELECT ?property ?propertyLabel ?value ?valueLabel WHERE {{
  VALUES ?prop {{ wdt:P31 wdt:P279 wdt:P2283 }}
  wd:{entity} ?prop ?value .
  ?property wikibase:directClaim ?prop .
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "{lang},en". }}
}}"#,
            entity = entity,
            lang = self.language,
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        base: &str,
        params: &[(&str, &str)],
        accept: &str,
    ) -> Result<T> {
        let url = Url::parse_with_params(base, params)
            .map_err(|e| SokordError::Config(format!("invalid Wikidata URL {base}: {e}")))?;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .await
            .map_err(|e| SokordError::EnrichmentUnavailable(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SokordError::EnrichmentUnavailable(format!("response unreadable: {e}")))?;

        if !status.is_success() {
            return Err(SokordError::EnrichmentUnavailable(format!(
                "{} returned {}: {}",
                base,
                status,
                body_excerpt(&body)
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| SokordError::EnrichmentUnavailable(format!("unexpected response from {base}: {e}")))
    }
}

#[async_trait]
impl KnowledgeGraph for WikidataClient {
    #[instrument(skip(self))]
    async fn find_entity(&self, keyword: &str) -> Result<Option<EntityId>> {
        let response: SearchEntitiesResponse = self
            .get_json(
                &self.api_url,
                &[
                    ("action", "wbsearchentities"),
                    ("format", "json"),
                    ("language", self.language.as_str()),
                    ("search", keyword),
                ],
                "application/json",
            )
            .await?;

        match response.search.into_iter().next() {
            Some(hit) => EntityId::parse(&hit.id).map(Some),
            None => {
                debug!("No Wikidata entity found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self), fields(entity = %entity))]
    async fn query_associated_terms(&self, entity: &EntityId) -> Result<Vec<String>> {
        let query = self.build_query(entity);
        let response: SparqlResponse = self
            .get_json(
                &self.sparql_url,
                &[("query", query.as_str()), ("format", "json")],
                "application/sparql-results+json",
            )
            .await?;

        let terms: Vec<String> = response
            .results
            .bindings
            .into_iter()
            .filter(Binding::is_subclass_of)
            .filter_map(|b| b.value_label.map(|l| l.value))
            .collect();

        debug!("{} subclass-of terms", terms.len());
        Ok(terms)
    }
}
