//! Knowledge-graph enrichment of ranked keywords.
//!
//! Every keyword gets an entry, even when no entity matches or the lookup
//! fails under [`FailurePolicy::Isolate`]; in those cases the entry is empty.

mod wikidata;

pub use wikidata::WikidataClient;

use crate::config::FailurePolicy;
use crate::error::{Result, SokordError};
use crate::ranking::{KeywordFailure, KeywordScore};
use async_trait::async_trait;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A validated knowledge-graph entity id such as `Q11660`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityId(String);

impl EntityId {
    /// Parse an id of the form `Q123`, `P123` or `L123`.
    pub fn parse(id: &str) -> Result<Self> {
        let mut chars = id.chars();
        let valid = matches!(chars.next(), Some('Q' | 'P' | 'L'))
            && id.len() > 1
            && chars.all(|c| c.is_ascii_digit());
        if valid {
            Ok(Self(id.to_string()))
        } else {
            Err(SokordError::EnrichmentUnavailable(format!(
                "invalid entity id: {id:?}"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insertion-ordered string-keyed map that serializes as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Callers guarantee keys are unique.
    pub fn push(&mut self, key: String, value: V) {
        self.0.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

/// Keyword → associated taxonomy labels, in keyword input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Enrichment {
    pub terms: OrderedMap<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<KeywordFailure>,
}

/// Trait for knowledge-graph services.
#[async_trait]
pub trait KnowledgeGraph: Send + Sync {
    /// Find the best-matching entity for `keyword`, or `None` when nothing matches.
    async fn find_entity(&self, keyword: &str) -> Result<Option<EntityId>>;

    /// Labels of the entity's "subclass of" values, in the order the service returns them.
    async fn query_associated_terms(&self, entity: &EntityId) -> Result<Vec<String>>;
}

/// Runs [`KnowledgeGraph`] lookups over a keyword batch.
pub struct Enricher {
    graph: Arc<dyn KnowledgeGraph>,
    policy: FailurePolicy,
}

impl Enricher {
    pub fn new(graph: Arc<dyn KnowledgeGraph>, policy: FailurePolicy) -> Self {
        Self { graph, policy }
    }

    /// Enrich each keyword independently, one at a time.
    #[instrument(skip(self, keywords), fields(count = keywords.len(), policy = %self.policy))]
    pub async fn enrich(&self, keywords: &[String]) -> Result<Enrichment> {
        let mut enrichment = Enrichment::default();

        for keyword in keywords {
            if enrichment.terms.get(keyword).is_some() {
                continue;
            }

            match self.lookup(keyword).await {
                Ok(terms) => enrichment.terms.push(keyword.clone(), terms),
                Err(e) if self.policy == FailurePolicy::Isolate => {
                    warn!("Enrichment failed for '{}': {}", keyword, e);
                    enrichment.terms.push(keyword.clone(), Vec::new());
                    enrichment.failures.push(KeywordFailure {
                        keyword: keyword.clone(),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Enriched {} keywords ({} failed)",
            enrichment.terms.len(),
            enrichment.failures.len()
        );
        Ok(enrichment)
    }

    async fn lookup(&self, keyword: &str) -> Result<Vec<String>> {
        match self.graph.find_entity(keyword).await? {
            Some(entity) => {
                let terms = self.graph.query_associated_terms(&entity).await?;
                debug!("{} -> {} ({} terms)", keyword, entity, terms.len());
                Ok(terms)
            }
            None => {
                debug!("No entity found for '{}'", keyword);
                Ok(Vec::new())
            }
        }
    }
}

/// Spread each ranked keyword's normalized score evenly over its associated
/// terms and sum per term. Terms appear in first-seen order.
pub fn associated_scores(
    ranking: &[KeywordScore],
    terms: &OrderedMap<Vec<String>>,
) -> OrderedMap<f64> {
    let mut scores = OrderedMap::new();

    for score in ranking {
        let Some(associations) = terms.get(&score.keyword) else {
            continue;
        };
        if associations.is_empty() {
            continue;
        }

        let share = score.normalized_score / associations.len() as f64;
        for term in associations {
            match scores.get_mut(term) {
                Some(total) => *total += share,
                None => scores.push(term.clone(), share),
            }
        }
    }

    scores
}
