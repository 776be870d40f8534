//! Contract tests for the external HTTP services.
//!
//! Each client is pointed at a wiremock server to check the exact request it
//! sends and how it maps responses and failures.

use serde_json::json;
use sokord::config::FailurePolicy;
use sokord::enrichment::{Enricher, EntityId, KnowledgeGraph, WikidataClient};
use sokord::ranking::{SeoRanker, VideoSearch, YoutubeSearch};
use sokord::summarization::{HuggingFaceSummarizer, Summarizer, SummaryParams};
use sokord::SokordError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

// ────────────────────────────────────────────────────────────────────────────
// YouTube Data API
// ────────────────────────────────────────────────────────────────────────────

async fn mount_youtube_search(server: &MockServer, keyword: &str, ids: &[&str]) {
    let items: Vec<_> = ids.iter().map(|id| json!({"id": {"kind": "youtube#video", "videoId": id}})).collect();
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("part", "id,snippet"))
        .and(query_param("type", "video"))
        .and(query_param("maxResults", "5"))
        .and(query_param("q", keyword))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_youtube_search_then_video_details() {
    let server = MockServer::start().await;
    mount_youtube_search(&server, "ai", &["v1", "v2"]).await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("part", "snippet,statistics"))
        .and(query_param("id", "v1,v2"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "v1",
                    "snippet": {"title": "Intro to AI", "description": "nothing here"},
                    "statistics": {"viewCount": "100", "likeCount": "5", "commentCount": "2"}
                },
                {
                    "id": "v2",
                    "snippet": {"title": "Cooking pasta", "description": "dinner"},
                    "statistics": {"viewCount": "9000"}
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search = YoutubeSearch::new(&server.uri(), "test-key", TIMEOUT).unwrap();
    let videos = search.search("ai", 5).await.unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].engagement(), 107);
    assert_eq!(videos[1].like_count, 0);
    assert_eq!(videos[1].engagement(), 9000);
}

#[tokio::test]
async fn test_youtube_relevance_scenario() {
    let server = MockServer::start().await;
    mount_youtube_search(&server, "ai", &["v1"]).await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "v1",
                "snippet": {"title": "Intro to AI", "description": "nothing here"},
                "statistics": {"viewCount": "100", "likeCount": "5", "commentCount": "2"}
            }]
        })))
        .mount(&server)
        .await;

    let search = YoutubeSearch::new(&server.uri(), "test-key", TIMEOUT).unwrap();
    let ranker = SeoRanker::new(Arc::new(search), 5, FailurePolicy::Abort);
    let ranking = ranker.rank(&["ai".to_string()]).await.unwrap();

    assert_eq!(ranking.scores.len(), 1);
    assert_eq!(ranking.scores[0].raw_score, 107);
    assert!((ranking.scores[0].normalized_score - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_youtube_no_results_skips_details_call() {
    let server = MockServer::start().await;
    mount_youtube_search(&server, "zzzz", &[]).await;
    Mock::given(path("/videos"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let search = YoutubeSearch::new(&server.uri(), "test-key", TIMEOUT).unwrap();
    assert!(search.search("zzzz", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_youtube_quota_error_maps_to_search_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "quotaExceeded"}
        })))
        .mount(&server)
        .await;

    let search = Arc::new(YoutubeSearch::new(&server.uri(), "test-key", TIMEOUT).unwrap());
    let err = search.search("ai", 5).await.unwrap_err();
    assert!(matches!(err, SokordError::SearchUnavailable(ref msg) if msg.contains("403")));
    // The API key must not leak into error messages.
    assert!(!err.to_string().contains("test-key"));

    let isolated = SeoRanker::new(search.clone(), 5, FailurePolicy::Isolate)
        .rank(&["ai".to_string(), "rust".to_string()])
        .await
        .unwrap();
    assert!(isolated.scores.is_empty());
    assert_eq!(isolated.failures.len(), 2);
    assert_eq!(isolated.failures[0].keyword, "ai");

    let aborted = SeoRanker::new(search, 5, FailurePolicy::Abort)
        .rank(&["ai".to_string()])
        .await;
    assert!(matches!(aborted, Err(SokordError::SearchUnavailable(_))));
}

// ────────────────────────────────────────────────────────────────────────────
// Wikidata
// ────────────────────────────────────────────────────────────────────────────

fn wikidata(server: &MockServer) -> WikidataClient {
    WikidataClient::new(
        &format!("{}/w/api.php", server.uri()),
        &format!("{}/sparql", server.uri()),
        "en",
        "sokord-test/0.1 (https://example.org)",
        TIMEOUT,
    )
    .unwrap()
}

#[tokio::test]
async fn test_wikidata_entity_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "wbsearchentities"))
        .and(query_param("format", "json"))
        .and(query_param("language", "en"))
        .and(query_param("search", "machine learning"))
        .and(header("user-agent", "sokord-test/0.1 (https://example.org)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "search": [{"id": "Q2539", "label": "machine learning"}, {"id": "Q1", "label": "other"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entity = wikidata(&server).find_entity("machine learning").await.unwrap();
    assert_eq!(entity, Some(EntityId::parse("Q2539").unwrap()));
}

#[tokio::test]
async fn test_wikidata_sparql_keeps_subclass_terms() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .and(query_param("format", "json"))
        .and(header("accept", "application/sparql-results+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "head": {"vars": ["property", "propertyLabel", "value", "valueLabel"]},
            "results": {"bindings": [
                {"property": {"type": "uri", "value": "http://www.wikidata.org/entity/P31"},
                 "propertyLabel": {"type": "literal", "value": "instance of"},
                 "valueLabel": {"type": "literal", "value": "academic discipline"}},
                {"property": {"type": "uri", "value": "http://www.wikidata.org/entity/P279"},
                 "propertyLabel": {"type": "literal", "value": "subclass of"},
                 "valueLabel": {"type": "literal", "value": "artificial intelligence"}},
                {"property": {"type": "uri", "value": "http://www.wikidata.org/entity/P279"},
                 "propertyLabel": {"type": "literal", "value": "subclass of"},
                 "valueLabel": {"type": "literal", "value": "computer science"}}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let terms = wikidata(&server)
        .query_associated_terms(&EntityId::parse("Q2539").unwrap())
        .await
        .unwrap();
    assert_eq!(terms, vec!["artificial intelligence", "computer science"]);
}

#[tokio::test]
async fn test_enricher_covers_every_keyword() {
    let server = MockServer::start().await;
    Mock::given(path("/w/api.php"))
        .and(query_param("search", "machine learning"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"search": [{"id": "Q2539"}]})))
        .mount(&server)
        .await;
    Mock::given(path("/w/api.php"))
        .and(query_param("search", "qwxz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"search": []})))
        .mount(&server)
        .await;
    Mock::given(path("/w/api.php"))
        .and(query_param("search", "broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream timeout"))
        .mount(&server)
        .await;
    Mock::given(path("/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {"bindings": [
                {"property": {"value": "http://www.wikidata.org/entity/P279"},
                 "propertyLabel": {"value": "subclass of"},
                 "valueLabel": {"value": "artificial intelligence"}}
            ]}
        })))
        .mount(&server)
        .await;

    let keywords: Vec<String> = ["machine learning", "qwxz", "broken"].iter().map(|s| s.to_string()).collect();
    let enrichment = Enricher::new(Arc::new(wikidata(&server)), FailurePolicy::Isolate)
        .enrich(&keywords)
        .await
        .unwrap();

    assert_eq!(enrichment.terms.len(), 3);
    assert_eq!(
        enrichment.terms.get("machine learning").unwrap(),
        &vec!["artificial intelligence".to_string()]
    );
    assert!(enrichment.terms.get("qwxz").unwrap().is_empty());
    assert!(enrichment.terms.get("broken").unwrap().is_empty());
    assert_eq!(enrichment.failures.len(), 1);
    assert_eq!(enrichment.failures[0].keyword, "broken");

    let aborted = Enricher::new(Arc::new(wikidata(&server)), FailurePolicy::Abort)
        .enrich(&keywords)
        .await;
    assert!(matches!(aborted, Err(SokordError::EnrichmentUnavailable(_))));
}

// ────────────────────────────────────────────────────────────────────────────
// Hugging Face Inference
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_huggingface_request_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/facebook/bart-large-cnn"))
        .and(header("authorization", "Bearer hf_test"))
        .and(body_partial_json(json!({
            "inputs": "summarize: Rust is a systems language. It is memory safe.",
            "parameters": {
                "max_length": 130,
                "min_length": 30,
                "num_beams": 4,
                "length_penalty": 2.0,
                "early_stopping": true
            },
            "options": {"wait_for_model": true}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"summary_text": " Rust is a memory safe systems language. "}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let summarizer = HuggingFaceSummarizer::new(
        &server.uri(),
        "facebook/bart-large-cnn",
        Some("hf_test".to_string()),
        TIMEOUT,
    )
    .unwrap();

    let summary = summarizer
        .summarize(
            "Rust is a systems language. It is memory safe.",
            &SummaryParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(summary, "Rust is a memory safe systems language.");
}

#[tokio::test]
async fn test_huggingface_errors_and_blank_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "Model facebook/bart-large-cnn is currently loading"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let summarizer =
        HuggingFaceSummarizer::new(&server.uri(), "facebook/bart-large-cnn", None, TIMEOUT).unwrap();

    // Blank input never reaches the API.
    assert_eq!(summarizer.summarize("  \n", &SummaryParams::default()).await.unwrap(), "");

    let err = summarizer
        .summarize("some speech", &SummaryParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SokordError::Summarization(ref msg) if msg.contains("503")));
}
