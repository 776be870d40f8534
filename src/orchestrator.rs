//! Pipeline orchestrator for Sokord.
//!
//! Coordinates the whole process from audio extraction to ranking and
//! enrichment. Stages run one after another; nothing is persisted.

use crate::audio::{AudioExtractor, FfmpegExtractor};
use crate::config::{Prompts, Settings, SummarizationProvider};
use crate::enrichment::{associated_scores, Enricher, Enrichment, KnowledgeGraph, OrderedMap, WikidataClient};
use crate::error::Result;
use crate::keywords::KeywordExtractor;
use crate::ranking::{Ranking, SeoRanker, VideoSearch, YoutubeSearch};
use crate::summarization::{HuggingFaceSummarizer, OpenAISummarizer, Summarizer, SummaryParams};
use crate::transcription::{Transcriber, Transcript, WhisperTranscriber};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// External services used by the pipeline.
pub struct Components {
    pub extractor: Arc<dyn AudioExtractor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub summarizer: Arc<dyn Summarizer>,
    pub search: Arc<dyn VideoSearch>,
    pub graph: Arc<dyn KnowledgeGraph>,
}

impl Components {
    /// Build the production services described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(&settings.prompts)?;

        let summarizer: Arc<dyn Summarizer> = match settings.summarization.provider {
            SummarizationProvider::HuggingFace => {
                info!("Summarizing with Hugging Face model {}", settings.summarization.model);
                Arc::new(HuggingFaceSummarizer::from_settings(
                    &settings.summarization,
                    &settings.http,
                )?)
            }
            SummarizationProvider::OpenAI => {
                info!("Summarizing with OpenAI model {}", settings.summarization.model);
                Arc::new(OpenAISummarizer::from_settings(
                    &settings.summarization,
                    &settings.http,
                    prompts,
                )?)
            }
        };

        Ok(Self {
            extractor: Arc::new(FfmpegExtractor),
            transcriber: Arc::new(WhisperTranscriber::from_settings(
                &settings.transcription,
                &settings.http,
            )?),
            summarizer,
            search: Arc::new(YoutubeSearch::from_settings(&settings.youtube, &settings.http)?),
            graph: Arc::new(WikidataClient::from_settings(&settings.wikidata, &settings.http)?),
        })
    }
}

/// Keywords and their SEO ranking for one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineOutput {
    /// Union of extracted and seed keywords.
    pub keywords: Vec<String>,
    pub seed_keywords: Vec<String>,
    pub ranking: Ranking,
}

/// [`PipelineOutput`] plus knowledge-graph enrichment of the ranked keywords.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichedOutput {
    #[serde(flatten)]
    pub output: PipelineOutput,
    pub enrichment: Enrichment,
    pub associated_scores: OrderedMap<f64>,
}

/// The main orchestrator for the Sokord pipeline.
pub struct Orchestrator {
    settings: Settings,
    extractor: Arc<dyn AudioExtractor>,
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<dyn Summarizer>,
    summary_params: SummaryParams,
    keyword_extractor: KeywordExtractor,
    ranker: SeoRanker,
    enricher: Enricher,
}

impl Orchestrator {
    /// Create an orchestrator with the production services.
    pub fn new(settings: Settings) -> Result<Self> {
        let components = Components::from_settings(&settings)?;
        Ok(Self::with_components(settings, components))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(settings: Settings, components: Components) -> Self {
        let summary_params = SummaryParams::from(&settings.summarization);
        let keyword_extractor = KeywordExtractor::new(
            settings.keywords.max_keywords,
            &settings.keywords.extra_stop_words,
        );
        let ranker = SeoRanker::new(
            components.search,
            settings.youtube.max_results,
            settings.ranking.failure_policy,
        );
        let enricher = Enricher::new(components.graph, settings.enrichment.failure_policy);

        Self {
            settings,
            extractor: components.extractor,
            transcriber: components.transcriber,
            summarizer: components.summarizer,
            summary_params,
            keyword_extractor,
            ranker,
            enricher,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Create a fresh, uniquely named working directory for one request.
    pub fn request_dir(&self) -> Result<RequestDir> {
        RequestDir::create(&self.settings.upload_dir(), self.settings.general.keep_uploads)
    }

    /// Extract the audio of `video_path` next to it and transcribe it.
    #[instrument(skip(self), fields(video = %video_path.display()))]
    pub async fn transcribe_video(&self, video_path: &Path) -> Result<Transcript> {
        let work_dir = video_path.parent().unwrap_or_else(|| Path::new("."));

        info!("Extracting audio...");
        let audio_path = self.extractor.extract_audio(video_path, work_dir).await?;

        info!("Transcribing audio...");
        let transcript = self.transcriber.transcribe(&audio_path).await?;
        if let Transcript::Unrecognized = transcript {
            warn!("Speech not recognized, continuing with empty transcript");
        }
        Ok(transcript)
    }

    /// Summarize `text` and extract its most frequent keywords.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn keywords_from_text(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let summary = self.summarizer.summarize(text, &self.summary_params).await?;
        let keywords = self.keyword_extractor.extract(&summary);
        info!("Extracted {} keywords from summary", keywords.len());
        Ok(keywords)
    }

    /// Rank keywords by video search engagement.
    pub async fn rank(&self, keywords: &[String]) -> Result<Ranking> {
        self.ranker.rank(keywords).await
    }

    /// Look up taxonomy terms for keywords.
    pub async fn enrich(&self, keywords: &[String]) -> Result<Enrichment> {
        self.enricher.enrich(keywords).await
    }

    /// Transcribe, extract keywords, merge seeds and rank the union.
    #[instrument(skip(self, seed_keywords), fields(video = %video_path.display(), seeds = seed_keywords.len()))]
    pub async fn run(&self, video_path: &Path, seed_keywords: &[String]) -> Result<PipelineOutput> {
        let transcript = self.transcribe_video(video_path).await?;
        let extracted = self.keywords_from_text(transcript.text()).await?;

        let keywords = union_keywords(&extracted, seed_keywords);
        info!(
            "Ranking {} keywords ({} extracted, {} seeds)",
            keywords.len(),
            extracted.len(),
            seed_keywords.len()
        );
        let ranking = self.rank(&keywords).await?;

        Ok(PipelineOutput {
            keywords,
            seed_keywords: seed_keywords.to_vec(),
            ranking,
        })
    }

    /// [`run`](Self::run), then enrich the ranked keywords in ranking order.
    pub async fn run_with_enrichment(
        &self,
        video_path: &Path,
        seed_keywords: &[String],
    ) -> Result<EnrichedOutput> {
        let output = self.run(video_path, seed_keywords).await?;

        let ranked = output.ranking.keywords();
        let enrichment = self.enrich(&ranked).await?;
        let associated_scores = associated_scores(&output.ranking.scores, &enrichment.terms);

        Ok(EnrichedOutput {
            output,
            enrichment,
            associated_scores,
        })
    }
}

/// Merge extracted and seed keywords, dropping exact duplicates.
///
/// Extracted keywords come first, then seeds not already present; the first
/// occurrence of each keyword wins.
pub fn union_keywords(extracted: &[String], seeds: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    extracted
        .iter()
        .chain(seeds)
        .filter(|k| seen.insert(k.as_str()))
        .cloned()
        .collect()
}

/// Split a comma-separated seed string into trimmed, non-empty keywords.
pub fn parse_seed_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Per-request working directory under the upload directory.
///
/// Removed on drop unless uploads are kept.
#[derive(Debug)]
pub struct RequestDir {
    path: PathBuf,
    keep: bool,
}

impl RequestDir {
    /// Create `<root>/<uuid>`.
    pub fn create(root: &Path, keep: bool) -> Result<Self> {
        let path = root.join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(&path)?;
        Ok(Self { path, keep })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the directory after this guard is dropped.
    pub fn persist(&mut self) {
        self.keep = true;
    }

    /// Remove the directory on the blocking pool and wait for it.
    pub async fn close(mut self) {
        if let Some(path) = self.take_for_removal() {
            if let Err(e) = tokio::task::spawn_blocking(move || remove_request_dir(&path)).await {
                warn!("Cleanup task failed: {}", e);
            }
        }
    }

    /// The path to delete, once. `None` when kept or already taken.
    fn take_for_removal(&mut self) -> Option<PathBuf> {
        if self.keep || self.path.as_os_str().is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.path))
    }
}

impl Drop for RequestDir {
    fn drop(&mut self) {
        let Some(path) = self.take_for_removal() else {
            return;
        };
        // Off the async workers when dropped inside a runtime.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_request_dir(&path));
            }
            Err(_) => remove_request_dir(&path),
        }
    }
}

fn remove_request_dir(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path) {
        warn!("Failed to clean up {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;
    use crate::enrichment::EntityId;
    use crate::error::SokordError;
    use crate::ranking::VideoMetadata;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeExtractor;

    #[async_trait]
    impl AudioExtractor for FakeExtractor {
        async fn extract_audio(&self, video_path: &Path, output_dir: &Path) -> Result<PathBuf> {
            Ok(output_dir.join(video_path.with_extension("wav").file_name().unwrap()))
        }
    }

    struct FakeTranscriber(Transcript);

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<Transcript> {
            Ok(self.0.clone())
        }
    }

    /// Echoes the input, truncated to `max_length` words.
    #[derive(Default)]
    struct EchoSummarizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text
                .split_whitespace()
                .take(params.max_length as usize)
                .collect::<Vec<_>>()
                .join(" "))
        }
    }

    /// Every keyword gets one video titled with the keyword and `len * 10` views.
    struct LengthSearch;

    #[async_trait]
    impl VideoSearch for LengthSearch {
        async fn search(&self, keyword: &str, _max_results: u32) -> Result<Vec<VideoMetadata>> {
            Ok(vec![VideoMetadata {
                video_id: "v".into(),
                title: keyword.to_uppercase(),
                description: String::new(),
                view_count: keyword.len() as u64 * 10,
                like_count: 0,
                comment_count: 0,
            }])
        }
    }

    struct RustOnlyGraph;

    #[async_trait]
    impl KnowledgeGraph for RustOnlyGraph {
        async fn find_entity(&self, keyword: &str) -> Result<Option<EntityId>> {
            if keyword == "rust" {
                return EntityId::parse("Q575650").map(Some);
            }
            Ok(None)
        }

        async fn query_associated_terms(&self, _entity: &EntityId) -> Result<Vec<String>> {
            Ok(vec!["programming language".into(), "software".into()])
        }
    }

    struct DownSearch;

    #[async_trait]
    impl VideoSearch for DownSearch {
        async fn search(&self, _keyword: &str, _max_results: u32) -> Result<Vec<VideoMetadata>> {
            Err(SokordError::SearchUnavailable("403 quotaExceeded".into()))
        }
    }

    fn orchestrator_with(
        transcript: Transcript,
        summarizer: Arc<EchoSummarizer>,
        search: Arc<dyn VideoSearch>,
        settings: Settings,
    ) -> Orchestrator {
        Orchestrator::with_components(
            settings,
            Components {
                extractor: Arc::new(FakeExtractor),
                transcriber: Arc::new(FakeTranscriber(transcript)),
                summarizer,
                search,
                graph: Arc::new(RustOnlyGraph),
            },
        )
    }

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_union_has_no_duplicates() {
        let merged = union_keywords(
            &strings(&["rust", "memory", "safety"]),
            &strings(&["Rust", "rust", "NLP", "safety", "NLP"]),
        );
        assert_eq!(merged, strings(&["rust", "memory", "safety", "Rust", "NLP"]));
    }

    #[test]
    fn test_parse_seed_keywords() {
        assert_eq!(
            parse_seed_keywords(" artificial intelligence, deep learning,,NLP , "),
            strings(&["artificial intelligence", "deep learning", "NLP"])
        );
        assert!(parse_seed_keywords("").is_empty());
        assert!(parse_seed_keywords(" , ,").is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_speech_and_no_seeds_is_empty() {
        let summarizer = Arc::new(EchoSummarizer::default());
        let orchestrator = orchestrator_with(
            Transcript::Unrecognized,
            summarizer.clone(),
            Arc::new(LengthSearch),
            Settings::default(),
        );

        let output = orchestrator.run(Path::new("/tmp/req/clip.mp4"), &[]).await.unwrap();
        assert!(output.keywords.is_empty());
        assert!(output.ranking.is_empty());
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_merges_and_ranks() {
        let orchestrator = orchestrator_with(
            Transcript::Recognized("Rust makes systems programming safe. Rust is fast.".into()),
            Arc::new(EchoSummarizer::default()),
            Arc::new(LengthSearch),
            Settings::default(),
        );

        let seeds = strings(&["rust", "deep learning"]);
        let output = orchestrator.run(Path::new("/tmp/req/clip.mp4"), &seeds).await.unwrap();

        assert_eq!(
            output.keywords,
            strings(&["rust", "makes", "systems", "programming", "safe", "fast", "deep learning"])
        );
        assert_eq!(output.seed_keywords, seeds);
        assert_eq!(output.ranking.scores.len(), output.keywords.len());
        assert_eq!(output.ranking.scores[0].keyword, "deep learning");
        assert!(output
            .ranking
            .scores
            .windows(2)
            .all(|w| w[0].normalized_score >= w[1].normalized_score));
    }

    #[tokio::test]
    async fn test_run_with_enrichment_covers_ranked_keywords() {
        let orchestrator = orchestrator_with(
            Transcript::Recognized("rust rust borrow".into()),
            Arc::new(EchoSummarizer::default()),
            Arc::new(LengthSearch),
            Settings::default(),
        );

        let enriched = orchestrator
            .run_with_enrichment(Path::new("/tmp/req/clip.mp4"), &[])
            .await
            .unwrap();

        let ranked = enriched.output.ranking.keywords();
        assert_eq!(enriched.enrichment.terms.keys().collect::<Vec<_>>(), ranked);
        assert_eq!(
            enriched.enrichment.terms.get("rust").unwrap(),
            &strings(&["programming language", "software"])
        );
        // rust: 40 views vs borrow: 60 views
        let rust_score = enriched.output.ranking.scores.iter().find(|s| s.keyword == "rust").unwrap();
        let share = rust_score.normalized_score / 2.0;
        assert!((enriched.associated_scores.get("software").unwrap() - share).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_search_outage_respects_policy() {
        let mut settings = Settings::default();
        settings.ranking.failure_policy = FailurePolicy::Abort;
        let orchestrator = orchestrator_with(
            Transcript::Recognized("rust".into()),
            Arc::new(EchoSummarizer::default()),
            Arc::new(DownSearch),
            settings,
        );
        let result = orchestrator.run(Path::new("/tmp/req/clip.mp4"), &[]).await;
        assert!(matches!(result, Err(SokordError::SearchUnavailable(_))));

        let orchestrator = orchestrator_with(
            Transcript::Recognized("rust".into()),
            Arc::new(EchoSummarizer::default()),
            Arc::new(DownSearch),
            Settings::default(),
        );
        let output = orchestrator.run(Path::new("/tmp/req/clip.mp4"), &[]).await.unwrap();
        assert!(output.ranking.scores.is_empty());
        assert_eq!(output.ranking.failures.len(), 1);
    }

    #[test]
    fn test_request_dirs_are_unique_and_cleaned_up() {
        let root = tempfile::tempdir().unwrap();

        let first = RequestDir::create(root.path(), false).unwrap();
        let second = RequestDir::create(root.path(), false).unwrap();
        assert_ne!(first.path(), second.path());

        let first_path = first.path().to_path_buf();
        drop(first);
        assert!(!first_path.exists());

        let mut kept = RequestDir::create(root.path(), false).unwrap();
        kept.persist();
        let kept_path = kept.path().to_path_buf();
        drop(kept);
        assert!(kept_path.exists());
    }

    #[tokio::test]
    async fn test_request_dir_close_removes_off_the_runtime() {
        let root = tempfile::tempdir().unwrap();
        let dir = RequestDir::create(root.path(), false).unwrap();
        let path = dir.path().to_path_buf();
        std::fs::write(path.join("clip.mp4"), vec![0u8; 4096]).unwrap();

        dir.close().await;
        assert!(!path.exists());

        let mut kept = RequestDir::create(root.path(), false).unwrap();
        kept.persist();
        let kept_path = kept.path().to_path_buf();
        kept.close().await;
        assert!(kept_path.exists());
    }

    #[tokio::test]
    async fn test_request_dir_drop_inside_runtime_still_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let dir = RequestDir::create(root.path(), false).unwrap();
        let path = dir.path().to_path_buf();
        drop(dir);

        for _ in 0..100 {
            if !path.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!path.exists());
    }
}
