//! Sokord - SEO keywords from video
//!
//! Turns the speech in a video into a ranked list of SEO keywords.
//!
//! # Overview
//!
//! A video goes through these stages:
//! - Extract the audio track with ffmpeg
//! - Transcribe it with OpenAI's speech-to-text API
//! - Summarize the transcript (Hugging Face BART or an OpenAI chat model)
//! - Take the most frequent non-stop-words of the summary as keywords
//! - Merge in caller-supplied seed keywords
//! - Rank every keyword by the engagement of matching YouTube videos
//! - Optionally look up "subclass of" terms for each keyword on Wikidata
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `audio` - ffmpeg/ffprobe wrappers
//! - `transcription` - Speech-to-text
//! - `summarization` - Abstractive summarization backends
//! - `keywords` - Frequency-based keyword extraction
//! - `ranking` - YouTube search and engagement scoring
//! - `enrichment` - Wikidata entity lookup and SPARQL taxonomy queries
//! - `orchestrator` - Pipeline coordination
//! - `cli` - Command line and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use sokord::config::Settings;
//! use sokord::orchestrator::{parse_seed_keywords, Orchestrator};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = Orchestrator::new(Settings::load()?)?;
//!
//!     let seeds = parse_seed_keywords("machine learning, AI");
//!     let output = orchestrator.run(Path::new("talk.mp4"), &seeds).await?;
//!     for score in &output.ranking.scores {
//!         println!("{:>6.1} {}", score.normalized_score, score.keyword);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod enrichment;
pub mod error;
mod http;
pub mod keywords;
pub mod openai;
pub mod orchestrator;
pub mod ranking;
pub mod summarization;
pub mod transcription;

pub use error::{Result, SokordError};
