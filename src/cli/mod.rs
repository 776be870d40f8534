//! CLI module for Sokord.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Sokord - SEO keywords from video
///
/// Transcribes a video, summarizes the speech, extracts keywords, ranks them
/// by YouTube engagement and enriches them with Wikidata taxonomy terms.
#[derive(Parser, Debug)]
#[command(name = "sokord")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SOKORD_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (default: server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default: server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Extract and rank keywords from a local video file
    Extract {
        /// Path to an .mp4, .avi, .mov or .mkv file
        video: String,

        /// Comma-separated seed keywords to merge in
        #[arg(short, long)]
        seeds: Option<String>,

        /// Also enrich ranked keywords with Wikidata
        #[arg(short, long)]
        enrich: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Rank keywords by YouTube engagement
    Rank {
        /// Keywords to rank
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Look up Wikidata taxonomy terms for keywords
    Enrich {
        /// Keywords to enrich
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "youtube.max_results")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "sokord", "-vv", "extract", "talk.mp4", "--seeds", "ai, nlp", "--enrich",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Extract { video, seeds, enrich, pretty } => {
                assert_eq!(video, "talk.mp4");
                assert_eq!(seeds.as_deref(), Some("ai, nlp"));
                assert!(enrich);
                assert!(!pretty);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rank_requires_keywords() {
        assert!(Cli::try_parse_from(["sokord", "rank"]).is_err());
    }
}
