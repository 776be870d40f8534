//! Keyword extraction from summarized text.
//!
//! Policy: lowercase the text, split it into word tokens, keep purely
//! alphabetic tokens that are not stop words, count them, and return the most
//! frequent ones. Ties keep first-occurrence order.

mod stopwords;

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Default number of keywords returned by [`extract_keywords`].
pub const DEFAULT_MAX_KEYWORDS: usize = 12;

/// Word tokens. Period-joined abbreviations (`u.s.`, `e.g.`) are matched first
/// and stay one token, as do words with internal apostrophes or hyphens. Both
/// are then rejected as non-alphabetic.
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+(?:\.\w+)+\.?|\w+(?:['’\-]\w+)*").expect("valid word regex")
});

/// Fused words the Treebank tokenizer splits in two, with the split offset.
const FUSED_WORDS: &[(&str, usize)] = &[
    ("cannot", 3),
    ("gimme", 3),
    ("gonna", 3),
    ("gotta", 3),
    ("lemme", 3),
    ("wanna", 3),
];

/// Frequency-based keyword extractor with a configurable stop-word set.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    stop_words: HashSet<String>,
    max_keywords: usize,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_KEYWORDS, &[])
    }
}

impl KeywordExtractor {
    /// Create an extractor returning at most `max_keywords`, with extra stop words
    /// added to the English list.
    pub fn new(max_keywords: usize, extra_stop_words: &[String]) -> Self {
        let mut stop_words: HashSet<String> =
            stopwords::ENGLISH.iter().map(|w| w.to_string()).collect();
        stop_words.extend(extra_stop_words.iter().map(|w| w.trim().to_lowercase()));

        Self {
            stop_words,
            max_keywords,
        }
    }

    /// Check whether `word` is a stop word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Extract the most frequent keywords from `text`.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();

        // (count, first position) per candidate
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (position, token) in tokenize(&lowered).enumerate() {
            if !is_alphabetic(token) || self.stop_words.contains(token) {
                continue;
            }
            counts
                .entry(token)
                .and_modify(|(count, _)| *count += 1)
                .or_insert((1, position));
        }

        let mut ranked: Vec<(&str, usize, usize)> = counts
            .into_iter()
            .map(|(word, (count, first))| (word, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        ranked
            .into_iter()
            .take(self.max_keywords)
            .map(|(word, _, _)| word.to_string())
            .collect()
    }
}

/// Extract up to 12 keywords using the default English stop words.
pub fn extract_keywords(summary: &str) -> Vec<String> {
    KeywordExtractor::default().extract(summary)
}

/// Split lowercased text into word tokens.
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    WORD_RE.find_iter(text).flat_map(|m| split_fused(m.as_str()))
}

fn split_fused(token: &str) -> impl Iterator<Item = &str> {
    let (head, tail) = match FUSED_WORDS.iter().find(|(word, _)| *word == token) {
        Some(&(_, at)) => (&token[..at], Some(&token[at..])),
        None => (token, None),
    };
    std::iter::once(head).chain(tail)
}

fn is_alphabetic(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_by_frequency_then_first_occurrence() {
        let text = "Rust compilers love Rust. Compilers check borrows; rust wins. Borrows!";
        let keywords = extract_keywords(text);
        assert_eq!(keywords, vec!["rust", "compilers", "borrows", "love", "check", "wins"]);
    }

    #[test]
    fn test_never_more_than_twelve() {
        let text = (0..40)
            .map(|i| format!("word{} alpha{}", i, "x".repeat(i % 5)))
            .collect::<Vec<_>>()
            .join(" ");
        let words: String = ('a'..='z')
            .map(|c| format!("{c}{c}{c}{c} "))
            .collect();

        assert!(extract_keywords(&format!("{text} {words}")).len() <= 12);
        assert_eq!(extract_keywords(&words).len(), 12);
    }

    #[test]
    fn test_filters_stop_words_and_non_alphabetic() {
        let text = "The 3 models can't run on GPU-4 but the models run in 2024, it's fine";
        let keywords = extract_keywords(text);

        assert_eq!(keywords, vec!["models", "run", "fine"]);
        let extractor = KeywordExtractor::default();
        for keyword in &keywords {
            assert!(!extractor.is_stop_word(keyword));
            assert!(keyword.chars().all(char::is_alphabetic));
        }
    }

    #[test]
    fn test_abbreviations_and_fused_words() {
        let text = "The U.S. economy cannot grow. U.S. officials said the economy cannot recover.";
        assert_eq!(
            extract_keywords(text),
            vec!["economy", "grow", "officials", "said", "recover"]
        );
    }

    #[test]
    fn test_tokenize_splits_fused_words() {
        let tokens: Vec<&str> = tokenize("we cannot stop, gonna try e.g. this").collect();
        assert_eq!(tokens, vec!["we", "can", "not", "stop", "gon", "na", "try", "e.g.", "this"]);
    }

    #[test]
    fn test_lowercases_tokens() {
        assert_eq!(extract_keywords("Neural NEURAL neural Networks"), vec!["neural", "networks"]);
    }

    #[test]
    fn test_empty_and_blank_text() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   \n ").is_empty());
        assert!(extract_keywords("the and of 42").is_empty());
    }

    #[test]
    fn test_extra_stop_words_and_limit() {
        let extractor = KeywordExtractor::new(2, &["Video".to_string()]);
        let keywords = extractor.extract("video video editing editing editing color grading");
        assert_eq!(keywords, vec!["editing", "color"]);
    }

    #[test]
    fn test_unicode_letters_are_alphabetic() {
        assert_eq!(extract_keywords("café café naïve"), vec!["café", "naïve"]);
    }
}
