//! Lightweight text analysis over the loaded document set.
//!
//! Everything here is read-only: the functions take `&[DocumentRecord]` and
//! return plain data for the CLI tables and the HTTP JSON responses.
//!
//! - [`summary`]: document and word counts.
//! - [`word_frequencies`]: most frequent terms after stop-word removal.
//! - [`sentiment`] / [`sentiment_distribution`]: lexicon polarity.
//! - [`themes`]: documents grouped under the most frequent terms.

use qualcode_core::DocumentRecord;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::config::AnalysisConfig;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "can't", "cannot", "could", "couldn't", "did", "didn't", "do",
    "does", "doesn't", "doing", "don't", "down", "during", "each", "even", "few", "for", "from",
    "further", "get", "got", "had", "hadn't", "has", "hasn't", "have", "haven't", "having", "he",
    "her", "here", "hers", "herself", "him", "himself", "his", "how", "i", "i'm", "i've", "if",
    "in", "into", "is", "isn't", "it", "it's", "its", "itself", "just", "let's", "me", "more",
    "most", "much", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "really", "same", "she",
    "should", "so", "some", "such", "than", "that", "that's", "the", "their", "theirs", "them",
    "themselves", "then", "there", "there's", "these", "they", "they're", "this", "those",
    "through", "to", "too", "under", "until", "up", "us", "very", "was", "wasn't", "we", "we're",
    "were", "weren't", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
    "with", "won't", "would", "wouldn't", "you", "you're", "your", "yours", "yourself",
    "yourselves",
];

const POSITIVE_WORDS: &[&str] = &[
    "amazing", "appreciate", "awesome", "best", "better", "clean", "clear", "comfortable",
    "easy", "efficient", "enjoy", "enjoyed", "excellent", "fantastic", "fast", "friendly",
    "glad", "good", "great", "happy", "helpful", "impressed", "improved", "improvement", "like",
    "liked", "love", "loved", "nice", "perfect", "pleasant", "pleased", "quick", "recommend",
    "reliable", "satisfied", "smooth", "success", "superb", "thank", "thanks", "useful",
    "wonderful", "worth",
];

const NEGATIVE_WORDS: &[&str] = &[
    "angry", "annoying", "awful", "bad", "broken", "bug", "buggy", "complicated", "confusing",
    "crash", "delay", "delayed", "difficult", "disappointed", "disappointing", "dislike", "fail",
    "failed", "frustrated", "frustrating", "hard", "hate", "horrible", "issue", "lost", "poor",
    "problem", "rude", "sad", "slow", "terrible", "unhappy", "unreliable", "upset", "useless",
    "waste", "worse", "worst", "wrong",
];

const NEGATORS: &[&str] = &["not", "no", "never", "nothing", "hardly"];

/// Polarity magnitude below which a document is classed as neutral.
const NEUTRAL_BAND: f64 = 0.05;

/// Tokenizer settings derived from `[analysis]`.
#[derive(Debug, Clone)]
pub struct TokenOptions {
    pub min_word_len: usize,
    stopwords: HashSet<String>,
}

impl TokenOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let mut stopwords: HashSet<String> = STOP_WORDS.iter().map(|s| s.to_string()).collect();
        stopwords.extend(config.extra_stopwords.iter().map(|s| s.to_lowercase()));
        Self {
            min_word_len: config.min_word_len,
            stopwords,
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// Lowercased words of `text`, split on anything that is not alphanumeric
/// or an apostrophe, before any filtering.
fn raw_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|w| {
            w.trim_matches(|c: char| c == '\'' || c == '\u{2019}')
                .replace('\u{2019}', "'")
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
}

/// Content terms of `text`: stop words, numbers, and short words removed.
pub fn tokenize(text: &str, opts: &TokenOptions) -> Vec<String> {
    raw_words(text)
        .filter(|w| w.chars().count() >= opts.min_word_len)
        .filter(|w| !w.chars().all(|c| c.is_numeric()))
        .filter(|w| !opts.is_stopword(w))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusSummary {
    pub documents: usize,
    pub total_words: usize,
    pub unique_terms: usize,
    pub avg_words_per_document: f64,
    pub min_words: usize,
    pub max_words: usize,
}

pub fn summary(docs: &[DocumentRecord], opts: &TokenOptions) -> CorpusSummary {
    let lengths: Vec<usize> = docs
        .iter()
        .map(|d| d.text.split_whitespace().count())
        .collect();
    let total_words: usize = lengths.iter().sum();
    let unique_terms = docs
        .iter()
        .flat_map(|d| tokenize(&d.text, opts))
        .collect::<HashSet<_>>()
        .len();

    CorpusSummary {
        documents: docs.len(),
        total_words,
        unique_terms,
        avg_words_per_document: if docs.is_empty() {
            0.0
        } else {
            total_words as f64 / docs.len() as f64
        },
        min_words: lengths.iter().copied().min().unwrap_or(0),
        max_words: lengths.iter().copied().max().unwrap_or(0),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// The `top_n` most frequent terms, by count descending then term ascending.
pub fn word_frequencies(docs: &[DocumentRecord], opts: &TokenOptions, top_n: usize) -> Vec<TermCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for doc in docs {
        for term in tokenize(&doc.text, opts) {
            *counts.entry(term).or_insert(0) += 1;
        }
    }
    let mut terms: Vec<TermCount> = counts
        .into_iter()
        .map(|(term, count)| TermCount { term, count })
        .collect();
    terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    terms.truncate(top_n);
    terms
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentScore {
    /// In `[-1.0, 1.0]`; 0.0 when no lexicon word occurs.
    pub polarity: f64,
    pub label: SentimentLabel,
}

/// Lexicon polarity of `text`. A negator directly before a lexicon word
/// flips that word's sign.
pub fn sentiment(text: &str) -> SentimentScore {
    let mut positive = 0usize;
    let mut negative = 0usize;
    let mut negate = false;

    for word in raw_words(text) {
        let hit = if POSITIVE_WORDS.contains(&word.as_str()) {
            Some(true)
        } else if NEGATIVE_WORDS.contains(&word.as_str()) {
            Some(false)
        } else {
            None
        };

        match hit {
            Some(is_positive) if is_positive != negate => positive += 1,
            Some(_) => negative += 1,
            None => {}
        }
        negate = NEGATORS.contains(&word.as_str()) || word.ends_with("n't");
    }

    let hits = positive + negative;
    let polarity = if hits == 0 {
        0.0
    } else {
        (positive as f64 - negative as f64) / hits as f64
    };
    let label = if polarity > NEUTRAL_BAND {
        SentimentLabel::Positive
    } else if polarity < -NEUTRAL_BAND {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };
    SentimentScore { polarity, label }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub mean_polarity: f64,
}

pub fn sentiment_distribution(docs: &[DocumentRecord]) -> SentimentDistribution {
    let mut dist = SentimentDistribution {
        positive: 0,
        neutral: 0,
        negative: 0,
        mean_polarity: 0.0,
    };
    let mut total = 0.0;
    for doc in docs {
        let score = sentiment(&doc.text);
        total += score.polarity;
        match score.label {
            SentimentLabel::Positive => dist.positive += 1,
            SentimentLabel::Neutral => dist.neutral += 1,
            SentimentLabel::Negative => dist.negative += 1,
        }
    }
    if !docs.is_empty() {
        dist.mean_polarity = total / docs.len() as f64;
    }
    dist
}

/// A frequent term and the documents that mention it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub keyword: String,
    pub occurrences: usize,
    pub document_ids: Vec<usize>,
}

pub fn themes(docs: &[DocumentRecord], opts: &TokenOptions, top_n: usize) -> Vec<Theme> {
    let per_doc: Vec<HashSet<String>> = docs
        .iter()
        .map(|d| tokenize(&d.text, opts).into_iter().collect())
        .collect();

    word_frequencies(docs, opts, top_n)
        .into_iter()
        .map(|tc| {
            let document_ids = docs
                .iter()
                .zip(&per_doc)
                .filter(|(_, terms)| terms.contains(&tc.term))
                .map(|(d, _)| d.index)
                .collect();
            Theme {
                keyword: tc.term,
                occurrences: tc.count,
                document_ids,
            }
        })
        .collect()
}
