use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lemma::lemmatize;

/// NLTK's English stop-word list.
pub const ENGLISH_STOP_WORDS: [&str; 179] = [
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Retweet markers and link fragments left behind once punctuation is gone.
pub const SOCIAL_TOKENS: [&str; 4] = ["rt", "http", "https", "co"];

static NON_ALPHANUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Cleans raw text into space separated lowercase base forms.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stop_words: HashSet<String>,
    strip_social_tokens: bool,
    min_len: usize,
}

impl Normalizer {
    /// Normalizer for tweets: also drops retweet and link tokens.
    pub fn social() -> Self {
        Self {
            stop_words: ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            strip_social_tokens: true,
            min_len: 2,
        }
    }

    /// Normalizer for plain prose such as review phrases.
    pub fn plain() -> Self {
        Self {
            strip_social_tokens: false,
            ..Self::social()
        }
    }

    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn normalize(&self, text: &str) -> String {
        let replaced = NON_ALPHANUMERIC_RE.replace_all(text, " ");
        let lowered = replaced.to_lowercase();

        lowered
            .split_whitespace()
            .filter(|token| self.keep(token))
            .map(lemmatize)
            // a lemma can land on a dropped token (`cos` -> `co`)
            .filter(|lemma| self.keep(lemma))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn keep(&self, token: &str) -> bool {
        if token.len() < self.min_len || self.stop_words.contains(token) {
            return false;
        }
        !(self.strip_social_tokens && SOCIAL_TOKENS.contains(&token))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::social()
    }
}
