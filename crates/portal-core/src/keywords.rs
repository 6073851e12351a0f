//! Keyword tag derivation for note records.
//!
//! Tags are computed once, when a record is created, from its title and
//! description. They are not kept in sync with later changes.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::defaults::{MAX_TAGS, TAG_MIN_CHARS};

/// English stopwords plus words that carry no signal on a study portal.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her",
        "was", "one", "our", "out", "has", "have", "him", "his", "how", "its", "may", "new",
        "now", "old", "see", "two", "way", "who", "did", "get", "got", "let", "put", "say",
        "she", "too", "use", "with", "this", "that", "from", "they", "them", "then", "than",
        "there", "their", "these", "those", "what", "when", "where", "which", "while", "will",
        "would", "could", "should", "about", "into", "over", "under", "also", "been", "being",
        "were", "here", "each", "other", "some", "such", "only", "very", "just", "more",
        "most", "much", "many", "your", "yours", "does", "done", "doing", "because", "after",
        "before", "between", "both", "same", "own", "why", "off", "again", "once", "via",
        // Portal-specific filler
        "notes", "note", "pdf", "file", "document", "chapter", "unit", "page", "pages",
    ]
    .into_iter()
    .collect()
});

/// Whether `word` (already lowercased) is filtered out as a stopword.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Derive up to [`MAX_TAGS`] lowercase keywords from a title and description.
///
/// Tokens are split on any non-alphanumeric character. Short tokens, purely
/// numeric tokens and stopwords are dropped. Order follows first occurrence,
/// title before description.
pub fn extract_keywords(title: &str, description: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::with_capacity(MAX_TAGS);

    let tokens = title
        .split(|c: char| !c.is_alphanumeric())
        .chain(description.split(|c: char| !c.is_alphanumeric()));

    for token in tokens {
        if tags.len() == MAX_TAGS {
            break;
        }
        let word = token.to_lowercase();
        if word.chars().count() < TAG_MIN_CHARS
            || word.chars().all(|c| c.is_numeric())
            || is_stopword(&word)
        {
            continue;
        }
        if seen.insert(word.clone()) {
            tags.push(word);
        }
    }

    tags
}
