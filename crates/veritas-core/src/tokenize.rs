//! Search tokenizer.
//!
//! Produces the normalized term set used both to build and to query
//! search indexes, so equivalent phrasings land on the same terms.

use std::collections::BTreeSet;

/// Characters stripped from every token.
pub const PUNCTUATION: &[char] = &['.', ',', '?', ';', ':', '\'', '"'];

/// Words too common to index.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "as", "it", "is", "the", "this", "and", "but", "i", "we", "to",
];

/// Irregular forms mapped to a shared stem.
const STEMS: &[(&str, &str)] = &[
    ("universal", "universe"),
    ("universes", "universe"),
    ("exists", "exist"),
    ("existed", "exist"),
    ("existing", "exist"),
    ("claims", "claim"),
    ("claimed", "claim"),
    ("statements", "statement"),
    ("assertions", "assertion"),
    ("documents", "document"),
    ("entities", "entity"),
];

/// Normalize `text` into a sorted, deduplicated set of terms.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split_whitespace()
        .filter_map(normalize)
        .collect()
}

/// Normalize one whitespace-delimited word. `None` if nothing indexable remains.
pub fn normalize(word: &str) -> Option<String> {
    let token: String = word
        .to_lowercase()
        .chars()
        .filter(|c| !PUNCTUATION.contains(c))
        .collect();

    if token.is_empty() || STOPWORDS.contains(&token.as_str()) {
        return None;
    }
    Some(stem(&token).to_string())
}

fn stem(token: &str) -> &str {
    STEMS
        .iter()
        .find(|(form, _)| *form == token)
        .map_or(token, |&(_, stem)| stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_stemming() {
        assert_eq!(tokenize("Universal jobs"), set(&["jobs", "universe"]));
        assert_eq!(tokenize("it exists, it existed"), set(&["exist"]));
    }

    #[test]
    fn test_stopwords() {
        assert_eq!(tokenize("But nothing"), set(&["nothing"]));
        assert_eq!(tokenize("the a an"), BTreeSet::new());
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(tokenize("Question? Mark"), set(&["mark", "question"]));
        assert_eq!(tokenize("\"quoted\" don't ..."), set(&["dont", "quoted"]));
    }

    #[test]
    fn test_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t ").is_empty());
    }

    proptest! {
        #[test]
        fn test_idempotent(text in "[A-Za-z .,?;:'\"]{0,80}") {
            let once = tokenize(&text);
            let joined = once.iter().cloned().collect::<Vec<_>>().join(" ");
            prop_assert_eq!(tokenize(&joined), once);
        }

        #[test]
        fn test_case_insensitive(text in "[A-Za-z ]{0,60}") {
            prop_assert_eq!(tokenize(&text.to_uppercase()), tokenize(&text.to_lowercase()));
        }
    }
}
