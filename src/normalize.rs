//! Text normalization: tokenize, fold, and lemmatize raw utterances.
//!
//! The engine only depends on the [`Normalizer`] trait; [`BasicNormalizer`]
//! is a self-contained English implementation good enough for the pattern
//! alignment the slot engine does. Punctuation never survives tokenization,
//! which doubles as the ignore-list of the original design.

use unicode_normalization::UnicodeNormalization;

/// Turns raw text into a sequence of normalized tokens.
pub trait Normalizer: Send + Sync {
    /// Tokenized, lowercased, lemmatized form of `text`, in order.
    fn normalize(&self, text: &str) -> Vec<String>;
}

/// Default normalizer: NFKC fold, lowercase, alphanumeric tokenization,
/// light English suffix lemmatization.
#[derive(Debug, Clone, Default)]
pub struct BasicNormalizer;

/// Irregular plural forms the suffix rules cannot reach.
const IRREGULARS: &[(&str, &str)] = &[
    ("children", "child"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("men", "man"),
    ("mice", "mouse"),
    ("people", "person"),
    ("teeth", "tooth"),
    ("women", "woman"),
];

impl BasicNormalizer {
    /// Reduce a lowercased token to a base form.
    ///
    /// Handles irregular plurals and the common `-ies`/`-es`/`-s` endings.
    /// Slot sentinels (`zq` + hex) never end in `s` and pass through.
    fn lemmatize(token: &str) -> String {
        if let Some((_, lemma)) = IRREGULARS.iter().find(|(form, _)| *form == token) {
            return (*lemma).to_string();
        }

        if let Some(stem) = token.strip_suffix("ies") {
            if stem.len() >= 2 {
                return format!("{stem}y");
            }
        }
        if token.ends_with("sses") {
            return token[..token.len() - 2].to_string();
        }
        if let Some(stem) = token.strip_suffix("es") {
            if stem.ends_with("sh") || stem.ends_with("ch") || stem.ends_with('x') || stem.ends_with('z') {
                return stem.to_string();
            }
        }
        if let Some(stem) = token.strip_suffix('s') {
            if stem.len() >= 2 && !stem.ends_with('s') && !stem.ends_with('u') && !stem.ends_with('i') {
                return stem.to_string();
            }
        }

        token.to_string()
    }
}

impl Normalizer for BasicNormalizer {
    fn normalize(&self, text: &str) -> Vec<String> {
        let folded: String = text.nfkc().collect::<String>().to_lowercase();

        let mut tokens = Vec::new();
        let mut current = String::new();
        for ch in folded.chars() {
            // Word-internal apostrophes stay ("what's" is one token).
            if ch.is_alphanumeric() || (ch == '\'' && !current.is_empty()) {
                current.push(ch);
            } else if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }

        tokens
            .iter()
            .map(|t| Self::lemmatize(t.trim_end_matches('\'')))
            .filter(|t| !t.is_empty())
            .collect()
    }
}
