//! Slot extraction: align a normalized utterance against an intent's
//! declared patterns and pull out `{{name}}` / `{{name,*}}` bindings.
//!
//! Patterns are normalized with their placeholders protected behind
//! sentinel tokens, scored against the phrase by unordered token overlap,
//! and the winning pattern is walked greedily left to right to bind slots.

use std::collections::{HashMap, VecDeque};
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

use crate::normalize::Normalizer;

/// Slot bindings for one turn. `None` means the placeholder was reached
/// but no phrase token was left to bind.
pub type SlotBindings = HashMap<String, Option<String>>;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[A-Za-z0-9_]+(?:,\*)?\}\}").expect("placeholder regex is valid"));

/// One element of a normalized pattern.
#[derive(Debug, Clone, PartialEq)]
enum PatternToken {
    Literal(String),
    /// `{{name}}` — binds exactly one token.
    Slot(String),
    /// `{{name,*}}` — binds the space-joined remainder.
    SlotRest(String),
}

/// Sentinel token standing in for a placeholder during normalization.
///
/// The reserved `zq` prefix plus 16 hex digits cannot collide with any
/// normalized vocabulary token, and no lemmatizer suffix rule applies to a
/// hex tail, so protection round-trips regardless of normalizer behavior.
fn sentinel() -> String {
    format!("zq{:016x}", rand::thread_rng().r#gen::<u64>())
}

/// Normalize one pattern with its placeholders protected.
///
/// Every distinct placeholder text maps to one fresh sentinel (repeated
/// identical placeholders share it), so normalization can never corrupt or
/// lemmatize placeholder syntax.
fn compile_pattern(pattern: &str, normalizer: &dyn Normalizer) -> Vec<PatternToken> {
    let mut sentinels: HashMap<String, String> = HashMap::new();
    let protected = PLACEHOLDER.replace_all(pattern, |caps: &regex::Captures<'_>| {
        let text = caps[0].to_string();
        format!(
            " {} ",
            sentinels.entry(text).or_insert_with(sentinel).clone()
        )
    });

    // Invert for restoration after the normalizer has run.
    let restore: HashMap<&str, &str> = sentinels
        .iter()
        .map(|(text, token)| (token.as_str(), text.as_str()))
        .collect();

    normalizer
        .normalize(&protected)
        .into_iter()
        .map(|token| match restore.get(token.as_str()) {
            Some(text) => {
                let inner = &text[2..text.len() - 2];
                match inner.split_once(',') {
                    Some((name, _)) => PatternToken::SlotRest(name.to_string()),
                    None => PatternToken::Slot(inner.to_string()),
                }
            }
            None => PatternToken::Literal(token),
        })
        .collect()
}

/// Unordered overlap score: how many phrase tokens (each occurrence)
/// appear anywhere in the pattern.
///
/// A phrase token repeated n times scores n against a pattern containing
/// it once. That inflation is the documented historical behavior and is
/// reproduced deliberately; see `repeated_phrase_token_inflates_score`.
fn overlap_score(pattern: &[PatternToken], phrase: &[String]) -> usize {
    phrase
        .iter()
        .filter(|token| {
            pattern
                .iter()
                .any(|p| matches!(p, PatternToken::Literal(lit) if lit == *token))
        })
        .count()
}

/// Extract slot bindings from `phrase` using the best-matching pattern.
///
/// Returns an empty mapping when there are no patterns, the phrase is
/// empty, or the winning pattern has no placeholders. Slot names the walk
/// never reaches are absent from the result, not defaulted to `None`.
pub fn extract_slots(
    patterns: &[String],
    phrase: &[String],
    normalizer: &dyn Normalizer,
) -> SlotBindings {
    if patterns.is_empty() || phrase.is_empty() {
        return SlotBindings::new();
    }

    let compiled: Vec<Vec<PatternToken>> = patterns
        .iter()
        .map(|p| compile_pattern(p, normalizer))
        .collect();

    // First pattern achieving the strict maximum wins; ties keep the earlier.
    let mut best = 0usize;
    let mut best_score = overlap_score(&compiled[0], phrase);
    for (idx, pattern) in compiled.iter().enumerate().skip(1) {
        let score = overlap_score(pattern, phrase);
        if score > best_score {
            best = idx;
            best_score = score;
        }
    }

    walk(&compiled[best], phrase)
}

/// Walk a pattern left to right against the phrase, consuming tokens.
fn walk(pattern: &[PatternToken], phrase: &[String]) -> SlotBindings {
    let mut remaining: VecDeque<&String> = phrase.iter().collect();
    let mut bindings = SlotBindings::new();

    for token in pattern {
        match token {
            PatternToken::Literal(lit) => {
                // Consume through the literal's first occurrence, if any.
                if let Some(pos) = remaining.iter().position(|t| *t == lit) {
                    remaining.drain(..=pos);
                }
            }
            PatternToken::Slot(name) => {
                let value = remaining.pop_front().map(|t| t.to_string());
                bindings.insert(name.clone(), value);
            }
            PatternToken::SlotRest(name) => {
                let value = if remaining.is_empty() {
                    None
                } else {
                    Some(
                        remaining
                            .drain(..)
                            .map(|t| t.as_str())
                            .collect::<Vec<_>>()
                            .join(" "),
                    )
                };
                bindings.insert(name.clone(), value);
            }
        }
    }

    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::BasicNormalizer;

    fn extract(patterns: &[&str], phrase: &str) -> SlotBindings {
        let normalizer = BasicNormalizer;
        let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        extract_slots(&patterns, &normalizer.normalize(phrase), &normalizer)
    }

    #[test]
    fn pattern_without_placeholders_yields_empty_mapping() {
        let bindings = extract(&["hello there friend"], "hello there friend");
        assert!(bindings.is_empty());
    }

    #[test]
    fn single_slot_binds_the_token_in_position() {
        let bindings = extract(&["my name is {{name}} thanks"], "my name is alice thanks");
        assert_eq!(bindings["name"], Some("alice".into()));
    }

    #[test]
    fn rest_slot_binds_space_joined_remainder() {
        let bindings = extract(&["i live in {{city,*}}"], "i live in rio de janeiro");
        assert_eq!(bindings["city"], Some("rio de janeiro".into()));
    }

    #[test]
    fn rest_slot_with_nothing_left_binds_none() {
        let bindings = extract(&["i live in {{city,*}}"], "i live in");
        assert_eq!(bindings["city"], None);
    }

    #[test]
    fn slot_with_nothing_left_binds_none() {
        let bindings = extract(&["call me {{name}}"], "call me");
        assert_eq!(bindings["name"], None);
    }

    #[test]
    fn literal_consumes_through_first_occurrence() {
        // "please" is discarded while seeking "call"; "me" consumes one more.
        let bindings = extract(&["call me {{name}}"], "please call me bob");
        assert_eq!(bindings["name"], Some("bob".into()));
    }

    #[test]
    fn absent_literal_consumes_nothing() {
        let bindings = extract(&["would you call me {{name}}"], "call me bob");
        assert_eq!(bindings["name"], Some("bob".into()));
    }

    #[test]
    fn best_scoring_pattern_wins() {
        let bindings = extract(
            &["my name is {{name}}", "i am from {{city,*}}"],
            "i am from porto alegre",
        );
        assert_eq!(bindings["city"], Some("porto alegre".into()));
        assert!(!bindings.contains_key("name"));
    }

    #[test]
    fn ties_keep_the_earlier_pattern() {
        // Both patterns contain exactly the token "is".
        let bindings = extract(
            &["is {{first}}", "is {{second}}"],
            "is anyone",
        );
        assert!(bindings.contains_key("first"));
        assert!(!bindings.contains_key("second"));
    }

    #[test]
    fn repeated_phrase_token_inflates_score() {
        // "very very very good" scores 4 against the second pattern (3×very
        // + good) but only 1 against the first — historical behavior.
        let bindings = extract(
            &["good {{a}}", "very good {{b}}"],
            "very very very good day",
        );
        assert!(bindings.contains_key("b"));
    }

    #[test]
    fn placeholder_protection_round_trips() {
        // The normalizer lowercases and lemmatizes aggressively; the
        // placeholder itself must come back byte-identical.
        let normalizer = BasicNormalizer;
        let compiled = compile_pattern("My Cities are {{Towns,*}} now", &normalizer);
        assert!(
            compiled.contains(&PatternToken::SlotRest("Towns".into())),
            "placeholder text must survive normalization unchanged: {compiled:?}"
        );
        // Literals around it were still normalized.
        assert!(compiled.contains(&PatternToken::Literal("city".into())));
    }

    #[test]
    fn repeated_identical_placeholder_shares_a_sentinel() {
        let normalizer = BasicNormalizer;
        let compiled = compile_pattern("{{x}} and {{x}}", &normalizer);
        let slots: Vec<_> = compiled
            .iter()
            .filter(|t| matches!(t, PatternToken::Slot(_)))
            .collect();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0], slots[1]);
    }

    #[test]
    fn empty_phrase_yields_empty_mapping() {
        let normalizer = BasicNormalizer;
        let patterns = vec!["my name is {{name}}".to_string()];
        assert!(extract_slots(&patterns, &[], &normalizer).is_empty());
    }
}
