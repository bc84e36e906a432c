//! Intent classification: ranked `(intent, score)` predictions.
//!
//! The orchestrator only depends on the [`Classifier`] trait; callers with a
//! trained model plug in their own implementation. [`BagOfWordsClassifier`]
//! is the built-in default: it scores an utterance against the vocabulary of
//! each tag's declared patterns. Deterministic, no training step.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::intent::{IntentCatalog, Prediction};
use crate::normalize::Normalizer;

/// Slot placeholders carry no classification signal; strip them before
/// building the vocabulary.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[^{}]*\}\}").expect("placeholder regex is valid"));

/// Ranks intents for a normalized utterance.
pub trait Classifier: Send + Sync {
    /// Predictions above the configured threshold, sorted descending by
    /// score. An empty result means nothing matched confidently.
    fn classify(&self, phrase: &[String]) -> Vec<Prediction>;
}

/// Vocabulary-overlap classifier built from the intent catalog.
#[derive(Debug, Clone)]
pub struct BagOfWordsClassifier {
    /// Tag → normalized pattern vocabulary, in catalog merge order.
    vocabularies: Vec<(String, HashSet<String>)>,
    threshold: f32,
}

impl BagOfWordsClassifier {
    /// Build the per-tag vocabularies from the catalog's patterns.
    pub fn train(catalog: &IntentCatalog, normalizer: &dyn Normalizer, threshold: f32) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut vocab: HashMap<String, HashSet<String>> = HashMap::new();

        for intent in catalog.iter() {
            let entry = vocab.entry(intent.tag.clone()).or_insert_with(|| {
                order.push(intent.tag.clone());
                HashSet::new()
            });
            for pattern in &intent.patterns {
                let literal = PLACEHOLDER.replace_all(pattern, " ");
                entry.extend(normalizer.normalize(&literal));
            }
        }

        let vocabularies = order
            .into_iter()
            .map(|tag| {
                let words = vocab.remove(&tag).unwrap_or_default();
                (tag, words)
            })
            .collect();

        Self {
            vocabularies,
            threshold,
        }
    }
}

impl Classifier for BagOfWordsClassifier {
    fn classify(&self, phrase: &[String]) -> Vec<Prediction> {
        let distinct: HashSet<&String> = phrase.iter().collect();
        if distinct.is_empty() {
            return Vec::new();
        }

        let mut predictions: Vec<Prediction> = self
            .vocabularies
            .iter()
            .filter_map(|(tag, vocab)| {
                let matched = distinct.iter().filter(|t| vocab.contains(**t)).count();
                let score = matched as f32 / distinct.len() as f32;
                (score > self.threshold).then(|| Prediction {
                    intent: tag.clone(),
                    score,
                })
            })
            .collect();

        // Stable sort keeps catalog order among equal scores.
        predictions.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        predictions
    }
}
