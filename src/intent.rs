//! Intent catalog: declarative conversational categories.
//!
//! An intent pairs a tag with example phrasings (patterns, possibly
//! containing `{{slot}}` placeholders) and candidate reply templates.
//! Definitions live in `*.json` files under the intents directory and are
//! merged into one catalog at load time.

use std::path::Path;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{IntentError, IntentResult};

/// A named conversational category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Unique-ish tag; when tags repeat across files, the first definition
    /// found (filename-sorted merge order) wins during lookup.
    pub tag: String,
    /// Example phrasings, possibly containing `{{name}}` / `{{name,*}}`
    /// slot placeholders.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Candidate reply templates, possibly containing directives.
    #[serde(default)]
    pub responses: Vec<String>,
}

/// A classifier prediction: intent tag and confidence score.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub intent: String,
    pub score: f32,
}

/// The merged collection of all loaded intents.
///
/// Immutable after load; `Engine::reload` builds a fresh catalog and swaps
/// it in rather than mutating this one.
#[derive(Debug, Clone, Default)]
pub struct IntentCatalog {
    intents: Vec<Intent>,
}

impl IntentCatalog {
    /// Build a catalog from an in-memory list (used by tests).
    pub fn from_intents(intents: Vec<Intent>) -> Self {
        Self { intents }
    }

    /// Load all `*.json` intent files from a directory.
    ///
    /// Files are merged in filename-sorted order so that
    /// first-definition-wins lookup stays deterministic across platforms.
    pub fn load(dir: &Path) -> IntentResult<Self> {
        if !dir.is_dir() {
            return Err(IntentError::NoIntentsDir {
                path: dir.display().to_string(),
            });
        }

        let mut files: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| IntentError::Io {
                path: dir.display().to_string(),
                source: e,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut intents = Vec::new();
        for path in &files {
            let content = std::fs::read_to_string(path).map_err(|e| IntentError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            let mut batch: Vec<Intent> =
                serde_json::from_str(&content).map_err(|e| IntentError::Invalid {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            intents.append(&mut batch);
        }

        tracing::debug!(
            files = files.len(),
            intents = intents.len(),
            "loaded intent catalog"
        );
        Ok(Self { intents })
    }

    /// Number of loaded intents (including shadowed duplicates).
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// All distinct tags in merge order.
    pub fn tags(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.intents
            .iter()
            .map(|i| i.tag.as_str())
            .filter(|t| seen.insert(*t))
            .collect()
    }

    /// Iterate over all intents in merge order.
    pub fn iter(&self) -> impl Iterator<Item = &Intent> {
        self.intents.iter()
    }

    /// First intent declared with the given tag.
    pub fn get(&self, tag: &str) -> Option<&Intent> {
        self.intents.iter().find(|i| i.tag == tag)
    }

    /// Patterns of the first intent with the given tag (empty if unknown).
    pub fn patterns_for(&self, tag: &str) -> &[String] {
        self.get(tag).map(|i| i.patterns.as_slice()).unwrap_or(&[])
    }

    /// Pick a reply template uniformly at random for the given tag.
    pub fn pick_response(&self, tag: &str) -> Option<String> {
        self.get(tag)
            .and_then(|i| i.responses.choose(&mut rand::thread_rng()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn intent(tag: &str, patterns: &[&str], responses: &[&str]) -> Intent {
        Intent {
            tag: tag.into(),
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            responses: responses.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn loads_and_merges_json_files_in_filename_order() {
        let dir = TempDir::new().unwrap();
        // "b.json" redefines greeting; "a.json" must win.
        std::fs::write(
            dir.path().join("a.json"),
            r#"[{"tag": "greeting", "patterns": ["hello"], "responses": ["Hi!"]}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            r#"[
                {"tag": "greeting", "patterns": ["yo"], "responses": ["Yo."]},
                {"tag": "goodbye", "patterns": ["bye"], "responses": ["Bye!"]}
            ]"#,
        )
        .unwrap();
        // Non-JSON files are ignored.
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let catalog = IntentCatalog::load(dir.path()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("greeting").unwrap().responses, vec!["Hi!"]);
        assert_eq!(catalog.patterns_for("goodbye"), ["bye"]);
        assert_eq!(catalog.tags(), vec!["greeting", "goodbye"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = IntentCatalog::load(&dir.path().join("nope"));
        assert!(matches!(result, Err(IntentError::NoIntentsDir { .. })));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let result = IntentCatalog::load(dir.path());
        assert!(matches!(result, Err(IntentError::Invalid { .. })));
    }

    #[test]
    fn unknown_tag_yields_no_patterns_and_no_response() {
        let catalog = IntentCatalog::from_intents(vec![intent("a", &["x"], &["y"])]);
        assert!(catalog.patterns_for("missing").is_empty());
        assert!(catalog.pick_response("missing").is_none());
    }

    #[test]
    fn pick_response_draws_from_declared_responses() {
        let catalog =
            IntentCatalog::from_intents(vec![intent("a", &[], &["one", "two", "three"])]);
        for _ in 0..20 {
            let reply = catalog.pick_response("a").unwrap();
            assert!(["one", "two", "three"].contains(&reply.as_str()));
        }
    }
}
