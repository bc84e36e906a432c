//! Engine facade: the turn orchestrator.
//!
//! The `Engine` owns the intent catalog, classifier, normalizer, command
//! module registry, profile store, and turn log, and sequences one
//! conversational turn: classify → extract slots → update profile → select
//! response → evaluate template → log.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::chatlog::TurnLog;
use crate::classify::{BagOfWordsClassifier, Classifier};
use crate::config::BotConfig;
use crate::error::{EngineError, RiposteResult};
use crate::intent::{IntentCatalog, Prediction};
use crate::modules::ModuleRegistry;
use crate::normalize::{BasicNormalizer, Normalizer};
use crate::profile::ProfileStore;
use crate::slots::extract_slots;
use crate::template::TemplateEvaluator;

/// Tag substituted when the classifier returns nothing above threshold.
const NOANSWER_TAG: &str = "noanswer";

/// The riposte dialogue engine.
///
/// One engine serves any number of usernames; turns are processed one at a
/// time per caller. `reload` swaps the catalog, classifier, and module
/// registry without restarting.
pub struct Engine {
    config: BotConfig,
    data_dir: Option<PathBuf>,
    catalog: RwLock<Arc<IntentCatalog>>,
    classifier: RwLock<Arc<BagOfWordsClassifier>>,
    normalizer: BasicNormalizer,
    registry: ModuleRegistry,
    profiles: ProfileStore,
    log: TurnLog,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("data_dir", &self.data_dir)
            .field("intents", &self.catalog.read().expect("catalog lock poisoned").len())
            .finish()
    }
}

impl Engine {
    /// Open an engine over a data directory.
    ///
    /// Layout: `config.toml`, `intents/*.json`, `modules/*.json`,
    /// `users.json`, `chat.log`. An unreadable profile checkpoint is fatal
    /// here — better to refuse startup than lose every profile.
    pub fn open(data_dir: impl Into<PathBuf>) -> RiposteResult<Self> {
        let data_dir: PathBuf = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(|_| EngineError::DataDir {
            path: data_dir.display().to_string(),
        })?;

        let config = BotConfig::load(&data_dir.join("config.toml"))?;
        let catalog = IntentCatalog::load(&data_dir.join("intents"))?;

        let normalizer = BasicNormalizer;
        let classifier = BagOfWordsClassifier::train(&catalog, &normalizer, config.threshold);

        let registry = ModuleRegistry::new(
            Some(data_dir.join("modules")),
            config.modules.clone(),
        )?;
        let profiles = ProfileStore::open(data_dir.join("users.json"))?;
        let log = TurnLog::open(&data_dir.join("chat.log")).map_err(|_| EngineError::DataDir {
            path: data_dir.display().to_string(),
        })?;

        tracing::info!(
            data_dir = %data_dir.display(),
            intents = catalog.len(),
            threshold = config.threshold,
            "riposte engine initialized"
        );
        log.system("engine initialized");

        Ok(Self {
            config,
            data_dir: Some(data_dir),
            catalog: RwLock::new(Arc::new(catalog)),
            classifier: RwLock::new(Arc::new(classifier)),
            normalizer,
            registry,
            profiles,
            log,
        })
    }

    /// Build an in-memory engine from a catalog (tests, embedding).
    ///
    /// No profile checkpoint, no chat log, built-in modules only.
    pub fn in_memory(catalog: IntentCatalog, config: BotConfig) -> RiposteResult<Self> {
        let normalizer = BasicNormalizer;
        let classifier = BagOfWordsClassifier::train(&catalog, &normalizer, config.threshold);
        let registry = ModuleRegistry::new(None, config.modules.clone())?;

        Ok(Self {
            config,
            data_dir: None,
            catalog: RwLock::new(Arc::new(catalog)),
            classifier: RwLock::new(Arc::new(classifier)),
            normalizer,
            registry,
            profiles: ProfileStore::memory_only(),
            log: TurnLog::disabled(),
        })
    }

    /// Process one turn: a message from `username`, a reply back.
    ///
    /// Returns `None` exactly when `username` or `message` is blank —
    /// invalid input short-circuits with no reply and no log entry. Every
    /// other outcome is a reply string: normal, moduleerror fallback, or
    /// noanswer.
    pub fn respond(&self, username: &str, message: &str) -> Option<String> {
        if username.trim().is_empty() || message.trim().is_empty() {
            return None;
        }

        let catalog = self.catalog.read().expect("catalog lock poisoned").clone();
        let classifier = self.classifier.read().expect("classifier lock poisoned").clone();

        let phrase = self.normalizer.normalize(message);
        let mut predictions = classifier.classify(&phrase);
        tracing::debug!(user = username, ?predictions, "classified utterance");

        if predictions.is_empty() {
            // Keep the raw utterance for offline review, then degrade.
            self.log.unanswered(message);
            predictions = vec![Prediction {
                intent: NOANSWER_TAG.into(),
                score: 1.0,
            }];
        }
        let top = predictions[0].intent.clone();

        let bindings = extract_slots(catalog.patterns_for(&top), &phrase, &self.normalizer);
        for (name, value) in &bindings {
            // A slot that matched nothing is not written.
            if let Some(value) = value {
                self.profiles.set(username, name, value);
            }
        }

        let template = catalog
            .pick_response(&top)
            .or_else(|| catalog.pick_response(NOANSWER_TAG))
            .unwrap_or_else(|| {
                tracing::warn!(intent = top.as_str(), "no response template for intent");
                String::new()
            });

        let evaluator = TemplateEvaluator {
            catalog: &catalog,
            profiles: &self.profiles,
            registry: &self.registry,
        };
        let evaluation = evaluator.evaluate(&template, username);
        if let Some((module, detail)) = &evaluation.module_failure {
            self.log
                .system(&format!("module [{module}] failed: {detail}"));
        }

        self.log.turn(message, &evaluation.reply);
        Some(evaluation.reply)
    }

    /// Re-read intents and re-scan command modules without restarting.
    pub fn reload(&self) -> RiposteResult<()> {
        if let Some(data_dir) = &self.data_dir {
            let catalog = IntentCatalog::load(&data_dir.join("intents"))?;
            let classifier =
                BagOfWordsClassifier::train(&catalog, &self.normalizer, self.config.threshold);
            *self.catalog.write().expect("catalog lock poisoned") = Arc::new(catalog);
            *self.classifier.write().expect("classifier lock poisoned") = Arc::new(classifier);
        }
        self.registry.load()?;
        self.log.system("engine reloaded");
        tracing::info!("engine reloaded");
        Ok(())
    }

    /// Checkpoint the profile store.
    pub fn flush(&self) -> RiposteResult<()> {
        Ok(self.profiles.flush()?)
    }

    /// The module registry (for listing and diagnostics).
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// The profile store.
    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Summary statistics for `riposte info`.
    pub fn info(&self) -> EngineInfo {
        let catalog = self.catalog.read().expect("catalog lock poisoned").clone();
        EngineInfo {
            intents: catalog.len(),
            tags: catalog.tags().len(),
            modules: self.registry.names(),
            users: self.profiles.len(),
            threshold: self.config.threshold,
            persistent: self.data_dir.is_some(),
        }
    }
}

/// Summary information about the engine state.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub intents: usize,
    pub tags: usize,
    pub modules: Vec<String>,
    pub users: usize,
    pub threshold: f32,
    pub persistent: bool,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "riposte engine info")?;
        writeln!(f, "  intents:     {} ({} tags)", self.intents, self.tags)?;
        writeln!(f, "  modules:     {}", self.modules.join(", "))?;
        writeln!(f, "  users:       {}", self.users)?;
        writeln!(f, "  threshold:   {}", self.threshold)?;
        writeln!(f, "  persistent:  {}", self.persistent)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;

    fn intent(tag: &str, patterns: &[&str], responses: &[&str]) -> Intent {
        Intent {
            tag: tag.into(),
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            responses: responses.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn test_engine() -> Engine {
        let catalog = IntentCatalog::from_intents(vec![
            intent("greeting", &["hello there", "hi"], &["Hello {{user,name}}!"]),
            intent(
                "myname",
                &["my name is {{name,*}}", "call me {{name,*}}"],
                &["Nice to meet you, {{user,name}}."],
            ),
            intent("noanswer", &[], &["I did not get that."]),
            intent("moduleerror", &[], &["Module {{module}} is down."]),
        ]);
        Engine::in_memory(catalog, BotConfig::default()).unwrap()
    }

    #[test]
    fn blank_input_yields_no_reply() {
        let engine = test_engine();
        assert_eq!(engine.respond("", "hi"), None);
        assert_eq!(engine.respond("bob", ""), None);
        assert_eq!(engine.respond("   ", "hi"), None);
        assert_eq!(engine.respond("bob", "  \t "), None);
    }

    #[test]
    fn greeting_resolves_user_fallback() {
        let engine = test_engine();
        let reply = engine.respond("bob", "hello there").unwrap();
        assert_eq!(reply, "Hello bob!");
    }

    #[test]
    fn slot_value_is_stored_and_used() {
        let engine = test_engine();
        let reply = engine.respond("bob", "my name is alice cooper").unwrap();
        assert_eq!(reply, "Nice to meet you, alice cooper.");
        assert_eq!(
            engine.profiles().get("bob", "name"),
            Some("alice cooper".into())
        );

        // Later turns see the stored value through {{user,name}}.
        let reply = engine.respond("bob", "hello there").unwrap();
        assert_eq!(reply, "Hello alice cooper!");
    }

    #[test]
    fn unmatched_utterance_degrades_to_noanswer() {
        let engine = test_engine();
        let reply = engine.respond("bob", "zxcv qwerty").unwrap();
        assert_eq!(reply, "I did not get that.");
    }

    #[test]
    fn null_slot_binding_is_not_written() {
        let engine = test_engine();
        // Pattern matches but nothing is left for the rest-slot to bind.
        engine.respond("bob", "call me").unwrap();
        assert_eq!(engine.profiles().get("bob", "name"), None);
    }

    #[test]
    fn info_reports_catalog_and_modules() {
        let engine = test_engine();
        let info = engine.info();
        assert_eq!(info.intents, 4);
        assert!(info.modules.iter().any(|m| m == "datetime"));
        assert!(!info.persistent);
    }
}
