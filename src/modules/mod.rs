//! Command module registry: pluggable handlers behind `{{command,...}}`
//! directives.
//!
//! Handlers are compiled in as *kinds*; a JSON definition file in the
//! modules directory binds a module name to a kind and (optionally) a
//! configuration table. `load()` rebuilds the whole name→handler map and
//! swaps it in atomically, so a reload never exposes a half-updated
//! registry to in-flight turns.

pub mod datetime;
pub mod weather;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::Deserialize;

use crate::error::{ModuleError, ModuleResult};

/// A pluggable command handler invoked by name from a directive.
///
/// `config` is the opaque per-module configuration slice, passed through
/// unchanged on every call. Failures must be reported as
/// [`ModuleError::ExecutionFailed`] — the template evaluator turns them
/// into a fallback reply instead of a crash.
pub trait CommandModule: Send + Sync {
    fn execute(&self, args: &[&str], config: Option<&toml::Value>) -> ModuleResult<String>;
}

/// Trivial built-in handler: echoes its arguments back, space-joined.
#[derive(Debug, Default)]
pub struct EchoModule;

impl CommandModule for EchoModule {
    fn execute(&self, args: &[&str], _config: Option<&toml::Value>) -> ModuleResult<String> {
        Ok(args.join(" "))
    }
}

/// A registered module: handler plus its configuration slice.
#[derive(Clone)]
struct ModuleEntry {
    handler: Arc<dyn CommandModule>,
    config: Option<toml::Value>,
}

/// On-disk module definition: `{"kind": "...", "config": {...}?}`.
#[derive(Debug, Deserialize)]
struct ModuleDefinition {
    kind: String,
    #[serde(default)]
    config: Option<serde_json::Value>,
}

type HandlerMap = HashMap<String, ModuleEntry>;

/// Registry of command modules with hot reload.
pub struct ModuleRegistry {
    modules_dir: Option<PathBuf>,
    /// Per-module configuration from the engine config, used when a
    /// definition file does not carry its own table.
    config: HashMap<String, toml::Value>,
    /// Swapped wholesale by `load()`; executions clone the `Arc` snapshot
    /// and complete against whichever map was active when they started.
    handlers: RwLock<Arc<HandlerMap>>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules_dir", &self.modules_dir)
            .field("modules", &self.names())
            .finish()
    }
}

/// Instantiate a built-in handler by kind name.
fn handler_for_kind(kind: &str) -> Option<Arc<dyn CommandModule>> {
    match kind {
        "datetime" => Some(Arc::new(datetime::DatetimeModule)),
        "echo" => Some(Arc::new(EchoModule)),
        "weather" => Some(Arc::new(weather::WeatherModule)),
        _ => None,
    }
}

impl ModuleRegistry {
    /// Create a registry and run the initial `load()`.
    ///
    /// `modules_dir` of `None` registers only the built-ins.
    pub fn new(
        modules_dir: Option<PathBuf>,
        config: HashMap<String, toml::Value>,
    ) -> ModuleResult<Self> {
        let registry = Self {
            modules_dir,
            config,
            handlers: RwLock::new(Arc::new(HandlerMap::new())),
        };
        registry.load()?;
        Ok(registry)
    }

    /// Parse one definition file into a registry entry.
    fn load_definition(&self, path: &std::path::Path) -> ModuleResult<(String, ModuleEntry)> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ModuleError::Scan {
            path: path.display().to_string(),
            source: e,
        })?;
        let definition: ModuleDefinition =
            serde_json::from_str(&content).map_err(|e| ModuleError::InvalidDefinition {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let handler =
            handler_for_kind(&definition.kind).ok_or_else(|| ModuleError::UnknownKind {
                kind: definition.kind.clone(),
                path: path.display().to_string(),
            })?;

        // Inline config wins over the engine-level [modules.<name>] table.
        let config = match definition.config {
            Some(json) => Some(toml::Value::try_from(json).map_err(|e| {
                ModuleError::InvalidDefinition {
                    path: path.display().to_string(),
                    message: format!("config: {e}"),
                }
            })?),
            None => self.config.get(&name).cloned(),
        };

        Ok((name, ModuleEntry { handler, config }))
    }

    /// (Re)scan the modules directory and rebuild the handler map.
    ///
    /// Safe to call repeatedly; the new map replaces the old one in a
    /// single swap — stale entries are never merged in. Malformed
    /// definition files are skipped with a warning so a bad file cannot
    /// brick a hot reload. Returns the number of registered modules.
    pub fn load(&self) -> ModuleResult<usize> {
        let mut map = HandlerMap::new();

        // Built-ins are always present under their own names.
        for builtin in ["datetime", "echo"] {
            map.insert(
                builtin.to_string(),
                ModuleEntry {
                    handler: handler_for_kind(builtin).expect("built-in kind exists"),
                    config: self.config.get(builtin).cloned(),
                },
            );
        }

        if let Some(dir) = &self.modules_dir {
            if dir.is_dir() {
                let entries = std::fs::read_dir(dir).map_err(|e| ModuleError::Scan {
                    path: dir.display().to_string(),
                    source: e,
                })?;
                for entry in entries.filter_map(|e| e.ok()) {
                    let path = entry.path();
                    if path.extension().is_none_or(|ext| ext != "json") {
                        continue;
                    }
                    match self.load_definition(&path) {
                        Ok((name, module)) => {
                            map.insert(name, module);
                        }
                        Err(e) => {
                            tracing::warn!(
                                path = %path.display(),
                                error = %e,
                                "skipping bad module definition"
                            );
                        }
                    }
                }
            }
        }

        let count = map.len();
        *self.handlers.write().expect("handlers lock poisoned") = Arc::new(map);
        tracing::debug!(modules = count, "module registry loaded");
        Ok(count)
    }

    /// Whether a handler is currently registered under `name`.
    pub fn available(&self, name: &str) -> bool {
        self.handlers
            .read()
            .expect("handlers lock poisoned")
            .contains_key(name)
    }

    /// Registered module names, sorted.
    pub fn names(&self) -> Vec<String> {
        let snapshot = self.handlers.read().expect("handlers lock poisoned").clone();
        let mut names: Vec<String> = snapshot.keys().cloned().collect();
        names.sort();
        names
    }

    /// Execute a module with the given arguments.
    ///
    /// Handler failures surface as structured
    /// [`ModuleError::ExecutionFailed`]; an unknown name is
    /// [`ModuleError::NotRegistered`]. Never an empty-string swallow.
    pub fn execute(&self, name: &str, args: &[&str]) -> ModuleResult<String> {
        let snapshot = self.handlers.read().expect("handlers lock poisoned").clone();
        let entry = snapshot.get(name).ok_or_else(|| ModuleError::NotRegistered {
            module: name.to_string(),
        })?;
        entry.handler.execute(args, entry.config.as_ref())
    }
}
