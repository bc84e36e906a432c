//! Rich diagnostic error types for the riposte engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Failures that reach a user of the chat
//! surface are always recovered before this layer (fallback replies); these
//! types are for the operator and the library caller.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the riposte engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum RiposteError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Intent(#[from] IntentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Module(#[from] ModuleError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Intent catalog errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum IntentError {
    #[error("intents directory not found: {path}")]
    #[diagnostic(
        code(riposte::intent::no_dir),
        help(
            "The intents directory must exist and contain at least one *.json \
             file of intent definitions. Create it, or point --data-dir at an \
             initialized data directory."
        )
    )]
    NoIntentsDir { path: String },

    #[error("failed to read intent file {path}: {source}")]
    #[diagnostic(
        code(riposte::intent::io),
        help("Check file permissions and that the path is a regular file.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid intent file {path}: {message}")]
    #[diagnostic(
        code(riposte::intent::invalid),
        help(
            "Intent files are JSON arrays of objects with \"tag\", \"patterns\" \
             and \"responses\" fields. Validate the file against that shape."
        )
    )]
    Invalid { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Command module errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ModuleError {
    #[error("no command module registered under '{module}'")]
    #[diagnostic(
        code(riposte::module::not_registered),
        help(
            "Check the modules directory for a matching definition file, or \
             use one of the built-in module names. `riposte modules` lists \
             what is currently registered."
        )
    )]
    NotRegistered { module: String },

    #[error("module '{module}' failed: {message}")]
    #[diagnostic(
        code(riposte::module::execution),
        help(
            "The handler reported a failure. The turn recovers with a \
             moduleerror fallback reply; fix the module configuration or the \
             upstream service to restore normal replies."
        )
    )]
    ExecutionFailed { module: String, message: String },

    #[error("invalid module definition {path}: {message}")]
    #[diagnostic(
        code(riposte::module::invalid_definition),
        help(
            "Module definition files are JSON objects with a \"kind\" naming a \
             built-in handler and an optional \"config\" table."
        )
    )]
    InvalidDefinition { path: String, message: String },

    #[error("unknown handler kind '{kind}' in {path}")]
    #[diagnostic(
        code(riposte::module::unknown_kind),
        help("Built-in handler kinds are: datetime, echo, weather.")
    )]
    UnknownKind { kind: String, path: String },

    #[error("failed to scan modules directory {path}: {source}")]
    #[diagnostic(
        code(riposte::module::scan),
        help("Check that the modules directory exists and is readable.")
    )]
    Scan {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Profile store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ProfileError {
    #[error("failed to read profile checkpoint {path}: {source}")]
    #[diagnostic(
        code(riposte::profile::io),
        help(
            "The profile store could not access its checkpoint file. Check \
             permissions on the data directory."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt profile checkpoint {path}: {message}")]
    #[diagnostic(
        code(riposte::profile::corrupt),
        help(
            "The checkpoint is not valid JSON of the expected shape. Restore \
             it from a backup or remove the file to start with empty profiles."
        )
    )]
    Corrupt { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("data directory error: {path}")]
    #[diagnostic(
        code(riposte::engine::data_dir),
        help(
            "The data directory could not be created or accessed. Ensure the \
             path exists and has read/write permissions."
        )
    )]
    DataDir { path: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(riposte::engine::invalid_config),
        help("Check the config.toml fields. {message}")
    )]
    InvalidConfig { message: String },
}

/// Convenience alias for functions returning riposte results.
pub type RiposteResult<T> = std::result::Result<T, RiposteError>;

/// Result alias for intent catalog operations.
pub type IntentResult<T> = std::result::Result<T, IntentError>;

/// Result alias for command module operations.
pub type ModuleResult<T> = std::result::Result<T, ModuleError>;

/// Result alias for profile store operations.
pub type ProfileResult<T> = std::result::Result<T, ProfileError>;
