//! # riposte
//!
//! A rule-driven dialogue responder: intents declared as JSON, slot
//! extraction against `{{name}}` placeholders, reply templates with
//! `{{command,args}}` directives, and a pluggable command-module registry.
//!
//! ## Architecture
//!
//! - **Intent catalog** (`intent`): JSON-declared tags, patterns, responses
//! - **Normalization** (`normalize`): tokenize, fold, light lemmatization
//! - **Classification** (`classify`): pluggable, bag-of-words by default
//! - **Slot extraction** (`slots`): pattern alignment with placeholder protection
//! - **Templates** (`template`): single-pass directive rewrite, no re-scanning
//! - **Command modules** (`modules`): hot-reloadable name→handler registry
//! - **Engine** (`engine`): the turn orchestrator tying it all together
//!
//! ## Library usage
//!
//! ```no_run
//! use riposte::engine::Engine;
//!
//! let engine = Engine::open(".riposte").unwrap();
//! if let Some(reply) = engine.respond("ada", "hello there") {
//!     println!("{reply}");
//! }
//! ```

pub mod chatlog;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod intent;
pub mod modules;
pub mod normalize;
pub mod profile;
pub mod slots;
pub mod template;
