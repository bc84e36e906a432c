//! Template evaluation: resolve `{{command,args...}}` directives inside a
//! reply template.
//!
//! The scan is a left-to-right rewrite whose cursor only ever advances —
//! substituted output is never re-scanned, so no directive can smuggle
//! itself back in and evaluation always terminates. Module failures do not
//! unwind: directive dispatch returns an explicit result and the evaluator
//! switches to the `moduleerror` fallback template when it sees a failure.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ModuleError;
use crate::intent::IntentCatalog;
use crate::modules::ModuleRegistry;
use crate::modules::datetime::{DEFAULT_FORMAT, format_now};
use crate::profile::ProfileStore;

/// Directive grammar: balanced double braces around a comma-separated list
/// drawn from a restricted character set. Nothing resembling expression
/// syntax is ever accepted.
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z0-9_*%:+./\-, ]+)\}\}").expect("directive regex is valid")
});

/// Rendered text for the directive's span, or a module failure.
enum Rendered {
    Value(String),
    Failed { module: String, message: String },
}

/// Result of evaluating one template, with the failure (if any) for the
/// orchestrator to log.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub reply: String,
    /// `(module, message)` when the reply came from the moduleerror fallback.
    pub module_failure: Option<(String, String)>,
}

/// Evaluates reply templates against the profile store, the clock, and the
/// command module registry.
pub struct TemplateEvaluator<'a> {
    pub catalog: &'a IntentCatalog,
    pub profiles: &'a ProfileStore,
    pub registry: &'a ModuleRegistry,
}

impl TemplateEvaluator<'_> {
    /// Fully evaluate a template for a user.
    ///
    /// On module failure the original template is abandoned and a random
    /// `moduleerror` response is evaluated from scratch instead; inside
    /// that sub-evaluation `{{module}}` names the failing handler.
    pub fn evaluate(&self, template: &str, username: &str) -> Evaluation {
        match self.render(template, username, None) {
            Ok(reply) => Evaluation {
                reply,
                module_failure: None,
            },
            Err((module, message)) => {
                tracing::error!(
                    module = module.as_str(),
                    detail = message.as_str(),
                    "command module failed, switching to fallback reply"
                );
                let fallback = self.catalog.pick_response("moduleerror").unwrap_or_default();
                let failure = (module, message);
                let reply = self
                    .render(&fallback, username, Some(&failure))
                    .unwrap_or_default();
                Evaluation {
                    reply,
                    module_failure: Some(failure),
                }
            }
        }
    }

    /// One rewrite pass. `failure` is `Some` inside the fallback
    /// sub-evaluation; a second module failure there renders as the empty
    /// string rather than recursing, which keeps evaluation terminating.
    fn render(
        &self,
        template: &str,
        username: &str,
        failure: Option<&(String, String)>,
    ) -> Result<String, (String, String)> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(found) = DIRECTIVE.find(rest) {
            out.push_str(&rest[..found.start()]);
            let inner = &rest[found.start() + 2..found.end() - 2];
            rest = &rest[found.end()..];

            match self.dispatch(inner, username, failure) {
                Rendered::Value(value) => out.push_str(&value),
                Rendered::Failed { module, message } => {
                    if failure.is_some() {
                        // Already in the fallback; degrade in place.
                        tracing::warn!(
                            module = module.as_str(),
                            "module failed inside fallback reply, rendering empty"
                        );
                    } else {
                        return Err((module, message));
                    }
                }
            }
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Resolve one directive. Each occurrence is resolved exactly once.
    fn dispatch(
        &self,
        directive: &str,
        username: &str,
        failure: Option<&(String, String)>,
    ) -> Rendered {
        let mut parts = directive.split(',');
        let command = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match command {
            "user" => {
                // Soft-fail to empty on a bare {{user}}.
                let Some(variable) = args.first() else {
                    return Rendered::Value(String::new());
                };
                let mut value = self.profiles.get(username, variable);
                if value.is_none() && *variable == "name" {
                    // Unset display name falls back to the login name.
                    value = self.profiles.get(username, "username");
                }
                Rendered::Value(value.unwrap_or_default())
            }
            "datetime" => {
                let fmt = args.first().copied().unwrap_or(DEFAULT_FORMAT);
                Rendered::Value(format_now(fmt))
            }
            "module" => Rendered::Value(
                failure.map(|(module, _)| module.clone()).unwrap_or_default(),
            ),
            _ if self.registry.available(command) => {
                match self.registry.execute(command, &args) {
                    Ok(value) => Rendered::Value(value),
                    Err(ModuleError::ExecutionFailed { module, message }) => {
                        Rendered::Failed { module, message }
                    }
                    Err(other) => Rendered::Failed {
                        module: command.to_string(),
                        message: other.to_string(),
                    },
                }
            }
            _ => Rendered::Value("(unknown command)".into()),
        }
    }
}
