//! Date/time command module: renders the current wall-clock time with
//! strftime-style format codes.

use chrono::Local;
use chrono::format::{Item, StrftimeItems};

use crate::error::ModuleResult;

use super::CommandModule;

/// Default format when no argument is given.
pub const DEFAULT_FORMAT: &str = "%H:%M";

/// Render the current local time with the given strftime format.
///
/// Chrono's `Display` path panics on unrecognized format codes, so the
/// items are parsed up front; an invalid format degrades to the empty
/// string instead.
pub fn format_now(fmt: &str) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(fmt).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return String::new();
    }
    Local::now().format_with_items(items.into_iter()).to_string()
}

/// Built-in `datetime` handler.
#[derive(Debug, Default)]
pub struct DatetimeModule;

impl CommandModule for DatetimeModule {
    fn execute(&self, args: &[&str], _config: Option<&toml::Value>) -> ModuleResult<String> {
        let fmt = args.first().copied().unwrap_or(DEFAULT_FORMAT);
        Ok(format_now(fmt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_is_hour_minute() {
        let module = DatetimeModule;
        let out = module.execute(&[], None).unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(out.as_bytes()[2], b':');
    }

    #[test]
    fn year_format_renders_four_digits() {
        let module = DatetimeModule;
        let out = module.execute(&["%Y"], None).unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn invalid_format_degrades_to_empty() {
        assert_eq!(format_now("%Q%&"), "");
    }

    #[test]
    fn literal_text_passes_through() {
        assert_eq!(format_now("o'clock"), "o'clock");
    }
}
