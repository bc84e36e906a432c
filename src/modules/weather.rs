//! Weather command module: current temperature from an
//! OpenWeatherMap-compatible API.
//!
//! Configuration table: `lat`, `lon`, `api` (key), optional `units`
//! (`metric`/`imperial`, default metric) and `endpoint` override.

use crate::error::{ModuleError, ModuleResult};

use super::CommandModule;

const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Built-in `weather` handler.
#[derive(Debug, Default)]
pub struct WeatherModule;

fn failure(message: impl Into<String>) -> ModuleError {
    ModuleError::ExecutionFailed {
        module: "weather".into(),
        message: message.into(),
    }
}

fn config_str<'a>(config: &'a toml::Value, key: &str) -> ModuleResult<String> {
    let value = config
        .get(key)
        .ok_or_else(|| failure(format!("missing '{key}' in module configuration")))?;
    // Numeric lat/lon are fine too; render them as-is.
    Ok(match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

impl WeatherModule {
    /// `{{weather,temperature[,units]}}`: current temperature, formatted
    /// as `21.4°C` / `70.5°F`.
    fn temperature(&self, args: &[&str], config: &toml::Value) -> ModuleResult<String> {
        let lat = config_str(config, "lat")?;
        let lon = config_str(config, "lon")?;
        let api = config_str(config, "api")?;

        let configured_units = config
            .get("units")
            .and_then(|v| v.as_str())
            .unwrap_or("metric")
            .to_lowercase();
        let units = match args.first().map(|u| u.to_lowercase()) {
            Some(u) if u == "metric" || u == "imperial" => u,
            _ => configured_units,
        };

        let endpoint = config
            .get("endpoint")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_ENDPOINT);
        let url =
            format!("{endpoint}?lat={lat}&lon={lon}&appid={api}&units={units}");

        let body: serde_json::Value = ureq::get(&url)
            .call()
            .map_err(|e| failure(format!("request failed: {e}")))?
            .into_json()
            .map_err(|e| failure(format!("malformed response: {e}")))?;

        let temp = body["main"]["temp"]
            .as_f64()
            .ok_or_else(|| failure("response is missing main.temp"))?;

        let unit_mark = if units == "imperial" { "F" } else { "C" };
        Ok(format!("{temp}°{unit_mark}"))
    }
}

impl CommandModule for WeatherModule {
    fn execute(&self, args: &[&str], config: Option<&toml::Value>) -> ModuleResult<String> {
        let config = config.ok_or_else(|| failure("module is not configured"))?;
        let command = args.first().copied().unwrap_or("temperature");
        match command {
            "temperature" => self.temperature(&args[args.len().min(1)..], config),
            _ => Ok("?".into()),
        }
    }
}
