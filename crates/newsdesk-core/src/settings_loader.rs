//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON document (overriding defaults, deep-merged).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `NEWSDESK_DEBUG` | `debug` |
//! | `NEWSDESK_LOG_LEVEL` | `log_level` |
//! | `NEWSDESK_LANGUAGE_CODE` | `language_code` |
//! | `NEWSDESK_BACKEND_URL` | `backend.url` |
//! | `NEWSDESK_BACKEND_ANON_KEY` | `backend.anon_key` |
//! | `NEWSDESK_DEBOUNCE_MS` | `forms.debounce_ms` |
//! | `NEWSDESK_SUCCESS_DISPLAY_MS` | `forms.success_display_ms` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use newsdesk_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/newsdesk.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::NewsdeskError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Sections and keys not present in the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, NewsdeskError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| NewsdeskError::Configuration(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, NewsdeskError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        NewsdeskError::Configuration(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, NewsdeskError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, NewsdeskError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| NewsdeskError::Configuration(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `NEWSDESK_*` environment variable overrides to a settings struct.
///
/// Numeric variables that fail to parse are ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("NEWSDESK_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }
    if let Some(val) = lookup("NEWSDESK_LOG_LEVEL") {
        settings.log_level = val;
    }
    if let Some(val) = lookup("NEWSDESK_LANGUAGE_CODE") {
        settings.language_code = val;
    }
    if let Some(val) = lookup("NEWSDESK_BACKEND_URL") {
        settings.backend.url = val;
    }
    if let Some(val) = lookup("NEWSDESK_BACKEND_ANON_KEY") {
        settings.backend.anon_key = val;
    }
    if let Some(ms) = lookup("NEWSDESK_DEBOUNCE_MS").and_then(|v| v.parse().ok()) {
        settings.forms.debounce_ms = ms;
    }
    if let Some(ms) = lookup("NEWSDESK_SUCCESS_DISPLAY_MS").and_then(|v| v.parse().ok()) {
        settings.forms.success_display_ms = ms;
    }
}

// ============================================================
// Helpers
// ============================================================

fn merge_over_defaults(
    overrides: serde_json::Value,
    format: &str,
) -> Result<Settings, NewsdeskError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        NewsdeskError::Configuration(format!("Failed to serialize default settings: {e}"))
    })?;
    let merged = merge_json(default_json, overrides);
    serde_json::from_value(merged).map_err(|e| {
        NewsdeskError::Configuration(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(base_v) => merge_json(base_v, override_v),
                    None => override_v,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_from_toml_str_sections() {
        let toml = r#"
            debug = false
            language_code = "fr"

            [backend]
            url = "https://project.example.co"
            anon_key = "anon"

            [forms]
            debounce_ms = 500
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.language_code, "fr");
        assert_eq!(settings.backend.url, "https://project.example.co");
        assert_eq!(settings.forms.debounce_ms, 500);
        // Untouched keys of a partially given section keep their defaults
        assert_eq!(settings.forms.success_display_ms, 4_000);
        assert_eq!(settings.backend.timeout_ms, 15_000);
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.auth.bootstrap_timeout_ms, 5_000);
    }

    #[test]
    fn test_from_toml_str_malformed() {
        let err = from_toml_str("debug = [").unwrap_err();
        assert!(matches!(err, NewsdeskError::Configuration(_)));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let err = from_toml_str("debug = \"maybe\"").unwrap_err();
        assert!(err.to_string().contains("TOML"));
    }

    #[test]
    fn test_from_json_str() {
        let settings =
            from_json_str(r#"{"notify": {"admin_function": "ping-admin"}}"#).unwrap();
        assert_eq!(settings.notify.admin_function, "ping-admin");
        assert_eq!(settings.notify.admin_ad_function, "notify-admin-ad");
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = from_toml_file("/nonexistent/newsdesk.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read TOML file"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("NEWSDESK_DEBUG", "0"),
            ("NEWSDESK_LOG_LEVEL", "debug"),
            ("NEWSDESK_BACKEND_URL", "https://env.example.co"),
            ("NEWSDESK_DEBOUNCE_MS", "150"),
            ("NEWSDESK_SUCCESS_DISPLAY_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        apply_overrides(&mut settings, |k| vars.get(k).map(|v| (*v).to_string()));

        assert!(!settings.debug);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.backend.url, "https://env.example.co");
        assert_eq!(settings.forms.debounce_ms, 150);
        assert_eq!(settings.forms.success_display_ms, 4_000);
    }

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"a": {"x": 1, "y": 2}, "b": 3});
        let over = serde_json::json!({"a": {"y": 20}});
        let merged = merge_json(base, over);
        assert_eq!(merged, serde_json::json!({"a": {"x": 1, "y": 20}, "b": 3}));
    }
}
