//! Tolerant decoding and merging of the persisted settings blob.
//!
//! The persistence layer stores one JSON string. Old builds wrote the
//! blob JSON-encoded a second time, so a loaded value that parses to a
//! JSON string is decoded once more. Merging happens per top-level key:
//! object sections shallow-merge loaded fields over default fields,
//! array and scalar sections replace wholesale, and any section that is
//! missing or fails to deserialize falls back to its default.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::Settings;

/// Decode a persisted blob, unwrapping the legacy double encoding.
///
/// Returns `None` when the blob (or the inner string) is not valid JSON.
pub(super) fn decode_blob(blob: &str) -> Option<Value> {
    let value: Value = serde_json::from_str(blob).ok()?;
    match value {
        // Legacy double-encoded blob: a JSON string containing JSON.
        Value::String(inner) => serde_json::from_str(&inner).ok(),
        other => Some(other),
    }
}

/// Merge a loaded settings value over the compiled-in defaults.
pub(super) fn merge_with_defaults(loaded: Value) -> Settings {
    let Value::Object(loaded) = loaded else {
        tracing::warn!("persisted settings root is not an object, using defaults");
        return Settings::default();
    };

    let defaults = Settings::default();
    Settings {
        general: section(&loaded, "general", &defaults.general),
        security: section(&loaded, "security", &defaults.security),
        generator: section(&loaded, "generator", &defaults.generator),
        appearance: section(&loaded, "appearance", &defaults.appearance),
        clipboard: section(&loaded, "clipboard", &defaults.clipboard),
        autofill: section(&loaded, "autofill", &defaults.autofill),
        backup: section(&loaded, "backup", &defaults.backup),
        advanced: section(&loaded, "advanced", &defaults.advanced),
        // Map sections are objects too and merge per key, so default
        // keybindings survive a blob that only overrides some of them.
        vault_overrides: section(&loaded, "vault_overrides", &defaults.vault_overrides),
        site_rules: replace(&loaded, "site_rules", &defaults.site_rules),
        password_presets: replace(&loaded, "password_presets", &defaults.password_presets),
        recent_databases: replace(&loaded, "recent_databases", &defaults.recent_databases),
        keybindings: section(&loaded, "keybindings", &defaults.keybindings),
    }
}

/// Shallow-merge a loaded object section over the default section.
///
/// Field values come from the loaded object where present, from the
/// serialized default otherwise. A section that is absent, not an
/// object, or undeserializable after the merge yields the default.
fn section<T: DeserializeOwned + serde::Serialize + Clone>(
    loaded: &Map<String, Value>,
    key: &str,
    default: &T,
) -> T {
    let Some(Value::Object(loaded_section)) = loaded.get(key) else {
        if loaded.contains_key(key) {
            tracing::warn!(section = key, "persisted section malformed, using defaults");
        }
        return default.clone();
    };

    let mut merged = match serde_json::to_value(default) {
        Ok(Value::Object(map)) => map,
        _ => return default.clone(),
    };
    for (field, value) in loaded_section {
        merged.insert(field.clone(), value.clone());
    }

    match serde_json::from_value(Value::Object(merged)) {
        Ok(section) => section,
        Err(err) => {
            tracing::warn!(section = key, error = %err, "persisted section undeserializable, using defaults");
            default.clone()
        }
    }
}

/// Replace-wholesale semantics for array, map, and scalar sections.
fn replace<T: DeserializeOwned + Clone>(
    loaded: &Map<String, Value>,
    key: &str,
    default: &T,
) -> T {
    match loaded.get(key) {
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(section) => section,
            Err(err) => {
                tracing::warn!(section = key, error = %err, "persisted section undeserializable, using defaults");
                default.clone()
            }
        },
        None => default.clone(),
    }
}
