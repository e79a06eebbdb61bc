//! # Settings Model
//!
//! The full user configuration as a fixed set of named sections. The
//! invariant the rest of the app relies on: after loading, every section
//! is present and well-formed, whatever the persisted blob looked like —
//! missing sections, unknown fields, a malformed blob, or the legacy
//! double-encoded variant all degrade to defaults per top-level key,
//! never to an error.

mod merge;
mod sections;

pub use sections::{
    AdvancedSettings, AppearanceSettings, AutofillSettings, BackupSettings, ClipboardSettings,
    GeneralSettings, GeneratorSettings, PasswordPreset, SecuritySettings, SiteRule,
    ThemePreference, VaultOverride,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How many entries the recent-database list retains.
pub const RECENT_DATABASES_LIMIT: usize = 10;

/// All user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// General application behavior
    pub general: GeneralSettings,
    /// Locking behavior
    pub security: SecuritySettings,
    /// Password generator defaults
    pub generator: GeneratorSettings,
    /// Visual appearance
    pub appearance: AppearanceSettings,
    /// Clipboard hygiene
    pub clipboard: ClipboardSettings,
    /// Autofill integration
    pub autofill: AutofillSettings,
    /// Scheduled backups
    pub backup: BackupSettings,
    /// Escape hatches
    pub advanced: AdvancedSettings,
    /// Per-vault overrides, keyed by vault path
    pub vault_overrides: HashMap<String, VaultOverride>,
    /// Per-site autofill/generator rules
    pub site_rules: Vec<SiteRule>,
    /// Named generator presets
    pub password_presets: Vec<PasswordPreset>,
    /// Recently opened database paths, most recent first
    pub recent_databases: Vec<String>,
    /// Action name → key chord
    pub keybindings: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            security: SecuritySettings::default(),
            generator: GeneratorSettings::default(),
            appearance: AppearanceSettings::default(),
            clipboard: ClipboardSettings::default(),
            autofill: AutofillSettings::default(),
            backup: BackupSettings::default(),
            advanced: AdvancedSettings::default(),
            vault_overrides: HashMap::new(),
            site_rules: Vec::new(),
            password_presets: Vec::new(),
            recent_databases: Vec::new(),
            keybindings: sections::default_keybindings(),
        }
    }
}

impl Settings {
    /// Build settings from a persisted blob.
    ///
    /// Parses the blob (decoding the legacy double-encoded form if
    /// present) and merges it over the compiled-in defaults section by
    /// section. Any unusable part falls back to its default; this never
    /// fails.
    pub fn from_persisted(blob: &str) -> Self {
        match merge::decode_blob(blob) {
            Some(loaded) => merge::merge_with_defaults(loaded),
            None => {
                tracing::warn!("persisted settings unparseable, using defaults");
                Self::default()
            }
        }
    }

    /// Record `path` as the most recently opened database.
    ///
    /// Moves an existing entry to the front instead of duplicating it
    /// and bounds the list at [`RECENT_DATABASES_LIMIT`].
    pub fn push_recent_database(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.recent_databases.retain(|p| p != &path);
        self.recent_databases.insert(0, path);
        self.recent_databases.truncate(RECENT_DATABASES_LIMIT);
    }

    /// Effective auto-lock interval for a vault, honoring its override.
    pub fn auto_lock_minutes_for(&self, vault_path: &str) -> u32 {
        self.vault_overrides
            .get(vault_path)
            .and_then(|o| o.auto_lock_minutes)
            .unwrap_or(self.security.auto_lock_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_every_section() {
        let settings = Settings::default();
        assert_eq!(settings.general.language, "en");
        assert_eq!(settings.security.auto_lock_minutes, 15);
        assert_eq!(settings.generator.length, 20);
        assert_eq!(settings.appearance.theme, ThemePreference::Dark);
        assert!(!settings.keybindings.is_empty());
    }

    #[test]
    fn test_push_recent_database_dedupes_and_bounds() {
        let mut settings = Settings::default();
        settings.push_recent_database("/a.kdb");
        settings.push_recent_database("/b.kdb");
        settings.push_recent_database("/a.kdb");
        assert_eq!(settings.recent_databases, vec!["/a.kdb", "/b.kdb"]);

        for i in 0..20 {
            settings.push_recent_database(format!("/v{i}.kdb"));
        }
        assert_eq!(settings.recent_databases.len(), RECENT_DATABASES_LIMIT);
        assert_eq!(settings.recent_databases[0], "/v19.kdb");
    }

    #[test]
    fn test_vault_override_lookup() {
        let mut settings = Settings::default();
        settings.vault_overrides.insert(
            "/work.kdb".into(),
            VaultOverride {
                auto_lock_minutes: Some(5),
                ..VaultOverride::default()
            },
        );

        assert_eq!(settings.auto_lock_minutes_for("/work.kdb"), 5);
        assert_eq!(settings.auto_lock_minutes_for("/other.kdb"), 15);
    }
}
