//! Settings section types and their compiled-in defaults.
//!
//! Every section derives `Deserialize` with `#[serde(default)]` so a
//! partially persisted section still produces a complete struct; the
//! loader in `merge` additionally backfills whole sections that are
//! missing or malformed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// UI theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    /// Light theme
    Light,
    /// Dark theme
    #[default]
    Dark,
    /// Follow the OS preference
    System,
}

/// General application behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// BCP 47 language tag
    pub language: String,
    /// Start with the OS session
    pub launch_at_startup: bool,
    /// Close button minimizes to tray instead of quitting
    pub minimize_to_tray: bool,
    /// Check for updates on launch
    pub check_for_updates: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            language: "en".into(),
            launch_at_startup: false,
            minimize_to_tray: true,
            check_for_updates: true,
        }
    }
}

/// Locking behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Idle minutes before the vault locks itself; 0 disables
    pub auto_lock_minutes: u32,
    /// Lock when the main window is minimized
    pub lock_on_minimize: bool,
    /// Lock when the machine suspends
    pub lock_on_suspend: bool,
    /// Clear the search box when the vault locks
    pub clear_search_on_lock: bool,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            auto_lock_minutes: 15,
            lock_on_minimize: false,
            lock_on_suspend: true,
            clear_search_on_lock: true,
        }
    }
}

/// Password generator defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Generated password length
    pub length: u32,
    /// Include uppercase letters
    pub include_upper: bool,
    /// Include lowercase letters
    pub include_lower: bool,
    /// Include digits
    pub include_digits: bool,
    /// Include punctuation
    pub include_symbols: bool,
    /// Skip visually ambiguous characters (l/1/O/0)
    pub exclude_ambiguous: bool,
    /// Word count for passphrase mode
    pub passphrase_words: u32,
    /// Separator for passphrase mode
    pub passphrase_separator: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            length: 20,
            include_upper: true,
            include_lower: true,
            include_digits: true,
            include_symbols: true,
            exclude_ambiguous: true,
            passphrase_words: 6,
            passphrase_separator: "-".into(),
        }
    }
}

/// Visual appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceSettings {
    /// Theme preference
    pub theme: ThemePreference,
    /// Accent color name
    pub accent: String,
    /// Denser list rows
    pub compact_lists: bool,
    /// Base font size in points
    pub font_size: u8,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            theme: ThemePreference::Dark,
            accent: "indigo".into(),
            compact_lists: false,
            font_size: 14,
        }
    }
}

/// Clipboard hygiene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardSettings {
    /// Seconds until a copied secret is cleared; 0 disables
    pub clear_after_secs: u32,
    /// Clear the clipboard when the vault locks
    pub clear_on_lock: bool,
    /// Clear immediately after the first paste
    pub paste_once: bool,
}

impl Default for ClipboardSettings {
    fn default() -> Self {
        Self {
            clear_after_secs: 30,
            clear_on_lock: true,
            paste_once: false,
        }
    }
}

/// Browser/OS autofill integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutofillSettings {
    /// Whether autofill is offered at all
    pub enabled: bool,
    /// Require the URL scheme to match the stored entry
    pub match_scheme: bool,
    /// Offer entries stored for parent domains
    pub match_subdomains: bool,
}

impl Default for AutofillSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            match_scheme: false,
            match_subdomains: true,
        }
    }
}

/// Automatic database backups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    /// Whether scheduled backups run
    pub enabled: bool,
    /// Target directory; None falls back to the data directory
    pub directory: Option<String>,
    /// How many backup copies to retain
    pub keep_count: u32,
    /// Days between backups
    pub interval_days: u32,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: None,
            keep_count: 5,
            interval_days: 7,
        }
    }
}

/// Escape hatches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Log filter directive (tracing syntax)
    pub log_filter: String,
    /// SQLite busy timeout handed to the backend, in milliseconds
    pub db_busy_timeout_ms: u32,
    /// Opt-in experimental feature names
    pub experimental: Vec<String>,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            db_busy_timeout_ms: 5_000,
            experimental: Vec::new(),
        }
    }
}

/// Per-vault preference overrides, keyed by vault path in the parent map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultOverride {
    /// Override of the global auto-lock interval
    pub auto_lock_minutes: Option<u32>,
    /// Tag selected by default when this vault opens
    pub default_tag: Option<String>,
    /// List sort order override ("title", "updated", ...)
    pub sort_order: Option<String>,
}

/// A per-site rule consulted by autofill and the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteRule {
    /// Host the rule applies to
    pub host: String,
    /// Suppress autofill on this host
    pub never_autofill: bool,
    /// Generator preset to use for this host
    pub generator_preset: Option<String>,
}

impl Default for SiteRule {
    fn default() -> Self {
        Self {
            host: String::new(),
            never_autofill: false,
            generator_preset: None,
        }
    }
}

/// A named generator preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPreset {
    /// Preset name shown in the generator dropdown
    pub name: String,
    /// Password length
    pub length: u32,
    /// Include digits
    pub include_digits: bool,
    /// Include punctuation
    pub include_symbols: bool,
}

impl Default for PasswordPreset {
    fn default() -> Self {
        Self {
            name: String::new(),
            length: 20,
            include_digits: true,
            include_symbols: true,
        }
    }
}

/// Default keybindings, used to seed the `keybindings` section.
pub(crate) fn default_keybindings() -> HashMap<String, String> {
    [
        ("lock", "Ctrl+L"),
        ("search", "Ctrl+F"),
        ("new-item", "Ctrl+N"),
        ("copy-username", "Ctrl+B"),
        ("copy-password", "Ctrl+C"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
