use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Colour theme preference. Applying it is the host's job; the core only
/// persists the choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// User preferences, stored under their own key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
}

/// Static configuration of a tracker instance.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Namespace prefix for every storage key (e.g., "myExpenseTracker").
    pub namespace: String,

    /// Storage schema version; keys of other versions are never read.
    pub storage_version: u16,

    /// Prefix of exported CSV file names.
    pub export_prefix: String,

    /// How long a deleted transaction can be restored.
    pub undo_window: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            namespace: "myExpenseTracker".to_string(),
            storage_version: crate::storage::keys::CURRENT_VERSION,
            export_prefix: "myexpense".to_string(),
            undo_window: Duration::from_secs(5),
        }
    }
}
