use crate::models::settings::TrackerConfig;

/// Current storage schema version.
///
/// Bumping it moves every key to a fresh namespace; data under older
/// versions is orphaned rather than migrated.
pub const CURRENT_VERSION: u16 = 1;

/// Namespaced storage keys:
///
/// ```text
/// <namespace>:v<version>:transactions   JSON array of transactions
/// <namespace>:v<version>:prefs          JSON object { theme }
/// <namespace>:v<version>:budget         JSON number (0 = no budget)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub transactions: String,
    pub preferences: String,
    pub budget: String,
}

impl StorageKeys {
    pub fn new(namespace: &str, version: u16) -> Self {
        let prefix = format!("{namespace}:v{version}");
        Self {
            transactions: format!("{prefix}:transactions"),
            preferences: format!("{prefix}:prefs"),
            budget: format!("{prefix}:budget"),
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(&config.namespace, config.storage_version)
    }

    /// Every key owned by this namespace/version.
    pub fn all(&self) -> [&str; 3] {
        [&self.transactions, &self.preferences, &self.budget]
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}
