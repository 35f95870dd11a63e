//! Configuration, TOML on disk.
//!
//! ```toml
//! [writeback]
//! policy = "retry"        # or "swallow"
//! max_attempts = 3
//! backoff_ms = 250
//!
//! [view]
//! default_filter = "Todos"   # or a status label, e.g. "Em Progresso"
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::view::StatusFilter;
use crate::writeback::WriteBackPolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorralConfig {
    #[serde(default)]
    pub writeback: WriteBackSettings,
    #[serde(default)]
    pub view: ViewSettings,
}

impl CorralConfig {
    /// Load from a TOML file. The file must exist and parse.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| {
            format!(
                "{} parsing config {}",
                ErrorCode::ConfigParseError,
                path.display()
            )
        })
    }

    /// Load from a TOML file, falling back to defaults when absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// How to name the write-back policy in config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Swallow,
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteBackSettings {
    #[serde(default)]
    pub policy: PolicyKind,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for WriteBackSettings {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl WriteBackSettings {
    /// The policy these settings describe.
    #[must_use]
    pub const fn policy(&self) -> WriteBackPolicy {
        match self.policy {
            PolicyKind::Swallow => WriteBackPolicy::Swallow,
            PolicyKind::Retry => WriteBackPolicy::Retry {
                max_attempts: self.max_attempts,
                initial_backoff: Duration::from_millis(self.backoff_ms),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Initial filter label: `"Todos"` or a status wire label.
    #[serde(default = "default_filter_label")]
    pub default_filter: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            default_filter: default_filter_label(),
        }
    }
}

impl ViewSettings {
    /// Resolve the configured label. Unknown labels fall back to all.
    #[must_use]
    pub fn filter(&self) -> StatusFilter {
        self.default_filter
            .parse()
            .map_or(StatusFilter::All, StatusFilter::Only)
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    250
}

fn default_filter_label() -> String {
    "Todos".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lead::Status;

    #[test]
    fn defaults_are_swallow_and_all() {
        let config = CorralConfig::default();
        assert_eq!(config.writeback.policy(), WriteBackPolicy::Swallow);
        assert_eq!(config.view.filter(), StatusFilter::All);
    }

    #[test]
    fn retry_settings_map_to_policy() {
        let config: CorralConfig = toml::from_str(
            "[writeback]\npolicy = \"retry\"\nmax_attempts = 5\nbackoff_ms = 10\n",
        )
        .unwrap();
        assert_eq!(
            config.writeback.policy(),
            WriteBackPolicy::Retry {
                max_attempts: 5,
                initial_backoff: Duration::from_millis(10),
            }
        );
    }

    #[test]
    fn partial_tables_fill_with_defaults() {
        let config: CorralConfig = toml::from_str("[writeback]\npolicy = \"retry\"\n").unwrap();
        assert_eq!(config.writeback.max_attempts, 3);
        assert_eq!(config.writeback.backoff_ms, 250);
    }

    #[test]
    fn view_filter_parses_status_label() {
        let config: CorralConfig =
            toml::from_str("[view]\ndefault_filter = \"Em Progresso\"\n").unwrap();
        assert_eq!(config.view.filter(), StatusFilter::Only(Status::InProgress));
    }

    #[test]
    fn unknown_filter_label_falls_back_to_all() {
        let config: CorralConfig = toml::from_str("[view]\ndefault_filter = \"Aberto\"\n").unwrap();
        assert_eq!(config.view.filter(), StatusFilter::All);
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = CorralConfig::load_or_default(Path::new("/nonexistent/corral.toml")).unwrap();
        assert_eq!(config, CorralConfig::default());
    }

    #[test]
    fn load_rejects_bad_toml_with_error_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("corral.toml");
        std::fs::write(&path, "[writeback\npolicy = ???").unwrap();
        let err = CorralConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains(ErrorCode::ConfigParseError.code()));
    }
}
