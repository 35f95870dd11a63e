//! The CRM login gate's persisted local flag.
//!
//! One JSON file holds a logged-in marker plus the operator record shown in
//! the header ("logged in as"). It is read once at board load and is
//! display-only: it carries no authorization weight, which lives with the
//! external auth provider. Logout removes marker and record together.
//!
//! A missing or corrupt file reads as logged-out rather than failing the
//! board.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ErrorCode;

/// Operator record stored alongside the logged-in marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// The state of the login gate as read from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub logged: bool,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

impl Session {
    /// The email to display in the header, when logged in.
    #[must_use]
    pub fn display_email(&self) -> Option<&str> {
        if !self.logged {
            return None;
        }
        self.user.as_ref().map(|u| u.email.as_str())
    }
}

/// File-backed store for the session flag.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store backed by an explicit path. Used by tests and the CLI's
    /// `--session-file` override.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform data directory (`<data_dir>/corral/session.json`).
    pub fn default_location() -> Result<Self> {
        let base = dirs::data_dir().context("no platform data directory")?;
        Ok(Self::at(base.join("corral").join("session.json")))
    }

    /// Read the session. Missing or corrupt files read as logged-out.
    #[must_use]
    pub fn load(&self) -> Session {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Session::default();
        };
        match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(err) => {
                warn!(
                    code = %ErrorCode::SessionCorrupt,
                    path = %self.path.display(), %err,
                    "corrupt session file, treating as logged out"
                );
                Session::default()
            }
        }
    }

    /// Persist a logged-in session for `user`.
    pub fn store(&self, user: &SessionUser) -> Result<()> {
        let session = Session {
            logged: true,
            user: Some(user.clone()),
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!(
                    "{} creating {}",
                    ErrorCode::SessionWriteFailed,
                    parent.display()
                )
            })?;
        }
        let raw = serde_json::to_string_pretty(&session)?;
        fs::write(&self.path, raw).with_context(|| {
            format!(
                "{} writing {}",
                ErrorCode::SessionWriteFailed,
                self.path.display()
            )
        })
    }

    /// Remove marker and record together (logout).
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("removing {}", self.path.display()))
            }
        }
    }

    /// Where this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SessionStore {
        SessionStore::at(dir.path().join("session.json"))
    }

    #[test]
    fn missing_file_reads_logged_out() {
        let dir = TempDir::new().unwrap();
        let session = store_in(&dir).load();
        assert!(!session.logged);
        assert_eq!(session.display_email(), None);
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .store(&SessionUser {
                email: "staff@example.com".to_string(),
                name: "Equipe".to_string(),
            })
            .unwrap();
        let session = store.load();
        assert!(session.logged);
        assert_eq!(session.display_email(), Some("staff@example.com"));
    }

    #[test]
    fn corrupt_file_reads_logged_out() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{not json").unwrap();
        assert!(!store.load().logged);
    }

    #[test]
    fn write_failure_carries_error_code() {
        let dir = TempDir::new().unwrap();
        // A file where a parent directory is needed makes the write fail.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = SessionStore::at(blocker.join("session.json"));
        let err = store
            .store(&SessionUser {
                email: "staff@example.com".to_string(),
                name: String::new(),
            })
            .unwrap_err();
        assert!(format!("{err:#}").contains(ErrorCode::SessionWriteFailed.code()));
    }

    #[test]
    fn clear_removes_marker_and_record() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .store(&SessionUser {
                email: "staff@example.com".to_string(),
                name: String::new(),
            })
            .unwrap();
        store.clear().unwrap();
        assert!(!store.load().logged);
        // Clearing twice is fine.
        store.clear().unwrap();
    }
}
