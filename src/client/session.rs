use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::dto::PublicUser;

/// A logged-in candidate: the bearer token and who it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage failed: {0}")]
    Io(#[from] io::Error),
    #[error("session could not be encoded: {0}")]
    Format(#[from] serde_json::Error),
}

pub trait SessionStore: Send + Sync {
    fn get(&self) -> Result<Option<Session>, SessionError>;
    fn set(&self, session: &Session) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    current: Mutex<Option<Session>>,
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.current.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn set(&self, session: &Session) -> Result<(), SessionError> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).take();
        Ok(())
    }
}

/// Keeps the session as a JSON file so it survives restarts.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SessionStore for FileSessionStore {
    /// A missing file means logged out; an unreadable one is discarded.
    fn get(&self) -> Result<Option<Session>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "discarding corrupt session");
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn set(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            token: "tok".into(),
            user: PublicUser {
                id: 7,
                name: "Neha".into(),
                email: "neha@rft.com".into(),
            },
        }
    }

    #[test]
    fn memory_store_set_and_clear() {
        let store = MemorySessionStore::default();
        assert_eq!(store.get().unwrap(), None);
        store.set(&session()).unwrap();
        assert_eq!(store.get().unwrap(), Some(session()));
        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileSessionStore::new(&path).set(&session()).unwrap();
        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.get().unwrap(), Some(session()));

        reopened.clear().unwrap();
        assert!(!path.exists());
        reopened.clear().unwrap();
        assert_eq!(reopened.get().unwrap(), None);
    }

    #[test]
    fn corrupt_session_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert_eq!(store.get().unwrap(), None);
        assert!(!path.exists());
    }
}
