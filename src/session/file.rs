//! Session file persistence.
//!
//! The process-based stand-in for a browser tab's session storage: one JSON
//! document holding the session identity, the current viewer (if any), and
//! the interaction flag entries. The document survives process restarts
//! within a logical session; logout empties it for the departing user.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::domain::types::UserId;

use super::store::SessionStore;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to access session file: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file is not valid JSON: {0}")]
    Malformed(String),
}

/// Persisted session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDocument {
    /// Identity of this session, assigned when the file is first created.
    pub session_id: Uuid,
    /// The current viewer, set by `login` and cleared by `logout`.
    pub user: Option<UserId>,
    /// Interaction flag entries, in storage-key layout.
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

impl SessionDocument {
    /// Start a fresh session with no viewer and no flags.
    pub fn fresh() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user: None,
            entries: BTreeMap::new(),
        }
    }

    /// Load the session document, or start a fresh one when no file exists.
    pub async fn load(path: &Path) -> Result<Self, SessionError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let doc: Self = serde_json::from_slice(&bytes)
                    .map_err(|err| SessionError::Malformed(err.to_string()))?;
                debug!(
                    session_id = %doc.session_id,
                    entries = doc.entries.len(),
                    path = %path.display(),
                    "Loaded session file"
                );
                Ok(doc)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let doc = Self::fresh();
                debug!(
                    session_id = %doc.session_id,
                    path = %path.display(),
                    "No session file found, starting a fresh session"
                );
                Ok(doc)
            }
            Err(err) => Err(SessionError::Io(err)),
        }
    }

    /// Write the session document, creating the parent directory if needed.
    pub async fn persist(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(self)
            .map_err(|err| SessionError::Malformed(err.to_string()))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Build a store from this document's entries.
    pub fn open_store(&self) -> SessionStore {
        SessionStore::from_entries(self.entries.clone())
    }

    /// Fold a store's current entries back into the document.
    pub fn absorb(&mut self, store: &SessionStore) {
        self.entries = store.snapshot();
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::types::PostId;
    use crate::session::keys::SessionKey;

    use super::*;

    #[tokio::test]
    async fn missing_file_yields_fresh_session() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("session.json");

        let doc = SessionDocument::load(&path).await.expect("fresh session");
        assert!(doc.user.is_none());
        assert!(doc.entries.is_empty());
    }

    #[tokio::test]
    async fn persist_and_reload_round_trips() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("nested").join("session.json");

        let mut doc = SessionDocument::fresh();
        doc.user = Some(UserId(7));
        let store = doc.open_store();
        store.set(&SessionKey::liked(PostId(42), UserId(7)), true);
        doc.absorb(&store);
        doc.persist(&path).await.expect("persist");

        let reloaded = SessionDocument::load(&path).await.expect("reload");
        assert_eq!(reloaded.session_id, doc.session_id);
        assert_eq!(reloaded.user, Some(UserId(7)));
        assert_eq!(
            reloaded.entries.get("liked_post_42_user_7").map(String::as_str),
            Some("true")
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_reported_not_discarded() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, b"not json").await.expect("write");

        let err = SessionDocument::load(&path).await.expect_err("malformed");
        assert!(matches!(err, SessionError::Malformed(_)));
    }
}
