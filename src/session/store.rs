//! Session cache storage.
//!
//! One string-keyed map of `"true"`/`"false"` flags behind a poison-safe
//! `RwLock`. Absence is a first-class state distinct from `false`: a missing
//! `liked` entry means "ask the server", a missing `viewed` entry means "no
//! view recorded yet".

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use tracing::warn;

use crate::domain::types::UserId;

use super::keys::{FlagKind, SessionKey};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "session::store";

const TRUE_VALUE: &str = "true";
const FALSE_VALUE: &str = "false";

/// In-memory session flag store.
pub struct SessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store from previously persisted entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Look up a flag. Returns `None` when no entry exists.
    pub fn get(&self, key: &SessionKey) -> Option<bool> {
        let entries = rw_read(&self.entries, SOURCE, "get");
        match entries.get(&key.encode()).map(String::as_str) {
            None => None,
            Some(TRUE_VALUE) => Some(true),
            Some(FALSE_VALUE) => Some(false),
            Some(other) => {
                warn!(
                    key = %key,
                    value = other,
                    "Session entry holds a non-boolean value, treating as absent"
                );
                None
            }
        }
    }

    /// Write a flag, replacing any previous value.
    pub fn set(&self, key: &SessionKey, value: bool) {
        let encoded = if value { TRUE_VALUE } else { FALSE_VALUE };
        rw_write(&self.entries, SOURCE, "set").insert(key.encode(), encoded.to_string());
    }

    /// Atomic check-then-mark: set the flag to `true` only if it is not
    /// already `true`, and report whether this call did the marking.
    ///
    /// The write lock is held across the check and the insert, so two racing
    /// triggers cannot both observe the flag unset.
    pub fn mark_once(&self, key: &SessionKey) -> bool {
        let mut entries = rw_write(&self.entries, SOURCE, "mark_once");
        let encoded = key.encode();
        if entries.get(&encoded).map(String::as_str) == Some(TRUE_VALUE) {
            return false;
        }
        entries.insert(encoded, TRUE_VALUE.to_string());
        true
    }

    /// Remove every `liked`/`viewed` entry belonging to `user`, leaving other
    /// users' entries untouched. Returns the number of entries removed.
    pub fn clear_for_user(&self, user: UserId) -> usize {
        self.remove_matching("clear_for_user", |key| key.user == user)
    }

    /// Remove every `viewed` entry. Returns the number of entries removed.
    pub fn clear_all_viewed(&self) -> usize {
        self.remove_matching("clear_all_viewed", |key| key.kind == FlagKind::Viewed)
    }

    /// Remove every `liked` entry. Returns the number of entries removed.
    pub fn clear_all_liked(&self) -> usize {
        self.remove_matching("clear_all_liked", |key| key.kind == FlagKind::Liked)
    }

    fn remove_matching(&self, op: &'static str, matches: impl Fn(&SessionKey) -> bool) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, op);
        let before = entries.len();
        entries.retain(|raw, _| match SessionKey::parse(raw) {
            Ok(key) => !matches(&key),
            // Not one of our keys; leave it alone.
            Err(_) => true,
        });
        before - entries.len()
    }

    /// Ordered snapshot of all entries, for persistence and display.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        rw_read(&self.entries, SOURCE, "snapshot")
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of entries in the store.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
