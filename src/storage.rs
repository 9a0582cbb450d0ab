//! Client-local key/value store. Every value is a string (JSON for
//! structured blobs) and is read and written wholesale; the whole map is
//! rewritten to one JSON file on every change.

use crate::errors::ClientError;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::BTreeMap,
    env,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::error;

pub const ACCESS_TOKEN: &str = "accessToken";
pub const TOKEN_EXPIRY: &str = "tokenExpiry";
pub const USER: &str = "user";
pub const BUDGETS: &str = "expense_budgets";
pub const RECURRING_EXPENSES: &str = "recurring_expenses";
pub const RECEIPTS: &str = "uploaded_receipts";

pub const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN, USER, TOKEN_EXPIRY];

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/local_store.json")
}

#[derive(Clone, Default)]
pub struct LocalStore {
    path: Option<PathBuf>,
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl LocalStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub async fn open(path: PathBuf) -> Self {
        let entries = load_entries(&path).await;
        Self {
            path: Some(path),
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    /// The in-memory map only changes once the file write succeeded.
    pub async fn set(&self, key: &str, value: impl Into<String>) -> Result<(), ClientError> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.into());
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    pub async fn remove(&self, keys: &[&str]) -> Result<(), ClientError> {
        let mut entries = self.entries.lock().await;
        if !keys.iter().any(|key| entries.contains_key(*key)) {
            return Ok(());
        }
        let mut next = entries.clone();
        for key in keys {
            next.remove(*key);
        }
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    /// Reads a JSON blob. A value that no longer parses is logged and treated
    /// as absent.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                error!("failed to parse stored value for {key}: {err}");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), ClientError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw).await
    }

    pub async fn load_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.get_json(key).await.unwrap_or_default()
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), ClientError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let payload = serde_json::to_vec_pretty(entries)?;
        fs::write(path, payload).await?;
        Ok(())
    }
}

async fn load_entries(path: &Path) -> BTreeMap<String, String> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(err) => {
                error!("failed to parse local store file: {err}");
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read local store file: {err}");
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("expense_store_{tag}_{}_{nanos}.json", std::process::id()))
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let path = temp_path("reopen");
        let store = LocalStore::open(path.clone()).await;
        store.set(ACCESS_TOKEN, "abc").await.unwrap();
        store.set_json(BUDGETS, &vec![1, 2, 3]).await.unwrap();

        let reopened = LocalStore::open(path.clone()).await;
        assert_eq!(reopened.get(ACCESS_TOKEN).await.as_deref(), Some("abc"));
        assert_eq!(reopened.load_list::<i32>(BUDGETS).await, vec![1, 2, 3]);

        let _ = std::fs::remove_file(path);
    }

    /// A store whose file sits under a regular file, so every write fails.
    async fn unwritable(tag: &str) -> (LocalStore, PathBuf) {
        let blocker = temp_path(tag);
        std::fs::write(&blocker, b"not a directory").unwrap();
        (LocalStore::open(blocker.join("store.json")).await, blocker)
    }

    #[tokio::test]
    async fn failed_write_leaves_values_unchanged() {
        let (store, blocker) = unwritable("set").await;
        assert!(store.set(ACCESS_TOKEN, "abc").await.is_err());
        assert!(store.get(ACCESS_TOKEN).await.is_none());
        assert!(store.set_json(BUDGETS, &vec![1]).await.is_err());
        assert!(store.load_list::<i32>(BUDGETS).await.is_empty());

        let _ = std::fs::remove_file(blocker);
    }

    #[tokio::test]
    async fn failed_remove_keeps_keys() {
        let (store, blocker) = unwritable("remove").await;
        store
            .entries
            .lock()
            .await
            .insert(ACCESS_TOKEN.to_string(), "abc".to_string());

        assert!(store.remove(&SESSION_KEYS).await.is_err());
        assert_eq!(store.get(ACCESS_TOKEN).await.as_deref(), Some("abc"));

        let _ = std::fs::remove_file(blocker);
    }

    #[tokio::test]
    async fn corrupt_blob_reads_as_empty() {
        let store = LocalStore::in_memory();
        store.set(RECEIPTS, "{not json").await.unwrap();
        assert!(store.load_list::<String>(RECEIPTS).await.is_empty());
    }

    #[tokio::test]
    async fn remove_clears_session_keys() {
        let store = LocalStore::in_memory();
        for key in SESSION_KEYS {
            store.set(key, "x").await.unwrap();
        }
        store.set(BUDGETS, "[]").await.unwrap();
        store.remove(&SESSION_KEYS).await.unwrap();

        for key in SESSION_KEYS {
            assert!(store.get(key).await.is_none());
        }
        assert!(store.get(BUDGETS).await.is_some());
    }
}
