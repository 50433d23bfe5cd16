//! Embedded database backend for the key/value storage port

use super::KeyValueStore;
use crate::error::{Result, SpotRemoteError};
use sled::Db;
use std::path::Path;

/// Key/value store persisted in an embedded `sled` database
///
/// Every write is flushed before returning so the PKCE verifier survives the
/// process exiting between the authorization redirect and the exchange.
///
/// # Examples
///
/// ```
/// use spotremote::storage::{KeyValueStore, SledStore};
///
/// # fn main() -> spotremote::error::Result<()> {
/// let dir = tempfile::tempdir()?;
/// let store = SledStore::open(dir.path().join("store"))?;
/// store.set("code_verifier", "abc")?;
/// assert_eq!(store.get("code_verifier")?, Some("abc".to_string()));
/// # Ok(())
/// # }
/// ```
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open or create a store at `path`
    ///
    /// # Errors
    ///
    /// Returns `SpotRemoteError::Storage` if the database cannot be opened
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| SpotRemoteError::Storage(format!("Failed to open database: {}", e)))?;
        Ok(Self { db })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self
            .db
            .get(key.as_bytes())
            .map_err(|e| SpotRemoteError::Storage(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let value = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    SpotRemoteError::Storage(format!("Value for {} is not UTF-8: {}", key, e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| SpotRemoteError::Storage(format!("Insert failed: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| SpotRemoteError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| SpotRemoteError::Storage(format!("Remove failed: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| SpotRemoteError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }
}
