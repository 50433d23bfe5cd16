//! Durable key/value storage port
//!
//! The remote keeps three flat string entries between runs: the access
//! token, its expiry, and the PKCE verifier of the authorization attempt in
//! flight. Every component reaches them through [`KeyValueStore`] so the
//! backend can be swapped (embedded database in the binary, in-memory map in
//! tests).

use crate::error::{Result, SpotRemoteError};
use anyhow::Context;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod embedded;
pub mod memory;

pub use embedded::SledStore;
pub use memory::MemoryStore;

/// Storage key of the current access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key of the access token expiry (milliseconds since the Unix epoch)
pub const EXPIRES_AT_KEY: &str = "expires_at";

/// Storage key of the PKCE verifier for the pending authorization attempt
pub const CODE_VERIFIER_KEY: &str = "code_verifier";

/// Flat string key/value storage shared by every component of the remote
///
/// Implementations must be safe to share across tasks; writes are visible to
/// subsequent reads from any clone of the owning `Arc`.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` when absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Resolves the directory of the embedded database
///
/// Uses `path` when given, otherwise the platform data directory.
///
/// # Errors
///
/// Returns `SpotRemoteError::Storage` if no data directory can be determined
/// or it cannot be created.
pub fn resolve_store_dir(path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }

    let proj_dirs = ProjectDirs::from("com", "spotremote", "spotremote")
        .ok_or_else(|| SpotRemoteError::Storage("Could not determine data directory".into()))?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .context("Failed to create data directory")
        .map_err(|e| SpotRemoteError::Storage(e.to_string()))?;

    Ok(data_dir.join("store"))
}

/// Opens the embedded store at the configured (or default) location
///
/// # Errors
///
/// Returns `SpotRemoteError::Storage` if the database cannot be opened.
pub fn open_store(path: Option<&Path>) -> Result<Arc<dyn KeyValueStore>> {
    let dir = resolve_store_dir(path)?;
    tracing::debug!("Opening key/value store at {}", dir.display());
    Ok(Arc::new(SledStore::open(dir)?))
}
