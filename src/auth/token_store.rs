//! Access token persistence and expiry enforcement
//!
//! The token and its absolute expiry live as two flat entries in the shared
//! [`KeyValueStore`]. Only one token exists at a time; a successful
//! exchange overwrites the previous one. Expired tokens are never handed to
//! callers: reading one logs the user out instead.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use url::Url;

use crate::auth::navigator::Navigator;
use crate::error::{Result, SpotRemoteError};
use crate::storage::{KeyValueStore, ACCESS_TOKEN_KEY, EXPIRES_AT_KEY};

// ---------------------------------------------------------------------------
// AccessToken
// ---------------------------------------------------------------------------

/// An opaque bearer token with its absolute expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer string presented in `Authorization: Bearer <value>`
    pub value: String,

    /// Instant after which the provider rejects the token
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Returns `true` once `now` has reached the expiry instant
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Duration, Utc};
    /// use spotremote::auth::token_store::AccessToken;
    ///
    /// let token = AccessToken {
    ///     value: "tok".to_string(),
    ///     expires_at: Utc::now() - Duration::seconds(1),
    /// };
    /// assert!(token.is_expired_at(Utc::now()));
    /// ```
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Result of inspecting the stored token without side effects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// A token is stored and not yet expired
    Valid(AccessToken),
    /// No token entry exists
    Missing,
    /// A token is stored but its expiry has passed
    Expired,
    /// A token is stored but its expiry is missing or unreadable
    Malformed(String),
}

impl TokenStatus {
    /// The error kind matching a non-valid status, if any
    pub fn as_error(&self) -> Option<SpotRemoteError> {
        match self {
            TokenStatus::Valid(_) => None,
            TokenStatus::Missing => Some(SpotRemoteError::NotAuthenticated),
            TokenStatus::Expired => Some(SpotRemoteError::TokenExpired),
            TokenStatus::Malformed(reason) => Some(SpotRemoteError::TokenMalformed(reason.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// TokenStore
// ---------------------------------------------------------------------------

/// Process-wide holder of the current access token
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chrono::{Duration, Utc};
/// use spotremote::auth::token_store::TokenStore;
/// use spotremote::storage::MemoryStore;
///
/// # fn main() -> spotremote::error::Result<()> {
/// let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
/// tokens.set("T", Utc::now() + Duration::hours(1))?;
/// assert_eq!(tokens.get()?.map(|t| t.value), Some("T".to_string()));
///
/// tokens.clear()?;
/// assert!(tokens.get()?.is_none());
/// # Ok(())
/// # }
/// ```
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
    logout_redirect: Option<(Arc<dyn Navigator>, Url)>,
}

impl TokenStore {
    /// Creates a token store over `store` with no logout redirect
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            logout_redirect: None,
        }
    }

    /// Navigate to `root` whenever the store logs the user out
    pub fn with_logout_redirect(mut self, navigator: Arc<dyn Navigator>, root: Url) -> Self {
        self.logout_redirect = Some((navigator, root));
        self
    }

    /// Inspects the stored token without modifying anything
    ///
    /// # Errors
    ///
    /// Returns an error only when the underlying storage fails.
    pub fn lookup(&self) -> Result<TokenStatus> {
        let value = match self.store.get(ACCESS_TOKEN_KEY)? {
            Some(v) if !v.is_empty() => v,
            _ => return Ok(TokenStatus::Missing),
        };

        let raw_expiry = match self.store.get(EXPIRES_AT_KEY)? {
            Some(raw) => raw,
            None => return Ok(TokenStatus::Malformed("expiry missing".to_string())),
        };

        let expires_at = match raw_expiry
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
        {
            Some(at) => at,
            None => {
                return Ok(TokenStatus::Malformed(format!(
                    "unreadable expiry {:?}",
                    raw_expiry
                )))
            }
        };

        let token = AccessToken { value, expires_at };
        if token.is_expired_at(Utc::now()) {
            Ok(TokenStatus::Expired)
        } else {
            Ok(TokenStatus::Valid(token))
        }
    }

    /// Returns the current token, or `None` when there is no usable token
    ///
    /// An expired or malformed entry triggers [`TokenStore::logout`] before
    /// `None` is returned, so no stale token entry is left behind.
    ///
    /// # Errors
    ///
    /// Returns an error only when the underlying storage fails.
    pub fn get(&self) -> Result<Option<AccessToken>> {
        match self.lookup()? {
            TokenStatus::Valid(token) => Ok(Some(token)),
            TokenStatus::Missing => Ok(None),
            status @ (TokenStatus::Expired | TokenStatus::Malformed(_)) => {
                if let Some(err) = status.as_error() {
                    tracing::info!("Discarding stored token: {}", err);
                }
                self.logout()?;
                Ok(None)
            }
        }
    }

    /// Stores `token` with its absolute expiry, replacing any previous token
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying storage fails.
    pub fn set(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, token)?;
        self.store
            .set(EXPIRES_AT_KEY, &expires_at.timestamp_millis().to_string())?;
        tracing::debug!("Stored access token expiring at {}", expires_at);
        Ok(())
    }

    /// Removes the token and its expiry
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying storage fails.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(EXPIRES_AT_KEY)?;
        Ok(())
    }

    /// Clears the token and sends the user agent back to the application root
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying storage fails.
    pub fn logout(&self) -> Result<()> {
        self.clear()?;
        if let Some((navigator, root)) = &self.logout_redirect {
            navigator.navigate(root);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::navigator::MockNavigator;
    use crate::storage::MemoryStore;
    use chrono::Duration;

    fn store_with(token: Option<&str>, expiry: Option<&str>) -> (Arc<MemoryStore>, TokenStore) {
        let kv = Arc::new(MemoryStore::new());
        if let Some(t) = token {
            kv.set(ACCESS_TOKEN_KEY, t).unwrap();
        }
        if let Some(e) = expiry {
            kv.set(EXPIRES_AT_KEY, e).unwrap();
        }
        let tokens = TokenStore::new(kv.clone());
        (kv, tokens)
    }

    #[test]
    fn test_lookup_missing_when_empty() {
        let (_kv, tokens) = store_with(None, None);
        assert_eq!(tokens.lookup().unwrap(), TokenStatus::Missing);
    }

    #[test]
    fn test_lookup_malformed_without_expiry() {
        let (_kv, tokens) = store_with(Some("T"), None);
        assert!(matches!(
            tokens.lookup().unwrap(),
            TokenStatus::Malformed(_)
        ));
    }

    #[test]
    fn test_lookup_malformed_with_garbage_expiry() {
        let (_kv, tokens) = store_with(Some("T"), Some("tomorrow"));
        assert!(matches!(
            tokens.lookup().unwrap(),
            TokenStatus::Malformed(_)
        ));
    }

    #[test]
    fn test_lookup_expired_for_past_expiry() {
        let past = (Utc::now() - Duration::seconds(5)).timestamp_millis().to_string();
        let (_kv, tokens) = store_with(Some("T"), Some(&past));
        assert_eq!(tokens.lookup().unwrap(), TokenStatus::Expired);
    }

    #[test]
    fn test_set_then_get_returns_token() {
        let (_kv, tokens) = store_with(None, None);
        let expires_at = Utc::now() + Duration::hours(1);
        tokens.set("T", expires_at).unwrap();

        let token = tokens.get().unwrap().expect("token should be valid");
        assert_eq!(token.value, "T");
        assert_eq!(
            token.expires_at.timestamp_millis(),
            expires_at.timestamp_millis()
        );
    }

    #[test]
    fn test_set_overwrites_previous_token() {
        let (_kv, tokens) = store_with(None, None);
        tokens.set("old", Utc::now() + Duration::hours(1)).unwrap();
        tokens.set("new", Utc::now() + Duration::hours(1)).unwrap();
        assert_eq!(tokens.get().unwrap().unwrap().value, "new");
    }

    #[test]
    fn test_get_expired_clears_entries() {
        let past = (Utc::now() - Duration::seconds(5)).timestamp_millis().to_string();
        let (kv, tokens) = store_with(Some("T"), Some(&past));

        assert!(tokens.get().unwrap().is_none());
        assert!(kv.get(ACCESS_TOKEN_KEY).unwrap().is_none());
        assert!(kv.get(EXPIRES_AT_KEY).unwrap().is_none());
    }

    #[test]
    fn test_get_expired_navigates_to_root() {
        let past = (Utc::now() - Duration::seconds(5)).timestamp_millis().to_string();
        let (kv, _) = store_with(Some("T"), Some(&past));
        let root = Url::parse("http://127.0.0.1:8888/callback").unwrap();

        let mut navigator = MockNavigator::new();
        let expected = root.clone();
        navigator
            .expect_navigate()
            .withf(move |url| *url == expected)
            .times(1)
            .return_const(());

        let tokens = TokenStore::new(kv).with_logout_redirect(Arc::new(navigator), root);
        assert!(tokens.get().unwrap().is_none());
    }

    #[test]
    fn test_get_missing_does_not_navigate() {
        let kv = Arc::new(MemoryStore::new());
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate().times(0);

        let tokens = TokenStore::new(kv).with_logout_redirect(
            Arc::new(navigator),
            Url::parse("http://127.0.0.1:8888/").unwrap(),
        );
        assert!(tokens.get().unwrap().is_none());
    }

    #[test]
    fn test_status_error_kinds() {
        assert!(TokenStatus::Missing.as_error().is_some());
        assert!(matches!(
            TokenStatus::Expired.as_error(),
            Some(SpotRemoteError::TokenExpired)
        ));
        assert!(matches!(
            TokenStatus::Malformed("x".into()).as_error(),
            Some(SpotRemoteError::TokenMalformed(_))
        ));
    }
}
