//! Authorization request construction
//!
//! Starts an authorization attempt: generates a fresh PKCE pair, persists
//! the verifier so it survives the redirect round trip, and returns the
//! provider consent URL. Navigating there is the caller's job.

use std::sync::Arc;
use url::Url;

use crate::auth::pkce;
use crate::config::SpotifyConfig;
use crate::error::{Result, SpotRemoteError};
use crate::storage::{KeyValueStore, CODE_VERIFIER_KEY};

/// Scopes requested on every authorization attempt
pub const SCOPES: &str =
    "streaming user-read-email user-read-private user-read-playback-state user-modify-playback-state";

/// Builds provider authorization URLs for one client registration
pub struct AuthInitiator {
    store: Arc<dyn KeyValueStore>,
    client_id: String,
    redirect_uri: String,
    authorize_endpoint: String,
}

impl AuthInitiator {
    /// Creates an initiator for the client described by `config`
    pub fn new(config: &SpotifyConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            authorize_endpoint: config.authorize_endpoint(),
        }
    }

    /// Starts a new authorization attempt and returns the consent URL
    ///
    /// The verifier is written to storage under `code_verifier` before the
    /// URL is returned, replacing the verifier of any earlier attempt.
    ///
    /// # Errors
    ///
    /// Returns an error when the authorization endpoint is not a valid URL
    /// or the verifier cannot be stored.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use spotremote::auth::initiator::AuthInitiator;
    /// use spotremote::auth::pkce::challenge_for;
    /// use spotremote::config::SpotifyConfig;
    /// use spotremote::storage::{KeyValueStore, MemoryStore, CODE_VERIFIER_KEY};
    ///
    /// # fn main() -> spotremote::error::Result<()> {
    /// let store = Arc::new(MemoryStore::new());
    /// let config = SpotifyConfig { client_id: "abc".into(), ..Default::default() };
    /// let url = AuthInitiator::new(&config, store.clone()).get_auth_url()?;
    ///
    /// let verifier = store.get(CODE_VERIFIER_KEY)?.unwrap();
    /// let challenge = url
    ///     .query_pairs()
    ///     .find(|(k, _)| k == "code_challenge")
    ///     .map(|(_, v)| v.into_owned());
    /// assert_eq!(challenge, Some(challenge_for(&verifier)));
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_auth_url(&self) -> Result<Url> {
        let pkce = pkce::generate()?;

        // Must be durable before the user agent leaves.
        self.store.set(CODE_VERIFIER_KEY, &pkce.verifier)?;

        let mut url = Url::parse(&self.authorize_endpoint).map_err(|e| {
            SpotRemoteError::Config(format!(
                "invalid authorization endpoint {}: {}",
                self.authorize_endpoint, e
            ))
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("code_challenge_method", &pkce.method)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("scope", SCOPES);

        tracing::debug!("Built authorization URL for client {}", self.client_id);
        Ok(url)
    }
}
