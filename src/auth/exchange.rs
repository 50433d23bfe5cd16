//! Authorization code exchange
//!
//! Runs when the user agent comes back to the application root carrying a
//! `code` query parameter. The code is single-use: a failed exchange is
//! never retried with the same code; all local auth state is cleared so the
//! next attempt starts from a fresh verifier.

use chrono::{TimeDelta, Utc};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use crate::auth::token_store::{AccessToken, TokenStore};
use crate::config::SpotifyConfig;
use crate::error::{Result, SpotRemoteError};
use crate::storage::{KeyValueStore, CODE_VERIFIER_KEY};

/// Token lifetime assumed when the endpoint omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Raw JSON response from the token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl TokenResponse {
    /// Fails when `expires_in` lands past the representable date range
    fn into_access_token(self) -> Result<AccessToken> {
        let secs = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at = i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                SpotRemoteError::TokenExchange(format!("expires_in out of range: {secs}"))
            })?;
        Ok(AccessToken {
            value: self.access_token,
            expires_at,
        })
    }
}

/// A completed exchange
#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    /// The token now held by the token store
    pub token: AccessToken,

    /// The location with the consumed `code` removed
    pub location: Url,
}

/// Returns the `code` query parameter of `location`, if any
pub fn authorization_code(location: &Url) -> Option<String> {
    location
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .filter(|code| !code.is_empty())
}

/// Returns the `error` query parameter the provider sends on denial, if any
pub fn authorization_error(location: &Url) -> Option<String> {
    location
        .query_pairs()
        .find(|(k, _)| k == "error")
        .map(|(_, v)| v.into_owned())
}

/// Returns `location` without its `code` parameter
///
/// Other query parameters are kept in order; an empty query is dropped
/// entirely.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use spotremote::auth::exchange::strip_code;
///
/// let url = Url::parse("http://127.0.0.1:8888/callback?code=abc&lang=en").unwrap();
/// assert_eq!(strip_code(&url).as_str(), "http://127.0.0.1:8888/callback?lang=en");
///
/// let url = Url::parse("http://127.0.0.1:8888/callback?code=abc").unwrap();
/// assert_eq!(strip_code(&url).as_str(), "http://127.0.0.1:8888/callback");
/// ```
pub fn strip_code(location: &Url) -> Url {
    let kept: Vec<(String, String)> = location
        .query_pairs()
        .filter(|(k, _)| k != "code")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut stripped = location.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}

/// Exchanges authorization codes for access tokens
pub struct TokenExchanger {
    http: Arc<reqwest::Client>,
    store: Arc<dyn KeyValueStore>,
    tokens: Arc<TokenStore>,
    client_id: String,
    redirect_uri: String,
    token_endpoint: String,
}

impl TokenExchanger {
    /// Creates an exchanger for the client described by `config`
    pub fn new(
        http: Arc<reqwest::Client>,
        config: &SpotifyConfig,
        store: Arc<dyn KeyValueStore>,
        tokens: Arc<TokenStore>,
    ) -> Self {
        Self {
            http,
            store,
            tokens,
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            token_endpoint: config.token_endpoint(),
        }
    }

    /// Exchanges the `code` carried by `location` for an access token
    ///
    /// On success the token is written to the token store, the verifier is
    /// discarded, and the returned location no longer carries `code`.
    ///
    /// # Errors
    ///
    /// - [`SpotRemoteError::TokenExchange`] when `location` has no code, the
    ///   endpoint is unreachable, returns a non-success status, or returns a
    ///   body without `access_token` or with an unusable `expires_in`.
    /// - [`SpotRemoteError::MissingVerifier`] when no verifier is stored.
    ///
    /// Every failure clears the stored token and verifier first.
    pub async fn exchange(&self, location: &Url) -> Result<ExchangeOutcome> {
        match self.try_exchange(location).await {
            Ok(token) => {
                self.tokens.set(&token.value, token.expires_at)?;
                self.store.remove(CODE_VERIFIER_KEY)?;
                tracing::info!("Authorization code exchanged; token valid until {}", token.expires_at);
                Ok(ExchangeOutcome {
                    token,
                    location: strip_code(location),
                })
            }
            Err(e) => {
                tracing::error!("Token exchange failed: {}", e);
                self.reset()?;
                Err(e)
            }
        }
    }

    async fn try_exchange(&self, location: &Url) -> Result<AccessToken> {
        let code = authorization_code(location).ok_or_else(|| {
            SpotRemoteError::TokenExchange("no authorization code in location".to_string())
        })?;

        let verifier = self
            .store
            .get(CODE_VERIFIER_KEY)?
            .filter(|v| !v.is_empty())
            .ok_or(SpotRemoteError::MissingVerifier)?;

        let params = [
            ("client_id", self.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code_verifier", verifier.as_str()),
        ];

        let resp = self
            .http
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                SpotRemoteError::TokenExchange(format!("token exchange request failed: {e}"))
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SpotRemoteError::TokenExchange(format!(
                "token endpoint returned {status}: {body}"
            ))
            .into());
        }

        let raw: TokenResponse = resp.json().await.map_err(|e| {
            SpotRemoteError::TokenExchange(format!("failed to parse token response: {e}"))
        })?;

        if raw.access_token.is_empty() {
            return Err(
                SpotRemoteError::TokenExchange("token response has empty access_token".into())
                    .into(),
            );
        }

        raw.into_access_token()
    }

    /// Clears every piece of local auth state
    fn reset(&self) -> Result<()> {
        self.tokens.clear()?;
        self.store.remove(CODE_VERIFIER_KEY)?;
        Ok(())
    }
}
