//! Authorization bootstrap state machine
//!
//! [`AuthManager::resume`] decides what to do with the current location of
//! the user agent:
//!
//! 1. A valid stored token wins; nothing else happens.
//! 2. No `code` parameter: start a new attempt and navigate to consent.
//! 3. A `code` parameter: exchange it. Success drops `code` from the
//!    location; failure clears all local state and navigates back to the
//!    application root, which starts over at step 2.
//!
//! Nothing here is retried with the same code.

use std::sync::Arc;
use url::Url;

use crate::auth::callback::RedirectListener;
use crate::auth::exchange::{authorization_code, authorization_error, TokenExchanger};
use crate::auth::initiator::AuthInitiator;
use crate::auth::navigator::Navigator;
use crate::auth::token_store::{AccessToken, TokenStore};
use crate::config::Config;
use crate::error::{Result, SpotRemoteError};
use crate::storage::{KeyValueStore, CODE_VERIFIER_KEY};

/// Authorization attempts [`AuthManager::login`] makes before giving up
pub const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Where the flow stands after one [`AuthManager::resume`] step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// A usable token is stored
    Authenticated(AccessToken),
    /// The user agent was sent to the consent page at this URL
    AwaitingRedirect(Url),
    /// The exchange failed; local state is cleared and the user agent was
    /// sent back to the application root
    Restarted,
}

/// Coordinates initiator, exchanger and token store
pub struct AuthManager {
    initiator: AuthInitiator,
    exchanger: TokenExchanger,
    tokens: Arc<TokenStore>,
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    root: Url,
}

impl AuthManager {
    /// Wires the authorization components over shared storage
    ///
    /// # Errors
    ///
    /// Returns [`SpotRemoteError::Config`] if the redirect URI is invalid.
    pub fn new(
        config: &Config,
        http: Arc<reqwest::Client>,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let root = config.redirect_url()?;
        let tokens = Arc::new(
            TokenStore::new(Arc::clone(&store))
                .with_logout_redirect(Arc::clone(&navigator), root.clone()),
        );
        let initiator = AuthInitiator::new(&config.spotify, Arc::clone(&store));
        let exchanger = TokenExchanger::new(
            http,
            &config.spotify,
            Arc::clone(&store),
            Arc::clone(&tokens),
        );

        Ok(Self {
            initiator,
            exchanger,
            tokens,
            store,
            navigator,
            root,
        })
    }

    /// The shared token store
    pub fn tokens(&self) -> Arc<TokenStore> {
        Arc::clone(&self.tokens)
    }

    /// The application root (the configured redirect URI)
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Advances the flow by one step for the user agent at `location`
    ///
    /// # Errors
    ///
    /// - [`SpotRemoteError::AuthorizationDenied`] when the provider
    ///   redirected back with `error=...`.
    /// - Storage failures.
    ///
    /// Exchange failures are not errors here; they yield
    /// [`AuthState::Restarted`].
    pub async fn resume(&self, location: &Url) -> Result<AuthState> {
        if let Some(token) = self.tokens.get()? {
            return Ok(AuthState::Authenticated(token));
        }

        if let Some(error) = authorization_error(location) {
            self.store.remove(CODE_VERIFIER_KEY)?;
            return Err(SpotRemoteError::AuthorizationDenied(error).into());
        }

        if authorization_code(location).is_none() {
            let url = self.initiator.get_auth_url()?;
            tracing::info!("No stored token; starting authorization");
            self.navigator.navigate(&url);
            return Ok(AuthState::AwaitingRedirect(url));
        }

        match self.exchanger.exchange(location).await {
            Ok(outcome) => {
                self.navigator.replace_location(&outcome.location);
                Ok(AuthState::Authenticated(outcome.token))
            }
            Err(e) => {
                tracing::warn!("Restarting authorization after failed exchange: {}", e);
                self.navigator.navigate(&self.root);
                Ok(AuthState::Restarted)
            }
        }
    }

    /// Runs the flow to completion, receiving redirects on `listener`
    ///
    /// # Errors
    ///
    /// Returns [`SpotRemoteError::TokenExchange`] after
    /// [`MAX_LOGIN_ATTEMPTS`] failed attempts, or any error from
    /// [`AuthManager::resume`] and the listener.
    pub async fn login(&self, listener: &RedirectListener) -> Result<AccessToken> {
        let mut location = self.root.clone();
        let mut attempts = 0u32;

        loop {
            match self.resume(&location).await? {
                AuthState::Authenticated(token) => return Ok(token),
                AuthState::AwaitingRedirect(_) => {
                    attempts += 1;
                    location = listener.accept().await?;
                }
                AuthState::Restarted => {
                    if attempts >= MAX_LOGIN_ATTEMPTS {
                        return Err(SpotRemoteError::TokenExchange(format!(
                            "gave up after {attempts} authorization attempts"
                        ))
                        .into());
                    }
                    location = self.root.clone();
                }
            }
        }
    }

    /// Clears the stored token and returns the user agent to the root
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying storage fails.
    pub fn logout(&self) -> Result<()> {
        self.store.remove(CODE_VERIFIER_KEY)?;
        self.tokens.logout()
    }
}
