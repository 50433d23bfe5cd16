//! OAuth 2.0 authorization code flow with PKCE
//!
//! # Module Layout
//!
//! - [`pkce`]        -- verifier generation and `S256` challenge derivation
//! - [`initiator`]   -- builds the consent URL and persists the verifier
//! - [`exchange`]    -- trades the returned code for an access token
//! - [`token_store`] -- holds the token and enforces its expiry
//! - [`manager`]     -- the bootstrap state machine tying the above together
//! - [`callback`]    -- loopback listener receiving the redirect
//! - [`navigator`]   -- user-agent port (system browser in the binary)

pub mod callback;
pub mod exchange;
pub mod initiator;
pub mod manager;
pub mod navigator;
pub mod pkce;
pub mod token_store;

pub use manager::{AuthManager, AuthState};
pub use navigator::{Navigator, SystemBrowser};
pub use token_store::{AccessToken, TokenStatus, TokenStore};
