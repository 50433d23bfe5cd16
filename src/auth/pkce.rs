//! PKCE S256 verifier and challenge generation
//!
//! This module implements the Proof Key for Code Exchange (PKCE) extension
//! to OAuth 2.0 as defined in RFC 7636, using the `S256` challenge method
//! the provider requires.
//!
//! # How PKCE works
//!
//! 1. The client generates a high-entropy random string called the `code_verifier`.
//! 2. The client computes a SHA-256 hash of the verifier and base64url-encodes
//!    it (no padding) to produce the `code_challenge`.
//! 3. The authorization request includes `code_challenge` and
//!    `code_challenge_method=S256`.
//! 4. The token exchange request includes the original `code_verifier`.
//! 5. The authorization server recomputes the challenge and compares it to
//!    the value sent in step 3, proving possession of the verifier.
//!
//! # References
//!
//! - RFC 7636 <https://www.rfc-editor.org/rfc/rfc7636>

use base64::Engine as _;
use rand::distr::Alphanumeric;
use rand::Rng as _;
use sha2::{Digest, Sha256};

use crate::error::{Result, SpotRemoteError};

/// Length of verifiers produced by [`generate`]
pub const VERIFIER_LENGTH: usize = 128;

/// Shortest verifier RFC 7636 allows
pub const MIN_VERIFIER_LENGTH: usize = 43;

/// Longest verifier RFC 7636 allows
pub const MAX_VERIFIER_LENGTH: usize = 128;

/// The only challenge method this client sends
pub const CHALLENGE_METHOD: &str = "S256";

// ---------------------------------------------------------------------------
// PkceChallenge
// ---------------------------------------------------------------------------

/// A PKCE S256 challenge pair consisting of a verifier and its derived
/// challenge value.
///
/// # Examples
///
/// ```
/// use spotremote::auth::pkce::{generate, VERIFIER_LENGTH};
///
/// let pkce = generate().expect("PKCE generation must not fail");
/// assert_eq!(pkce.method, "S256");
/// assert_eq!(pkce.verifier.len(), VERIFIER_LENGTH);
/// ```
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// The code verifier: [`VERIFIER_LENGTH`] characters drawn from the 62
    /// ASCII alphanumerics.
    ///
    /// Persisted until the token exchange, then sent as `code_verifier`.
    pub verifier: String,

    /// The code challenge: base64url (no padding) SHA-256 digest of the
    /// verifier's UTF-8 bytes. Sent as `code_challenge`; never stored.
    pub challenge: String,

    /// The challenge method. Always `"S256"`.
    pub method: String,
}

// ---------------------------------------------------------------------------
// Public functions
// ---------------------------------------------------------------------------

/// Generates a fresh PKCE S256 challenge with a [`VERIFIER_LENGTH`] verifier.
///
/// # Errors
///
/// Infallible in practice; returns a `Result` so that callers can use `?`
/// uniformly with [`generate_with_length`].
pub fn generate() -> Result<PkceChallenge> {
    generate_with_length(VERIFIER_LENGTH)
}

/// Generates a PKCE S256 challenge whose verifier has `length` characters.
///
/// Each character is drawn uniformly from `A-Z a-z 0-9`, giving
/// `length * log2(62)` bits of entropy (about 762 bits at 128).
///
/// # Errors
///
/// Returns [`SpotRemoteError::Config`] when `length` is outside
/// `MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH`.
///
/// # Examples
///
/// ```
/// use spotremote::auth::pkce::generate_with_length;
///
/// let pkce = generate_with_length(43).unwrap();
/// assert_eq!(pkce.verifier.len(), 43);
/// assert!(generate_with_length(42).is_err());
/// ```
pub fn generate_with_length(length: usize) -> Result<PkceChallenge> {
    if !(MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH).contains(&length) {
        return Err(SpotRemoteError::Config(format!(
            "PKCE verifier length {} outside {}..={}",
            length, MIN_VERIFIER_LENGTH, MAX_VERIFIER_LENGTH
        ))
        .into());
    }

    let verifier: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();
    let challenge = challenge_for(&verifier);

    Ok(PkceChallenge {
        verifier,
        challenge,
        method: CHALLENGE_METHOD.to_string(),
    })
}

/// Computes the S256 challenge for `verifier`.
///
/// `BASE64URL(SHA256(ASCII(code_verifier)))` with padding stripped, per
/// RFC 7636 section 4.2.
///
/// # Examples
///
/// ```
/// use spotremote::auth::pkce::challenge_for;
///
/// // RFC 7636 Appendix B test vector.
/// assert_eq!(
///     challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
///     "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
/// );
/// ```
pub fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
