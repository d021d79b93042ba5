//! PKCE (RFC 7636) verifier and S256 challenge generation.

use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of generated code verifiers.
pub const VERIFIER_LENGTH: usize = 64;

/// Challenge method sent to the authorize endpoint.
pub const CHALLENGE_METHOD: &str = "S256";

/// A code verifier and the challenge derived from it.
#[derive(Clone)]
pub struct PkceParams {
    /// Secret verifier sent with the code exchange.
    pub code_verifier: String,
    /// `BASE64URL(SHA256(code_verifier))`, sent with the authorization URL.
    pub code_challenge: String,
}

impl PkceParams {
    /// Generates a fresh random verifier and its challenge.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        // 48 random bytes encode to exactly 64 base64url characters
        let random_bytes: Vec<u8> = (0..VERIFIER_LENGTH * 3 / 4).map(|_| rng.gen()).collect();
        let code_verifier = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes);
        debug_assert!(is_valid_verifier(&code_verifier));
        Self::from_verifier(code_verifier)
    }

    /// Builds params from a known verifier.
    pub fn from_verifier(code_verifier: impl Into<String>) -> Self {
        let code_verifier = code_verifier.into();
        let code_challenge = compute_challenge(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
        }
    }
}

impl std::fmt::Debug for PkceParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceParams")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}

/// Computes the S256 challenge for a verifier.
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hash)
}

/// Validates verifier length (43..=128) and alphabet (unreserved characters).
pub(crate) fn is_valid_verifier(verifier: &str) -> bool {
    (43..=128).contains(&verifier.len())
        && verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
}
