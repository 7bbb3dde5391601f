//! PKCE (RFC 7636) verifier/challenge pairs and CSRF state tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Verifier length; RFC 7636 allows 43 to 128
const VERIFIER_LEN: usize = 64;

/// Unreserved URI characters
const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

const STATE_LEN: usize = 32;
const STATE_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn random_string(charset: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

/// S256 challenge: BASE64URL(SHA256(verifier))
pub fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Random `state` parameter for the authorization request
pub fn random_state() -> String {
    random_string(STATE_CHARSET, STATE_LEN)
}

/// Verifier kept locally, challenge sent with the authorization request
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let verifier = random_string(VERIFIER_CHARSET, VERIFIER_LEN);
        let challenge = s256_challenge(&verifier);
        Self { verifier, challenge }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifier_shape() {
        let pair = PkcePair::generate();
        assert_eq!(pair.verifier.len(), VERIFIER_LEN);
        assert!(pair
            .verifier
            .bytes()
            .all(|b| VERIFIER_CHARSET.contains(&b)));
    }

    #[test]
    fn test_challenge_matches_verifier() {
        let pair = PkcePair::generate();
        assert_eq!(pair.challenge, s256_challenge(&pair.verifier));
        // 32 byte digest, unpadded base64url
        assert_eq!(pair.challenge.len(), 43);
    }

    #[test]
    fn test_rfc7636_appendix_b() {
        assert_eq!(
            s256_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvF2zNjjBfZQ13gCAS7bk5yyzM05pPV6o"
        );
    }

    #[test]
    fn test_state_is_random_alphanumeric() {
        let a = random_state();
        let b = random_state();
        assert_eq!(a.len(), STATE_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
