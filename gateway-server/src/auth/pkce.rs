//! PKCE (RFC 7636) challenge verification

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};

/// Verify a PKCE code verifier against the challenge recorded at
/// authorization time.
///
/// `plain` compares the verifier byte-for-byte against the challenge;
/// `S256` compares `base64url(sha256(verifier))`. Any other method fails
/// closed: verification never passes for input it cannot classify.
pub fn verify_code_challenge(
    code_verifier: &str,
    code_challenge: &str,
    code_challenge_method: &str,
) -> bool {
    match code_challenge_method {
        "plain" => code_verifier == code_challenge,
        "S256" => {
            let mut hasher = Sha256::new();
            hasher.update(code_verifier.as_bytes());
            let computed = URL_SAFE_NO_PAD.encode(hasher.finalize());
            computed == code_challenge
        }
        _ => false,
    }
}
