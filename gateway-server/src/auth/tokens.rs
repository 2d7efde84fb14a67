//! Signed access/refresh token issuance and verification

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors that can occur during token operations
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error("Token verification failed: {0}")]
    Verification(jsonwebtoken::errors::Error),
    #[error("Token kind mismatch")]
    KindMismatch,
    #[error("System clock error: {0}")]
    Clock(String),
}

/// Discriminates access tokens from refresh tokens. A token is only valid
/// for the grant matching its kind; the tag is checked on every
/// verification after signature and expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by every issued token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the verified member email
    pub sub: String,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub iat: u64,
    pub exp: u64,
}

/// Issues and verifies the gateway's own HS256-signed tokens. Stateless:
/// everything needed to verify a token is the shared signing secret.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; the default 60s leeway would let freshly expired
        // tokens pass
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Mint a signed, time-bounded token of the given kind for an identity
    pub fn mint(&self, email: &str, kind: TokenKind) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let now = unix_now()?;
        let claims = Claims {
            sub: email.to_string(),
            email: email.to_string(),
            kind,
            iat: now,
            exp: now + ttl.as_secs(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Verify signature and expiry, then require the expected kind. A valid
    /// token of the wrong kind is rejected just like a forged one.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(TokenError::Verification)?;
        if data.claims.kind != expected {
            return Err(TokenError::KindMismatch);
        }
        Ok(data.claims)
    }
}

fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| TokenError::Clock(e.to_string()))
}

/// Generate a URL-safe random token with `n_bytes` of entropy, used for
/// internal correlation states and authorization codes
pub fn random_token(n_bytes: usize) -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..n_bytes).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            b"test-signing-secret",
            Duration::from_secs(3600),
            Duration::from_secs(604_800),
        )
    }

    #[test]
    fn test_mint_and_verify_roundtrip() {
        let issuer = issuer();

        let access = issuer.mint("alice@example.com", TokenKind::Access).unwrap();
        let claims = issuer.verify(&access, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 3600);

        let refresh = issuer.mint("alice@example.com", TokenKind::Refresh).unwrap();
        let claims = issuer.verify(&refresh, TokenKind::Refresh).unwrap();
        assert_eq!(claims.exp - claims.iat, 604_800);
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let issuer = issuer();

        let access = issuer.mint("alice@example.com", TokenKind::Access).unwrap();
        assert!(matches!(
            issuer.verify(&access, TokenKind::Refresh),
            Err(TokenError::KindMismatch)
        ));

        let refresh = issuer.mint("alice@example.com", TokenKind::Refresh).unwrap();
        assert!(matches!(
            issuer.verify(&refresh, TokenKind::Access),
            Err(TokenError::KindMismatch)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = issuer();
        let other = TokenIssuer::new(
            b"some-other-secret",
            Duration::from_secs(3600),
            Duration::from_secs(604_800),
        );

        let token = issuer.mint("alice@example.com", TokenKind::Access).unwrap();
        assert!(matches!(
            other.verify(&token, TokenKind::Access),
            Err(TokenError::Verification(_))
        ));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let issuer = issuer();
        let token = issuer.mint("alice@example.com", TokenKind::Access).unwrap();

        let mut tampered = token.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();

        assert!(issuer.verify(&tampered, TokenKind::Access).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = TokenIssuer::new(
            b"test-signing-secret",
            Duration::from_secs(0),
            Duration::from_secs(0),
        );
        let token = issuer.mint("alice@example.com", TokenKind::Access).unwrap();

        // exp has second resolution; step past it
        std::thread::sleep(Duration::from_millis(1100));

        assert!(matches!(
            issuer.verify(&token, TokenKind::Access),
            Err(TokenError::Verification(_))
        ));
    }

    #[test]
    fn test_random_token_entropy_and_charset() {
        let one = random_token(32);
        let two = random_token(32);
        assert_ne!(one, two);
        // 32 bytes base64url-encoded without padding
        assert_eq!(one.len(), 43);
        for c in one.chars() {
            assert!(c.is_ascii_alphanumeric() || c == '-' || c == '_');
        }
    }
}
