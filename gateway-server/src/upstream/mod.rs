//! Upstream identity provider client
//!
//! Wraps the upstream OAuth/OIDC endpoints the gateway delegates login to:
//! building the authorize redirect URL, exchanging a code for upstream
//! tokens, and reading identity claims out of the returned ID token.

use crate::config::upstream::UpstreamConfig;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use log::{debug, error};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Errors that can occur talking to the upstream provider
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token exchange failed with status {status}: {body}")]
    Exchange {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Upstream token response carried no id_token")]
    MissingIdToken,
    #[error("Invalid ID token: {0}")]
    InvalidIdToken(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Token set returned by the upstream token endpoint
#[derive(Debug, Deserialize)]
pub struct UpstreamTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Identity claims read from the upstream ID token payload
#[derive(Debug, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
}

impl IdTokenClaims {
    /// The identity the gateway keys on: `email`, falling back to
    /// `preferred_username` (Entra ID often omits `email` for work accounts)
    pub fn email_claim(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or(self.preferred_username.as_deref())
    }
}

/// Client for the upstream provider's authorize and token endpoints
pub struct UpstreamClient {
    http: Client,
    authorize_url: Url,
    token_url: Url,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig, http: Client) -> Result<Self, UpstreamError> {
        let authorize_url = Url::parse(&config.authorize_url)
            .map_err(|e| UpstreamError::Config(format!("Invalid authorize URL: {e}")))?;
        let token_url = Url::parse(&config.token_url)
            .map_err(|e| UpstreamError::Config(format!("Invalid token URL: {e}")))?;
        Ok(Self {
            http,
            authorize_url,
            token_url,
            config,
        })
    }

    /// Build the upstream authorize URL the user agent is redirected to,
    /// carrying the combined state through the login round trip
    pub fn authorize_url(&self, callback_url: &str, state: &str) -> Url {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", callback_url)
            .append_pair("response_mode", "query")
            .append_pair("scope", &self.config.scope)
            .append_pair("state", state);
        url
    }

    /// Exchange an upstream authorization code for upstream tokens. The
    /// redirect URI must match the one sent to the authorize endpoint
    /// byte-for-byte.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<UpstreamTokenResponse, UpstreamError> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
            ("scope", self.config.scope.as_str()),
        ];

        debug!("Exchanging authorization code at {}", self.token_url);
        let response = self
            .http
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Upstream token exchange failed with {}: {}", status, body);
            return Err(UpstreamError::Exchange { status, body });
        }

        let tokens: UpstreamTokenResponse = response.json().await?;
        debug!(
            "Upstream token exchange succeeded (access token {} bytes, expires_in {:?})",
            tokens.access_token.len(),
            tokens.expires_in
        );
        Ok(tokens)
    }
}

/// Decode the payload of an upstream ID token without verifying its
/// signature. The token arrives inside the server-to-server exchange
/// response over TLS; that channel is what this trusts.
pub fn decode_id_token(id_token: &str) -> Result<IdTokenClaims, UpstreamError> {
    let mut segments = id_token.split('.');
    let payload = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(_header), Some(payload), Some(_signature), None) => payload,
        _ => {
            return Err(UpstreamError::InvalidIdToken(
                "expected three dot-separated segments".to_string(),
            ))
        }
    };

    let decoded = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| UpstreamError::InvalidIdToken(e.to_string()))?;
    serde_json::from_slice(&decoded).map_err(|e| UpstreamError::InvalidIdToken(e.to_string()))
}
