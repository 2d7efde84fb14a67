//! Issued-token configuration

use confique::Config;

/// Configuration for the tokens the gateway itself issues
#[derive(Debug, Config, Clone)]
pub struct TokenConfig {
    /// HMAC secret used to sign issued access and refresh tokens.
    /// Mandatory; the gateway refuses to start without it.
    #[config(env = "GATEWAY_TOKENS_SIGNING_SECRET", default = "")]
    pub signing_secret: String,

    /// Access token TTL in seconds (default: 3600 = 1 hour)
    #[config(env = "GATEWAY_TOKENS_ACCESS_TTL", default = 3600)]
    pub access_ttl_secs: u64,

    /// Refresh token TTL in seconds (default: 604800 = 7 days)
    #[config(env = "GATEWAY_TOKENS_REFRESH_TTL", default = 604800)]
    pub refresh_ttl_secs: u64,
}
