//! Upstream identity provider configuration

use confique::Config;

/// Configuration for the upstream identity provider the gateway delegates
/// login to. The defaults point at the Microsoft identity platform v2.0
/// common-tenant endpoints; a specific tenant is expressed inside the URLs.
#[derive(Debug, Config, Clone)]
pub struct UpstreamConfig {
    /// Authorization endpoint of the upstream provider
    #[config(
        env = "GATEWAY_UPSTREAM_AUTHORIZE_URL",
        default = "https://login.microsoftonline.com/common/oauth2/v2.0/authorize"
    )]
    pub authorize_url: String,

    /// Token endpoint of the upstream provider
    #[config(
        env = "GATEWAY_UPSTREAM_TOKEN_URL",
        default = "https://login.microsoftonline.com/common/oauth2/v2.0/token"
    )]
    pub token_url: String,

    /// Client id registered with the upstream provider
    #[config(env = "GATEWAY_UPSTREAM_CLIENT_ID", default = "")]
    pub client_id: String,

    /// Client secret registered with the upstream provider
    #[config(env = "GATEWAY_UPSTREAM_CLIENT_SECRET", default = "")]
    pub client_secret: String,

    /// Scopes requested from the upstream provider
    #[config(env = "GATEWAY_UPSTREAM_SCOPE", default = "openid email profile")]
    pub scope: String,
}
