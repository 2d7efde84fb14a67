use crate::config::store::StoreConfig;
use crate::config::tokens::TokenConfig;
use crate::config::upstream::UpstreamConfig;
use confique::Config;

pub mod store;
pub mod tokens;
pub mod upstream;

/// Main configuration structure for the gateway server
#[derive(Debug, Config, Clone)]
pub struct GatewayConfig {
    /// The port the gateway will listen on (default: 7788)
    #[config(env = "GATEWAY_PORT", default = 7788)]
    pub port: u16,

    /// Public base URL of the gateway, advertised in discovery metadata and
    /// used as the callback URL registered with the upstream provider
    /// (default: http://localhost:7788)
    #[config(env = "GATEWAY_PUBLIC_URL", default = "http://localhost:7788")]
    pub public_url: String,

    /// Comma-separated allow-list of member emails. An empty list disables
    /// the member gate and admits every authenticated upstream user.
    #[config(env = "GATEWAY_ALLOWED_MEMBERS", default = "")]
    pub allowed_members: String,

    /// Upstream identity provider configuration
    #[config(nested)]
    pub upstream: UpstreamConfig,

    /// Issued-token configuration
    #[config(nested)]
    pub tokens: TokenConfig,

    /// Authorization state store configuration
    #[config(nested)]
    pub store: StoreConfig,
}

impl GatewayConfig {
    /// Loads the configuration from environment variables and validates it
    pub fn load() -> Result<Self, String> {
        let config = Self::builder()
            .env()
            .load()
            .map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.tokens.signing_secret.is_empty() {
            return Err("GATEWAY_TOKENS_SIGNING_SECRET must be set".to_string());
        }
        if self.upstream.client_id.is_empty() {
            return Err("GATEWAY_UPSTREAM_CLIENT_ID must be set".to_string());
        }
        if self.upstream.client_secret.is_empty() {
            return Err("GATEWAY_UPSTREAM_CLIENT_SECRET must be set".to_string());
        }
        Ok(())
    }

    /// Get the member allow-list as a normalized (lowercased) vector
    pub fn member_list(&self) -> Vec<String> {
        self.allowed_members
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// The callback URL the upstream provider redirects back to
    pub fn callback_url(&self) -> String {
        format!("{}/callback", self.public_url.trim_end_matches('/'))
    }

    #[cfg(test)]
    pub fn for_test_with_upstream(upstream_mock: &wiremock::MockServer) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            public_url: "http://gateway.test".to_string(),
            allowed_members: "alice@example.com, Bob@Example.com".to_string(),
            upstream: UpstreamConfig {
                authorize_url: format!("{}/oauth2/v2.0/authorize", upstream_mock.uri()),
                token_url: format!("{}/oauth2/v2.0/token", upstream_mock.uri()),
                client_id: "upstream-client".to_string(),
                client_secret: "upstream-secret".to_string(),
                scope: "openid email profile".to_string(),
            },
            tokens: TokenConfig {
                signing_secret: "test-signing-secret".to_string(),
                access_ttl_secs: 3600,
                refresh_ttl_secs: 604_800,
            },
            store: StoreConfig {
                code_ttl_secs: 600,
                sweep_interval_secs: 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_env() {
        // Clear any existing environment variables
        for (name, _value) in std::env::vars() {
            if name.starts_with("GATEWAY_") {
                std::env::remove_var(name);
            }
        }
        std::env::set_var("GATEWAY_TOKENS_SIGNING_SECRET", "test-secret");
        std::env::set_var("GATEWAY_UPSTREAM_CLIENT_ID", "client-id");
        std::env::set_var("GATEWAY_UPSTREAM_CLIENT_SECRET", "client-secret");

        let config = GatewayConfig::load().unwrap();
        assert_eq!(config.port, 7788);
        assert_eq!(config.public_url, "http://localhost:7788");
        assert_eq!(config.tokens.access_ttl_secs, 3600);
        assert_eq!(config.tokens.refresh_ttl_secs, 604_800);
        assert_eq!(config.store.code_ttl_secs, 600);
        assert_eq!(config.store.sweep_interval_secs, 60);
        assert_eq!(config.upstream.scope, "openid email profile");
        assert!(config.member_list().is_empty());

        // A missing signing secret must fail validation
        std::env::remove_var("GATEWAY_TOKENS_SIGNING_SECRET");
        assert!(GatewayConfig::load().is_err());

        std::env::remove_var("GATEWAY_UPSTREAM_CLIENT_ID");
        std::env::remove_var("GATEWAY_UPSTREAM_CLIENT_SECRET");
    }

    #[test]
    fn test_member_list_normalization() {
        let mock = GatewayConfig {
            allowed_members: " Alice@Example.COM ,bob@example.com,, ".to_string(),
            ..test_config()
        };
        assert_eq!(
            mock.member_list(),
            vec!["alice@example.com", "bob@example.com"]
        );
    }

    #[test]
    fn test_callback_url_strips_trailing_slash() {
        let config = GatewayConfig {
            public_url: "https://gateway.example.com/".to_string(),
            ..test_config()
        };
        assert_eq!(config.callback_url(), "https://gateway.example.com/callback");
    }

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            port: 7788,
            public_url: "http://localhost:7788".to_string(),
            allowed_members: String::new(),
            upstream: UpstreamConfig {
                authorize_url: "https://idp.example.com/authorize".to_string(),
                token_url: "https://idp.example.com/token".to_string(),
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                scope: "openid email profile".to_string(),
            },
            tokens: TokenConfig {
                signing_secret: "secret".to_string(),
                access_ttl_secs: 3600,
                refresh_ttl_secs: 604_800,
            },
            store: StoreConfig {
                code_ttl_secs: 600,
                sweep_interval_secs: 60,
            },
        }
    }
}
