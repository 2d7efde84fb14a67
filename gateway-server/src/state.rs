use crate::{
    auth::{members::MemberGate, tokens::TokenIssuer},
    config::GatewayConfig,
    store::{memory::InMemoryStore, AuthStore},
    upstream::UpstreamClient,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub store: Arc<dyn AuthStore>,
    pub upstream: Arc<UpstreamClient>,
    pub tokens: Arc<TokenIssuer>,
    pub members: Arc<MemberGate>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self, String> {
        let upstream = UpstreamClient::new(config.upstream.clone(), Self::create_http_client())
            .map_err(|e| e.to_string())?;

        let tokens = TokenIssuer::new(
            config.tokens.signing_secret.as_bytes(),
            Duration::from_secs(config.tokens.access_ttl_secs),
            Duration::from_secs(config.tokens.refresh_ttl_secs),
        );

        let members = MemberGate::new(config.member_list());

        let store = InMemoryStore::new(Duration::from_secs(config.store.code_ttl_secs));

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            upstream: Arc::new(upstream),
            tokens: Arc::new(tokens),
            members: Arc::new(members),
        })
    }

    fn create_http_client() -> Client {
        // Client for the upstream provider with appropriate configurations
        Client::builder()
            // Set reasonable timeouts
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(2))
            // Configure connection pool
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            // Build the client
            .build()
            .expect("Failed to create upstream HTTP client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_new() {
        let mock = wiremock::MockServer::start().await;
        let config = GatewayConfig::for_test_with_upstream(&mock);

        let state = AppState::new(config.clone()).unwrap();
        assert_eq!(state.config.public_url, config.public_url);
        assert_eq!(state.config.store.code_ttl_secs, 600);
    }

    #[tokio::test]
    async fn test_app_state_clone_shares_data() {
        let mock = wiremock::MockServer::start().await;
        let state = AppState::new(GatewayConfig::for_test_with_upstream(&mock)).unwrap();
        let state2 = state.clone();

        // After cloning, both instances point to the same data
        assert_eq!(Arc::as_ptr(&state.config), Arc::as_ptr(&state2.config));
        assert!(Arc::ptr_eq(&state.store, &state2.store));
    }
}
