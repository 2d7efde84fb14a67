//! Authorization state store configuration

use confique::Config;

/// Configuration for the in-process pending-authorization and
/// authorization-code stores
#[derive(Debug, Config, Clone)]
pub struct StoreConfig {
    /// Authorization code TTL in seconds (default: 600 = 10 minutes).
    /// Pending authorizations that never complete are reaped on the same
    /// schedule.
    #[config(env = "GATEWAY_STORE_CODE_TTL", default = 600)]
    pub code_ttl_secs: u64,

    /// Interval in seconds between sweeps of expired entries (default: 60)
    #[config(env = "GATEWAY_STORE_SWEEP_INTERVAL", default = 60)]
    pub sweep_interval_secs: u64,
}
