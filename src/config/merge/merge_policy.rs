//! Built-in defaults, the lowest-precedence layer.

use crate::config::{
    DEFAULT_FEDERATION_TIMEOUT_MS, DEFAULT_LOCAL_SERVER_URL, DEFAULT_RESOLVER_CACHE_TTL_MS,
};
use crate::resolver::federation::DEFAULT_AGENTS_ENDPOINT;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the default values of every scalar key.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("local_server_url", DEFAULT_LOCAL_SERVER_URL)?
        .set_default("federated_servers", Vec::<String>::new())?
        .set_default("federation.timeout_ms", DEFAULT_FEDERATION_TIMEOUT_MS)?
        .set_default("federation.agents_endpoint", DEFAULT_AGENTS_ENDPOINT)?
        .set_default("resolver_cache_ttl_ms", DEFAULT_RESOLVER_CACHE_TTL_MS)
}
