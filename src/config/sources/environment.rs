//! Environment variable source: AGENTBOOK__* prefix with __ separator.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub const ENV_PREFIX: &str = "AGENTBOOK";

/// Add the environment overlay. `AGENTBOOK__FEDERATION__TIMEOUT_MS` maps to
/// `federation.timeout_ms`; `AGENTBOOK__FEDERATED_SERVERS` is comma-separated.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("federated_servers")
            .try_parsing(true),
    ))
}
