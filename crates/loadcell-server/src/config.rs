use serde::Serialize;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    pub default_delay_ms: u64,
    pub max_delay_ms: u64,
    pub default_iterations: u64,
    pub max_iterations: u64,
    pub max_name_chars: usize,
    pub max_message_chars: usize,
    pub enable_runtime_info: bool,
    pub shutdown_drain: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
            default_delay_ms: 1000,
            max_delay_ms: 10_000,
            default_iterations: 1_000_000,
            max_iterations: 10_000_000,
            max_name_chars: 100,
            max_message_chars: 10_000,
            enable_runtime_info: false,
            shutdown_drain: Duration::from_millis(5000),
        }
    }
}

pub fn validate_startup_config_contract(api: &ApiConfig) -> Result<(), String> {
    if api.max_body_bytes == 0 {
        return Err("max body bytes must be > 0".to_string());
    }
    if api.default_delay_ms > api.max_delay_ms {
        return Err("default delay must not exceed the maximum delay".to_string());
    }
    if api.default_iterations == 0 || api.default_iterations > api.max_iterations {
        return Err("default iterations must be between 1 and the maximum".to_string());
    }
    if api.max_name_chars == 0 || api.max_message_chars == 0 {
        return Err("validation character limits must be > 0".to_string());
    }
    Ok(())
}
