use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::drivers::{RS232Config, SimulatorConfig};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_http_host() -> String {
    "localhost".to_string()
}
fn default_http_port() -> u16 {
    8000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

/// Timing of the read retry and reconnect cycle
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_reconnect_cooldown_ms")]
    pub reconnect_cooldown_ms: u64,
}

fn default_max_retries() -> u32 {
    2
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_initial_delay_ms() -> u64 {
    500
}
fn default_reconnect_cooldown_ms() -> u64 {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            initial_delay_ms: default_initial_delay_ms(),
            reconnect_cooldown_ms: default_reconnect_cooldown_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BridgeConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub serial: RS232Config,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Talk to an in-process simulated reader instead of the serial port
    #[serde(default)]
    pub simulate: bool,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl BridgeConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Local config file, e.g. config/default.toml
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Per run mode overrides, e.g. config/production.toml
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Environment variables (e.g. RFID_BRIDGE__SERIAL__PORT=COM10)
            .add_source(
                Environment::with_prefix("RFID_BRIDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
