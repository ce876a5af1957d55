use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config/gateway";
pub const ENV_PREFIX: &str = "MYCOBOT";

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub server: ServerSettings,
    pub driver: DriverSettings,
    pub motion: MotionSettings,
    pub tools: ToolsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Serial,
    Simulated,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DriverSettings {
    pub kind: DriverKind,
    pub port: String,
    pub baudrate: u32,
    pub settle_ms: u64,
    pub response_timeout_ms: u64,
}

impl DriverSettings {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MotionSettings {
    pub poll_interval_ms: u64,
}

impl MotionSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolBackend {
    /// Relay every operation to the REST API
    Remote,
    /// Drive the arm from this process
    Local,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ToolsSettings {
    pub backend: ToolBackend,
    pub api_base_url: String,
    pub host: String,
    pub port: u16,
    pub keep_alive_secs: u64,
}

impl ToolsSettings {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

/// Values given on the command line. They win over every other source.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub driver_kind: Option<String>,
    pub driver_port: Option<String>,
    pub baudrate: Option<u32>,
    pub tools_backend: Option<String>,
    pub api_base_url: Option<String>,
    pub tools_host: Option<String>,
    pub tools_port: Option<u16>,
}

/// Load settings: defaults, then the config file, then `MYCOBOT__*`
/// environment variables, then command-line overrides.
pub fn load_config(file: Option<&str>, overrides: &ConfigOverrides) -> anyhow::Result<GatewayConfig> {
    let environment = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true);

    let settings = build_config(file, environment, overrides)?;
    validate(&settings)?;
    Ok(settings)
}

fn build_config(
    file: Option<&str>,
    environment: Environment,
    overrides: &ConfigOverrides,
) -> Result<GatewayConfig, ConfigError> {
    // An explicitly named file must exist; the default one is optional
    let file_source = match file {
        Some(path) => File::with_name(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let settings = Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080_i64)?
        .set_default("driver.kind", "serial")?
        .set_default("driver.port", "/dev/ttyACM0")?
        .set_default("driver.baudrate", 115_200_i64)?
        .set_default("driver.settle_ms", 500_i64)?
        .set_default("driver.response_timeout_ms", 200_i64)?
        .set_default("motion.poll_interval_ms", 100_i64)?
        .set_default("tools.backend", "remote")?
        .set_default("tools.api_base_url", "http://localhost:8080")?
        .set_default("tools.host", "0.0.0.0")?
        .set_default("tools.port", 8081_i64)?
        .set_default("tools.keep_alive_secs", 30_i64)?
        .add_source(file_source)
        .add_source(environment)
        .set_override_option("server.host", overrides.server_host.clone())?
        .set_override_option("server.port", overrides.server_port.map(i64::from))?
        .set_override_option("driver.kind", overrides.driver_kind.clone())?
        .set_override_option("driver.port", overrides.driver_port.clone())?
        .set_override_option("driver.baudrate", overrides.baudrate.map(i64::from))?
        .set_override_option("tools.backend", overrides.tools_backend.clone())?
        .set_override_option("tools.api_base_url", overrides.api_base_url.clone())?
        .set_override_option("tools.host", overrides.tools_host.clone())?
        .set_override_option("tools.port", overrides.tools_port.map(i64::from))?
        .build()?;

    settings.try_deserialize()
}

fn validate(settings: &GatewayConfig) -> anyhow::Result<()> {
    anyhow::ensure!(
        settings.motion.poll_interval_ms > 0,
        "motion.poll_interval_ms must be greater than 0"
    );
    anyhow::ensure!(
        settings.tools.keep_alive_secs > 0,
        "tools.keep_alive_secs must be greater than 0"
    );
    anyhow::ensure!(settings.driver.baudrate > 0, "driver.baudrate must be greater than 0");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let settings = build_config(None, env(&[]), &ConfigOverrides::default()).unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.driver.kind, DriverKind::Serial);
        assert_eq!(settings.driver.port, "/dev/ttyACM0");
        assert_eq!(settings.driver.baudrate, 115_200);
        assert_eq!(settings.driver.settle(), Duration::from_millis(500));
        assert_eq!(settings.motion.poll_interval(), Duration::from_millis(100));
        assert_eq!(settings.tools.backend, ToolBackend::Remote);
        assert_eq!(settings.tools.port, 8081);
        assert_eq!(settings.tools.keep_alive(), Duration::from_secs(30));
    }

    #[test]
    fn test_environment_then_overrides() {
        let environment = env(&[
            ("MYCOBOT__DRIVER__KIND", "simulated"),
            ("MYCOBOT__SERVER__PORT", "9000"),
            ("MYCOBOT__TOOLS__BACKEND", "local"),
        ]);
        let overrides = ConfigOverrides {
            server_port: Some(9100),
            ..Default::default()
        };

        let settings = build_config(None, environment, &overrides).unwrap();
        assert_eq!(settings.driver.kind, DriverKind::Simulated);
        assert_eq!(settings.tools.backend, ToolBackend::Local);
        assert_eq!(settings.server.port, 9100);
    }

    #[test]
    fn test_rejects_unknown_driver_kind() {
        let overrides = ConfigOverrides {
            driver_kind: Some("usb".to_string()),
            ..Default::default()
        };
        assert!(build_config(None, env(&[]), &overrides).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = build_config(Some("config/does-not-exist"), env(&[]), &ConfigOverrides::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut settings = build_config(None, env(&[]), &ConfigOverrides::default()).unwrap();
        settings.motion.poll_interval_ms = 0;
        assert!(validate(&settings).is_err());
    }
}
