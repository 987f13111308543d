use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Every section is optional; an empty file yields [`Config::default`].
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_services_path")]
    pub services_path: String,
    /// Path template; `{id}` is replaced by the service id.
    #[serde(default = "default_capabilities_path")]
    pub capabilities_path: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            services_path: default_services_path(),
            capabilities_path: default_capabilities_path(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8001".to_string()
}
fn default_services_path() -> String {
    "/bus/services".to_string()
}
fn default_capabilities_path() -> String {
    "/services/{id}/capabilities".to_string()
}

impl BusConfig {
    /// Base address with any trailing `/` removed.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn services_url(&self) -> String {
        format!("{}{}", self.base(), self.services_path)
    }

    pub fn capabilities_url(&self, service_id: &str) -> String {
        format!(
            "{}{}",
            self.base(),
            self.capabilities_path.replace("{id}", service_id)
        )
    }

    /// Root-relative hrefs are prefixed with the bus base; anything else is
    /// taken as already absolute.
    pub fn resolve_href(&self, href: &str) -> String {
        if href.starts_with('/') {
            format!("{}{}", self.base(), href)
        } else {
            href.to_string()
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_interval_secs() -> f64 {
    5.0
}
fn default_timeout_secs() -> f64 {
    5.0
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    let bus = &config.bus;
    if !(bus.base_url.starts_with("http://") || bus.base_url.starts_with("https://")) {
        anyhow::bail!(
            "bus.base_url must start with http:// or https://, got '{}'",
            bus.base_url
        );
    }
    if !bus.services_path.starts_with('/') {
        anyhow::bail!("bus.services_path must start with '/'");
    }
    if !bus.capabilities_path.starts_with('/') {
        anyhow::bail!("bus.capabilities_path must start with '/'");
    }
    if !bus.capabilities_path.contains("{id}") {
        anyhow::bail!("bus.capabilities_path must contain the {{id}} placeholder");
    }

    for (name, secs) in [
        ("poll.interval_secs", config.poll.interval_secs),
        ("poll.timeout_secs", config.poll.timeout_secs),
    ] {
        if !secs.is_finite() || secs <= 0.0 {
            anyhow::bail!("{} must be a positive number of seconds", name);
        }
    }

    Ok(())
}
