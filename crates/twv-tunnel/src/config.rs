//! Host and tunnel configuration
//!
//! Two kinds of configuration live here:
//!
//! - [`ConfigResource`]: the bundled tunnel configuration blob. Its fields
//!   belong to the tunnel library; the host only checks it is a JSON object
//!   and hands the text over.
//! - [`HostConfig`]: settings of the host application itself, in TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name reported to the tunnel client
pub const DEFAULT_APP_NAME: &str = "TunneledWebView";

/// Page loaded once the tunnel is connected
pub const DEFAULT_HOME_URL: &str = "https://freegeoip.app/";

/// Bundled tunnel configuration resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigResource {
    path: PathBuf,
}

impl ConfigResource {
    /// Resource backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the resource
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the resource and return its normalized serialization.
    pub fn read(&self) -> Result<String, ConfigError> {
        let raw = std::fs::read_to_string(&self.path)?;
        let document: serde_json::Value = serde_json::from_str(&raw)?;

        if !document.is_object() {
            return Err(ConfigError::NotAnObject);
        }

        debug!("Read tunnel config from {}", self.path.display());
        Ok(document.to_string())
    }
}

/// Host application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Name reported to the tunnel client
    pub app_name: String,
    /// Location of the tunnel configuration resource
    pub tunnel_config_path: PathBuf,
    /// Page to load through the tunnel
    pub home_url: String,
    /// Host the local proxies listen on
    pub proxy_host: String,
    /// Maximum retained log lines
    pub log_capacity: usize,
    /// Enable JavaScript in the browser
    pub javascript_enabled: bool,
    /// Hold navigation until an HTTP proxy port is known
    pub require_proxy_port: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            tunnel_config_path: PathBuf::from("tunnel_config.json"),
            home_url: DEFAULT_HOME_URL.to_string(),
            proxy_host: "127.0.0.1".to_string(),
            log_capacity: 1000,
            javascript_enabled: true,
            require_proxy_port: true,
        }
    }
}

impl HostConfig {
    /// Load from a TOML file. A missing file yields defaults.
    ///
    /// A relative `tunnel_config_path` is resolved against the directory
    /// holding the host config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No host config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.validate()?;

        if config.tunnel_config_path.is_relative() {
            if let Some(dir) = path.parent() {
                config.tunnel_config_path = dir.join(&config.tunnel_config_path);
            }
        }
        Ok(config)
    }

    /// The tunnel configuration resource this host bundles
    pub fn tunnel_resource(&self) -> ConfigResource {
        ConfigResource::new(&self.tunnel_config_path)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_capacity == 0 {
            return Err(ConfigError::Invalid("log_capacity must be positive".into()));
        }
        if self.proxy_host.is_empty() {
            return Err(ConfigError::Invalid("proxy_host is empty".into()));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse tunnel config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Tunnel config is not a JSON object")]
    NotAnObject,

    #[error("Failed to parse host config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid host config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_resource() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tunnel_config.json");
        std::fs::write(&path, "{\n  \"PropagationChannelId\": \"ABC\"\n}\n").unwrap();

        let config = ConfigResource::new(&path).read().unwrap();
        assert_eq!(config, r#"{"PropagationChannelId":"ABC"}"#);
    }

    #[test]
    fn test_read_missing_resource() {
        let dir = TempDir::new().unwrap();
        let resource = ConfigResource::new(dir.path().join("absent.json"));

        assert!(matches!(resource.read(), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_read_malformed_resource() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tunnel_config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(ConfigResource::new(&path).read(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_read_non_object_resource() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tunnel_config.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(ConfigResource::new(&path).read(), Err(ConfigError::NotAnObject)));
    }

    #[test]
    fn test_host_config_default() {
        let config = HostConfig::default();

        assert_eq!(config.app_name, "TunneledWebView");
        assert_eq!(config.home_url, "https://freegeoip.app/");
        assert!(config.require_proxy_port);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_host_config_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = HostConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn test_host_config_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "home_url = \"https://example.com/\"\nlog_capacity = 50\n").unwrap();

        let config = HostConfig::load(&path).unwrap();
        assert_eq!(config.home_url, "https://example.com/");
        assert_eq!(config.log_capacity, 50);
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
    }

    #[test]
    fn test_tunnel_config_path_relative_to_host_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "tunnel_config_path = \"tunnel_config.json\"\n").unwrap();
        std::fs::write(dir.path().join("tunnel_config.json"), r#"{"SponsorId":"XYZ"}"#).unwrap();

        let config = HostConfig::load(&path).unwrap();
        assert_eq!(config.tunnel_config_path, dir.path().join("tunnel_config.json"));
        assert_eq!(config.tunnel_resource().read().unwrap(), r#"{"SponsorId":"XYZ"}"#);
    }

    #[test]
    fn test_absolute_tunnel_config_path_kept() {
        let dir = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let absolute = elsewhere.path().join("tunnel_config.json");
        let path = dir.path().join("host.toml");
        std::fs::write(&path, format!("tunnel_config_path = {:?}\n", absolute.display().to_string())).unwrap();

        let config = HostConfig::load(&path).unwrap();
        assert_eq!(config.tunnel_config_path, absolute);
    }

    #[test]
    fn test_host_config_rejects_zero_capacity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "log_capacity = 0\n").unwrap();

        assert!(matches!(HostConfig::load(&path), Err(ConfigError::Invalid(_))));
    }
}
