use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub client: ClientSettings,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientSettings {
    pub name: String,
    pub password: String,
    #[serde(default = "default_server_addr")]
    pub server_addr: String,
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    /// Construct the client disconnected instead of handshaking immediately
    #[serde(default)]
    pub defer_connect: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            write_timeout_secs: default_write_timeout(),
        }
    }
}

fn default_server_addr() -> String {
    crate::DEFAULT_HOST.to_string()
}

fn default_server_port() -> u16 {
    crate::DEFAULT_PORT
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    30
}

fn default_write_timeout() -> u64 {
    30
}

impl ClientConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let config: ClientConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Loads `configs/client.toml`, then `client.toml`, then falls back to defaults
    pub fn load() -> Self {
        Self::load_from(Path::new("."))
    }

    /// Same search as [`load`](Self::load), relative to `dir`
    pub fn load_from(dir: &Path) -> Self {
        for relative in ["configs/client.toml", "client.toml"] {
            let path = dir.join(relative);
            if let Ok(config) = Self::from_file(&path) {
                info!("Loaded config from {}", path.display());
                return config;
            }
        }

        warn!("No config file found, using default configuration");
        warn!("IMPORTANT: Change the password in production!");
        Self::default_config()
    }

    pub fn default_config() -> Self {
        Self {
            client: ClientSettings {
                name: "client-1".to_string(),
                password: "change-me".to_string(),
                server_addr: default_server_addr(),
                server_port: default_server_port(),
                defer_connect: false,
            },
            timeouts: TimeoutSettings::default(),
        }
    }

    /// `host:port` string handed to the connector
    pub fn address(&self) -> String {
        crate::format_address(&self.client.server_addr, self.client.server_port)
    }
}
