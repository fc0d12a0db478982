use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::processor::ProcessorConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Rules applied to item URLs before they reach the store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// File extensions accepted at the end of the URL path, with leading dot.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl ValidationConfig {
    /// Whether `ext` (as returned by `url_extension`) is allowed.
    /// Comparison is case-insensitive.
    pub fn is_allowed(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.to_ascii_lowercase() == ext)
    }
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".pdf".to_string(), ".jpeg".to_string(), ".jpg".to_string()]
}
