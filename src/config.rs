use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use thiserror::Error;

use crate::http::HttpVersion;
use crate::net::tls::TlsVersion;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to deserialize config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub verbose: bool,
    pub normalize_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            verbose: false,
            normalize_headers: false,
        }
    }
}

impl ServerConfig {
    pub fn try_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str::<ServerConfig>(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Like [`try_from_file`](Self::try_from_file), falling back to defaults on any error.
    pub fn from_file(path: &Path) -> Self {
        match Self::try_from_file(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "Fall back to default config");
                ServerConfig::default()
            }
        }
    }
}

/// Client settings shared by both client variants.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub canonical: bool,
    pub http_version: HttpVersion,
    pub tls_version: TlsVersion,
    pub insecure: bool,
    pub normalize_headers: bool,
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            canonical: false,
            http_version: HttpVersion::V1_1,
            tls_version: TlsVersion::Tls12,
            insecure: false,
            normalize_headers: false,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_uses_defaults() {
        let config: ServerConfig = toml::from_str("port = 9000\nverbose = true\n").unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.verbose);
        assert_eq!(config.address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert!(!config.normalize_headers);
    }

    #[test]
    fn full_file() {
        let config: ServerConfig = toml::from_str(
            "address = \"127.0.0.1\"\nport = 1234\nverbose = false\nnormalize_headers = true\n",
        )
        .unwrap();
        assert_eq!(config.address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(config.normalize_headers);
    }

    #[test]
    fn missing_file_falls_back() {
        let path = Path::new("/nonexistent/rawh.toml");
        assert!(matches!(
            ServerConfig::try_from_file(path),
            Err(ConfigError::Read { .. })
        ));
        assert_eq!(ServerConfig::from_file(path), ServerConfig::default());
    }
}
