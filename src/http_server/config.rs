//! HTTP server settings: bind address and the browser origins allowed to
//! open event streams.

use std::net::{AddrParseError, SocketAddr};

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> Vec<String> {
    // Angular dev server
    vec!["http://localhost:4200".to_string()]
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl HttpServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// `host:port` as configured
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.address().parse()
    }

    /// Reject unparseable addresses and origins
    pub fn validate(&self) -> Result<(), String> {
        self.socket_addr().map_err(|e| {
            format!("server address '{}' is not a valid socket address: {}", self.address(), e)
        })?;

        if let Some(bad) = self
            .cors_origins
            .iter()
            .find(|o| HeaderValue::from_str(o).is_err())
        {
            return Err(format!("cors origin '{}' is not a valid header value", bad));
        }

        Ok(())
    }

    /// CORS policy for the configured origins
    pub fn cors_layer(&self) -> CorsLayer {
        let origin = if self.cors_origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(
                self.cors_origins
                    .iter()
                    .filter_map(|o| HeaderValue::from_str(o).ok()),
            )
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HttpServerConfig::default();
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_port() {
        let config = HttpServerConfig::with_port(9090);
        assert_eq!(config.socket_addr().unwrap().port(), 9090);
    }

    #[test]
    fn test_invalid_host() {
        let config = HttpServerConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_origin() {
        let config = HttpServerConfig {
            cors_origins: vec!["http://ok".to_string(), "bad\norigin".to_string()],
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("cors origin"));
    }
}
