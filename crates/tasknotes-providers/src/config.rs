//! Provider connection configuration.
//!
//! ## Configuration
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `NOTES_GRPC_ADDR` | `notes-service:50051` | Notes provider address |
//! | `TASKS_GRPC_ADDR` | `tasks-service:50052` | Tasks provider address |
//! | `GRPC_TIMEOUT_SECS` | `30` | Per-call timeout |
//! | `GRPC_CONNECT_TIMEOUT_SECS` | `10` | Startup dial timeout |
//! | `GRPC_TLS_ENABLE` | `false` | Use TLS towards both providers |
//! | `GRPC_TLS_CA_PATH` | - | Trust root (PEM) |
//! | `GRPC_TLS_CERT_PATH` | - | Client certificate (PEM), enables mTLS with the key |
//! | `GRPC_TLS_KEY_PATH` | - | Client private key (PEM) |
//! | `NOTES_GRPC_SERVER_NAME` | - | TLS server name expected from the notes provider |
//! | `TASKS_GRPC_SERVER_NAME` | - | TLS server name expected from the tasks provider |

use std::path::PathBuf;
use std::time::Duration;

use tasknotes_core::{defaults, Error, Result};
use tonic::transport::{Certificate, ClientTlsConfig, Identity};

/// Trust material shared by both providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSettings {
    pub ca_path: Option<PathBuf>,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

impl TlsSettings {
    /// Load PEM files into a tonic TLS config for one provider.
    ///
    /// A client identity is attached only when both certificate and key are
    /// configured; one without the other is a configuration error.
    pub async fn client_config(&self, server_name: Option<&str>) -> Result<ClientTlsConfig> {
        let mut tls = ClientTlsConfig::new();

        if let Some(ca_path) = &self.ca_path {
            let ca = tokio::fs::read(ca_path).await?;
            tls = tls.ca_certificate(Certificate::from_pem(ca));
        }

        match (&self.cert_path, &self.key_path) {
            (Some(cert_path), Some(key_path)) => {
                let cert = tokio::fs::read(cert_path).await?;
                let key = tokio::fs::read(key_path).await?;
                tls = tls.identity(Identity::from_pem(cert, key));
            }
            (None, None) => {}
            _ => {
                return Err(Error::Config(
                    "GRPC_TLS_CERT_PATH and GRPC_TLS_KEY_PATH must be set together".to_string(),
                ))
            }
        }

        if let Some(name) = server_name {
            tls = tls.domain_name(name);
        }

        Ok(tls)
    }
}

/// Address and TLS identity of one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub address: String,
    /// Overrides the TLS server name, for providers whose certificate
    /// identity differs from their dial address.
    pub server_name: Option<String>,
}

impl EndpointConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            server_name: None,
        }
    }

    /// Dial URI, adding the scheme when the address is a bare `host:port`.
    pub fn uri(&self, tls: bool) -> String {
        if self.address.contains("://") {
            self.address.clone()
        } else if tls {
            format!("https://{}", self.address)
        } else {
            format!("http://{}", self.address)
        }
    }
}

/// Configuration for both provider channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub notes: EndpointConfig,
    pub tasks: EndpointConfig,
    /// `None` means plaintext.
    pub tls: Option<TlsSettings>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            notes: EndpointConfig::new(defaults::NOTES_GRPC_ADDR),
            tasks: EndpointConfig::new(defaults::TASKS_GRPC_ADDR),
            tls: None,
            timeout: defaults::PROVIDER_TIMEOUT,
            connect_timeout: defaults::PROVIDER_CONNECT_TIMEOUT,
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables (with defaults).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let secs = |key: &str, default: Duration| {
            non_empty(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        let tls_enabled = non_empty("GRPC_TLS_ENABLE")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let tls = tls_enabled.then(|| TlsSettings {
            ca_path: non_empty("GRPC_TLS_CA_PATH").map(PathBuf::from),
            cert_path: non_empty("GRPC_TLS_CERT_PATH").map(PathBuf::from),
            key_path: non_empty("GRPC_TLS_KEY_PATH").map(PathBuf::from),
        });

        Self {
            notes: EndpointConfig {
                address: non_empty("NOTES_GRPC_ADDR")
                    .unwrap_or_else(|| defaults::NOTES_GRPC_ADDR.to_string()),
                server_name: non_empty("NOTES_GRPC_SERVER_NAME"),
            },
            tasks: EndpointConfig {
                address: non_empty("TASKS_GRPC_ADDR")
                    .unwrap_or_else(|| defaults::TASKS_GRPC_ADDR.to_string()),
                server_name: non_empty("TASKS_GRPC_SERVER_NAME"),
            },
            tls,
            timeout: secs("GRPC_TIMEOUT_SECS", defaults::PROVIDER_TIMEOUT),
            connect_timeout: secs(
                "GRPC_CONNECT_TIMEOUT_SECS",
                defaults::PROVIDER_CONNECT_TIMEOUT,
            ),
        }
    }
}
