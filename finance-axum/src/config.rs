//! Configuration types for the Axum HTTP server.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Configuration for the Axum HTTP server.
///
/// # Examples
///
/// ```
/// use finance_axum::config::AxumConfig;
///
/// let config = AxumConfig {
///     bind_address: "127.0.0.1:3000".parse().unwrap(),
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AxumConfig {
    /// The address to bind the server to
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

impl Default for AxumConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}
