use serde::Deserialize;

/// Where the HTTP endpoints are served.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthConfig {
    /// Address to bind
    ///
    /// Common values:
    /// - `[::]:8080` (IPv6 any address)
    /// - `0.0.0.0:8080` (IPv4 any address)
    /// - `127.0.0.1:8080` (localhost only)
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_listen_address() -> String {
    "[::]:8080".to_string()
}

const fn default_request_timeout_ms() -> u64 {
    1000
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}
