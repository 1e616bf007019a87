use serde::Deserialize;
use std::time::Duration;

/// Server configuration. Every field has a default; the CLI (or any caller
/// embedding the server) constructs this record directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Address the DBGp listener binds to.
    pub listen_host: String,
    /// Port the DBGp listener binds to. Xdebug's default is 9003.
    pub listen_port: u16,
    /// How long a single DBGp command may wait for its response.
    pub command_timeout_ms: u64,
    /// Negotiated `max_depth` feature: property tree depth.
    pub max_depth: u32,
    /// Negotiated `max_children` feature: children per property page.
    pub max_children: u32,
    /// Negotiated `max_data` feature: bytes of value data per property.
    pub max_data: u32,
    /// Default log level when RUST_LOG is not set.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            listen_port: 9003,
            command_timeout_ms: 30_000,
            max_depth: 3,
            max_children: 128,
            max_data: 2048,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }
}
