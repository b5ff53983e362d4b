//! Server configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How attachment file names are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentNaming {
    /// `incident_<timestamp>_<index>.jpg`. Two incidents with the same
    /// timestamp overwrite each other.
    #[default]
    Timestamp,
    /// `incident_<timestamp>_<conn>_<index>.jpg`, unique per connection.
    TimestampAndConnection,
}

/// Configuration for the ingest server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"0.0.0.0"`).
    pub host: String,
    /// Port to bind (default `8765`, `0` for auto-assign).
    pub port: u16,
    /// Directory incident attachments are written to.
    pub reports_dir: PathBuf,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
    pub naming: AttachmentNaming,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8765,
            reports_dir: PathBuf::from("reports"),
            max_message_size: 16 * 1024 * 1024, // 16 MB
            naming: AttachmentNaming::Timestamp,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
