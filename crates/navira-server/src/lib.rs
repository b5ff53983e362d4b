//! # navira-server
//!
//! WebSocket ingest endpoint for location pings, SOS alerts and incident
//! reports. Each connection gets its own task; incident attachments are
//! decoded and written under the configured reports directory.

pub mod attachments;
pub mod config;
pub mod connection;
pub mod handler;
pub mod server;

pub use attachments::{Attachment, AttachmentStore};
pub use config::{AttachmentNaming, ServerConfig};
pub use handler::{handle_frame, FrameOutcome};
pub use server::{build_router, start, ServerHandle, StartupError};
