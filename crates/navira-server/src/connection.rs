//! One task per accepted WebSocket: read frames in order, handle each fully
//! before reading the next. Nothing is ever sent back.

use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message as WsMessage;
use futures::{Stream, StreamExt};
use navira_core::ConnectionId;
use tracing::{debug, info};

use crate::attachments::AttachmentStore;
use crate::handler::{handle_frame, FrameOutcome};

/// Counters reported when a connection ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub frames: u64,
    pub invalid: u64,
}

/// Keeps the live-connection gauge in step with the task lifetime.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::Relaxed);
        Self(active)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Drive one connection until the peer closes it or the transport fails.
pub async fn run_connection<S, E>(
    mut frames: S,
    store: Arc<AttachmentStore>,
    active: Arc<AtomicUsize>,
) -> ConnectionStats
where
    S: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: Display,
{
    let _guard = ActiveGuard::new(active);
    let conn = ConnectionId::new();
    let mut stats = ConnectionStats::default();
    info!(conn = %conn, "Client connected");

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => {
                stats.frames += 1;
                if let FrameOutcome::Invalid(_) = handle_frame(text.as_str(), &store, &conn).await {
                    stats.invalid += 1;
                }
            }
            Ok(WsMessage::Binary(data)) => {
                debug!(conn = %conn, len = data.len(), "Ignoring binary frame");
            }
            Ok(WsMessage::Close(_)) => break,
            Ok(WsMessage::Ping(_) | WsMessage::Pong(_)) => {} // axum answers pings
            Err(e) => {
                debug!(conn = %conn, error = %e, "Connection read failed");
                break;
            }
        }
    }

    info!(conn = %conn, frames = stats.frames, invalid = stats.invalid, "Client disconnected");
    stats
}
