//! Per-frame dispatch: parse, classify by `type`, log, persist attachments.

use std::path::PathBuf;

use navira_core::messages::{attachment_text, kind_label};
use navira_core::{
    parse_frame, AttachmentError, ConnectionId, InboundMessage, IncidentReport, ParseError,
    PositionReport,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::attachments::{Attachment, AttachmentStore};

/// Longest slice of a rejected frame echoed into the log, in bytes.
const MAX_LOGGED_FRAME: usize = 512;

/// One attachment that could not be persisted.
#[derive(Debug)]
pub struct AttachmentFailure {
    pub attachment: Attachment,
    pub error: AttachmentError,
}

/// What processing an incident produced.
#[derive(Debug)]
pub struct IncidentSummary {
    /// Timestamp used in file names (client value or generated default).
    pub timestamp: String,
    pub saved: Vec<PathBuf>,
    pub failures: Vec<AttachmentFailure>,
}

/// Result of handling one frame. Handling never fails; errors are recorded here.
#[derive(Debug)]
pub enum FrameOutcome {
    Location(PositionReport),
    Sos(PositionReport),
    Incident(IncidentSummary),
    Unknown(Option<Value>),
    Invalid(ParseError),
}

/// Handle one text frame received on `conn`.
#[instrument(skip_all, fields(conn = %conn))]
pub async fn handle_frame(
    text: &str,
    store: &AttachmentStore,
    conn: &ConnectionId,
) -> FrameOutcome {
    let message = match parse_frame(text) {
        Ok(message) => message,
        Err(error) => {
            warn!(
                frame = %truncate(text, MAX_LOGGED_FRAME),
                kind = error.error_kind(),
                error = %error,
                "Invalid message"
            );
            return FrameOutcome::Invalid(error);
        }
    };

    match message {
        InboundMessage::Location(report) => {
            info!(
                lat = %display_opt(report.lat),
                lon = %display_opt(report.lon),
                timestamp = %display_opt(report.timestamp.as_deref()),
                "GPS update"
            );
            FrameOutcome::Location(report)
        }
        InboundMessage::Sos(report) => {
            warn!(
                lat = %display_opt(report.lat),
                lon = %display_opt(report.lon),
                timestamp = %display_opt(report.timestamp.as_deref()),
                "SOS alert"
            );
            FrameOutcome::Sos(report)
        }
        InboundMessage::Incident(report) => {
            FrameOutcome::Incident(handle_incident(report, store, conn).await)
        }
        InboundMessage::Unknown { kind } => {
            info!(kind = %kind_label(kind.as_ref()), "Unknown message type");
            FrameOutcome::Unknown(kind)
        }
    }
}

async fn handle_incident(
    report: IncidentReport,
    store: &AttachmentStore,
    conn: &ConnectionId,
) -> IncidentSummary {
    let timestamp = report.resolved_timestamp();
    info!(
        timestamp = %timestamp,
        description = %report.description,
        reporter = %display_opt(report.reporter_id.as_deref()),
        images = report.images.len(),
        voice = report.voice_payload().is_some(),
        "Incident report"
    );

    let mut summary = IncidentSummary {
        timestamp,
        saved: Vec::new(),
        failures: Vec::new(),
    };

    let voice = report.voice_payload().map(|v| (Attachment::Voice, v));
    let attachments = report
        .images
        .iter()
        .enumerate()
        .map(|(idx, img)| (Attachment::Image(idx), img))
        .chain(voice);

    for (attachment, payload) in attachments {
        let saved = match attachment_text(payload) {
            Ok(text) => store.save(&summary.timestamp, conn, attachment, text).await,
            Err(e) => Err(e),
        };
        match saved {
            Ok(path) => {
                info!(attachment = %attachment, path = %path.display(), "Saved attachment");
                summary.saved.push(path);
            }
            Err(error) => {
                warn!(
                    attachment = %attachment,
                    kind = error.error_kind(),
                    error = %error,
                    "Failed to save attachment"
                );
                summary.failures.push(AttachmentFailure { attachment, error });
            }
        }
    }

    summary
}

fn display_opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "null".into(), |v| v.to_string())
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
