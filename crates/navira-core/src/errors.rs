use std::path::PathBuf;

/// A frame that could not be turned into an [`InboundMessage`](crate::InboundMessage).
/// Recovered per frame: the connection keeps reading.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("invalid {kind} message: {source}")]
    InvalidField {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ParseError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "invalid_json",
            Self::NotAnObject(_) => "not_an_object",
            Self::InvalidField { .. } => "invalid_field",
        }
    }
}

/// Failure to persist one attachment. Never aborts sibling attachments.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("base64 decode failed: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("expected a base64 string, got {0}")]
    NotAString(&'static str),
    #[error("write to {} failed: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AttachmentError {
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Decode(_) | Self::NotAString(_) => "decode",
            Self::Write { .. } => "write",
        }
    }
}
