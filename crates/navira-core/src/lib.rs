pub mod errors;
pub mod ids;
pub mod messages;

pub use errors::{AttachmentError, ParseError};
pub use ids::ConnectionId;
pub use messages::{parse_frame, IncidentReport, InboundMessage, PositionReport};
