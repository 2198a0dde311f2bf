//! Error types for device matching.

use thiserror::Error;

/// Conditions reported by the bus layer.
///
/// Shape failures (a reply that does not carry the expected envelope) are
/// not errors: they collapse to an absent property at the call site.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HalError {
    #[error("Cannot connect to system bus: {message}")]
    BusUnavailable { message: String },

    #[error("Error communicating with D-Bus: {message}")]
    CommunicationError { message: String },

    #[error("Malformed D-Bus reply: {context}")]
    MalformedReply { context: String },

    #[error("Could not allocate D-Bus message: {context}")]
    AllocationFailed { context: String },
}

pub type Result<T> = std::result::Result<T, HalError>;
