//! Error types for trace operations.

use thiserror::Error;

/// Main error type for trace operations.
///
/// Probe-level conditions (a probe timing out, or a fatal probe failure) are
/// not errors: they are reported as [`crate::ProbeOutcome`] values and end up
/// in the session status.
#[derive(Error, Debug)]
pub enum TraceError {
    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    // Resolution errors
    #[error("Unable to resolve target system name {target}: {reason}")]
    UnresolvableTarget { target: String, reason: String },

    // Socket/IO errors
    #[error("Failed to create socket: {0}")]
    SocketCreation(#[source] std::io::Error),

    #[error("Failed to set socket option {option}: {source}")]
    SocketOption {
        option: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    // Packet errors
    #[error("Packet too short: expected at least {expected} bytes, got {actual}")]
    PacketTooShort { expected: usize, actual: usize },

    #[error("Failed to parse {layer} layer: {reason}")]
    PacketParseFailed { layer: &'static str, reason: String },

    #[error("Packet did not match probe")]
    PacketMismatch,

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TraceError {
    /// Returns true if this error is retryable (e.g., packet mismatch, parse failure).
    ///
    /// Raw sockets see every ICMP message addressed to the host, so a packet
    /// that fails to parse or belongs to somebody else means "keep reading",
    /// not "give up on this probe".
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PacketMismatch | Self::PacketParseFailed { .. } | Self::PacketTooShort { .. }
        )
    }

    pub(crate) fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// Errors reported by a [`crate::NameResolver`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no address found for {0}")]
    NotFound(String),

    #[error("malformed host name {0}")]
    Malformed(String),

    #[error("resolver transport error: {0}")]
    Transport(String),
}
