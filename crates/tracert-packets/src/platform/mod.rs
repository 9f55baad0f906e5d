//! Platform-specific packet I/O implementations.

#[cfg(target_os = "linux")]
pub mod linux;

use crate::SourceSinkHandle;
use tracert_core::TraceError;

/// Creates a Source and Sink appropriate for the current platform.
pub fn new_source_sink() -> Result<SourceSinkHandle, TraceError> {
    #[cfg(target_os = "linux")]
    return linux::new_source_sink();

    #[cfg(not(target_os = "linux"))]
    return Err(TraceError::Unsupported(
        "raw ICMP sockets are only implemented for Linux".to_string(),
    ));
}
