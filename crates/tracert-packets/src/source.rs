//! Packet capture source trait.

use async_trait::async_trait;
use tracert_core::TraceError;

/// Trait for packet capture sources.
#[async_trait]
pub trait Source: Send + Sync {
    /// Reads a packet (starting at IP layer) into the buffer.
    /// Returns the number of bytes read.
    ///
    /// Waits until a packet is available; callers bound the wait with a
    /// timeout.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TraceError>;

    /// Closes the source.
    async fn close(&mut self) -> Result<(), TraceError>;
}
