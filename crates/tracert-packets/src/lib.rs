//! Packet I/O for tracert.
//!
//! Provides the raw-socket [`Source`]/[`Sink`] pair the ICMP probe sender
//! works over, and the parser for the ICMP messages it reads back.

pub mod parser;
pub mod platform;
pub mod sink;
pub mod source;

pub use parser::{parse_icmp_reply, EchoFields, IcmpReply, IpPair};
pub use sink::Sink;
pub use source::Source;

use std::net::{IpAddr, SocketAddr, UdpSocket};
use tracert_core::TraceError;

/// Handle containing both source and sink for packet I/O.
pub struct SourceSinkHandle {
    /// Receives ICMP messages (starting at the IP layer).
    pub source: Box<dyn Source>,
    /// Sends complete IPv4 packets.
    pub sink: Box<dyn Sink>,
}

/// Opens the raw sockets used to send echo requests and read ICMP replies.
pub fn new_source_sink() -> Result<SourceSinkHandle, TraceError> {
    platform::new_source_sink()
}

/// Returns the local address the kernel would use to reach `target`.
///
/// No packet is sent: connecting a UDP socket only selects a route.
pub fn local_addr_for(target: IpAddr) -> Result<IpAddr, TraceError> {
    let socket = match target {
        IpAddr::V4(_) => UdpSocket::bind("0.0.0.0:0"),
        IpAddr::V6(_) => UdpSocket::bind("[::]:0"),
    }
    .map_err(TraceError::SocketCreation)?;

    socket
        .connect(SocketAddr::new(target, 33434))
        .map_err(TraceError::SocketCreation)?;

    socket
        .local_addr()
        .map(|addr| addr.ip())
        .map_err(TraceError::SocketCreation)
}
