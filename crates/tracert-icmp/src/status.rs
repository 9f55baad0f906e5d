//! Human-readable descriptions of probe failures.
//!
//! ICMP error messages and send errors are reduced to a short list of status
//! names; anything unrecognised becomes [`GENERAL_FAILURE`].

use std::io;
use tracert_core::TraceError;
use tracert_packets::parser::{
    ICMP_DEST_UNREACHABLE, ICMP_PARAMETER_PROBLEM, ICMP_SOURCE_QUENCH,
};

pub const GENERAL_FAILURE: &str = "General Failure";
pub const DESTINATION_NETWORK_UNREACHABLE: &str = "Destination network unreachable";
pub const DESTINATION_HOST_UNREACHABLE: &str = "Destination host unreachable";
pub const DESTINATION_PROTOCOL_UNREACHABLE: &str = "Destination protocol unreachable";
pub const DESTINATION_PORT_UNREACHABLE: &str = "Destination port unreachable";
pub const DESTINATION_PROHIBITED: &str = "Destination prohibited";
pub const PACKET_TOO_BIG: &str = "Packet too big";
pub const SOURCE_QUENCH: &str = "Source quench";
pub const BAD_HEADER: &str = "Bad header";
pub const PERMISSION_DENIED: &str = "Permission denied";
pub const NO_RESOURCES: &str = "No resources";

/// Describes an ICMP error message that answered one of our probes.
pub fn describe_icmp_status(icmp_type: u8, icmp_code: u8) -> &'static str {
    match (icmp_type, icmp_code) {
        (ICMP_DEST_UNREACHABLE, 0 | 6 | 11) => DESTINATION_NETWORK_UNREACHABLE,
        (ICMP_DEST_UNREACHABLE, 1 | 7 | 12) => DESTINATION_HOST_UNREACHABLE,
        (ICMP_DEST_UNREACHABLE, 2) => DESTINATION_PROTOCOL_UNREACHABLE,
        (ICMP_DEST_UNREACHABLE, 3) => DESTINATION_PORT_UNREACHABLE,
        (ICMP_DEST_UNREACHABLE, 4) => PACKET_TOO_BIG,
        (ICMP_DEST_UNREACHABLE, 9 | 10 | 13) => DESTINATION_PROHIBITED,
        (ICMP_SOURCE_QUENCH, _) => SOURCE_QUENCH,
        (ICMP_PARAMETER_PROBLEM, _) => BAD_HEADER,
        _ => GENERAL_FAILURE,
    }
}

/// Describes an OS error raised while sending a probe.
///
/// Any errno outside the known table is a [`GENERAL_FAILURE`]. Errors that
/// carry no errno keep their own message.
pub fn describe_io_error(err: &io::Error) -> String {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return PERMISSION_DENIED.to_string();
    }

    match err.raw_os_error() {
        Some(errno) => describe_errno(errno).to_string(),
        None => err.to_string(),
    }
}

#[cfg(unix)]
fn describe_errno(errno: i32) -> &'static str {
    match errno {
        libc::ENETUNREACH => DESTINATION_NETWORK_UNREACHABLE,
        libc::EHOSTUNREACH => DESTINATION_HOST_UNREACHABLE,
        libc::EACCES | libc::EPERM => PERMISSION_DENIED,
        libc::EMSGSIZE => PACKET_TOO_BIG,
        libc::ENOBUFS => NO_RESOURCES,
        _ => GENERAL_FAILURE,
    }
}

#[cfg(not(unix))]
fn describe_errno(_errno: i32) -> &'static str {
    GENERAL_FAILURE
}

/// Describes a transport error raised while sending or receiving a probe.
pub fn describe_error(err: &TraceError) -> String {
    match err {
        TraceError::WriteFailed(io) | TraceError::SocketCreation(io) => describe_io_error(io),
        TraceError::SocketOption { source, .. } => describe_io_error(source),
        other => other.to_string(),
    }
}
