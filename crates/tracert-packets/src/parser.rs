//! ICMP reply parsing using etherparse.

use etherparse::{Icmpv4Type, IpHeader, Ipv4HeaderSlice, PacketHeaders, TransportHeader};
use std::net::{IpAddr, Ipv4Addr};
use tracert_core::TraceError;

pub const ICMP_ECHO_REPLY: u8 = 0;
pub const ICMP_DEST_UNREACHABLE: u8 = 3;
pub const ICMP_SOURCE_QUENCH: u8 = 4;
pub const ICMP_ECHO_REQUEST: u8 = 8;
pub const ICMP_TIME_EXCEEDED: u8 = 11;
pub const ICMP_PARAMETER_PROBLEM: u8 = 12;

const IPPROTO_ICMP: u8 = 1;

/// IP source/destination pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IpPair {
    /// Source IP address.
    pub src_addr: Option<IpAddr>,
    /// Destination IP address.
    pub dst_addr: Option<IpAddr>,
}

/// Identifier and sequence number of an ICMP echo message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoFields {
    pub id: u16,
    pub seq: u16,
}

/// A parsed ICMPv4 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpReply {
    /// Addresses from the outer IP header.
    pub ip_pair: IpPair,
    pub icmp_type: u8,
    pub icmp_code: u8,
    /// For echo messages, their own fields. For error messages, the fields of
    /// the echo request quoted in the error, if it quoted one.
    pub echo: Option<EchoFields>,
    /// Addresses of the IP packet quoted in an error message.
    pub quoted_pair: IpPair,
}

impl IcmpReply {
    pub fn is_echo_reply(&self) -> bool {
        self.icmp_type == ICMP_ECHO_REPLY
    }

    pub fn is_ttl_exceeded(&self) -> bool {
        self.icmp_type == ICMP_TIME_EXCEEDED
    }

    /// True for ICMP error messages, which quote the packet that caused them.
    pub fn is_error(&self) -> bool {
        matches!(
            self.icmp_type,
            ICMP_DEST_UNREACHABLE | ICMP_SOURCE_QUENCH | ICMP_TIME_EXCEEDED | ICMP_PARAMETER_PROBLEM
        )
    }
}

/// Parses a raw IPv4 packet carrying an ICMP message.
pub fn parse_icmp_reply(data: &[u8]) -> Result<IcmpReply, TraceError> {
    let headers =
        PacketHeaders::from_ip_slice(data).map_err(|e| TraceError::PacketParseFailed {
            layer: "IP",
            reason: e.to_string(),
        })?;

    let ip_pair = match &headers.ip {
        Some(IpHeader::Version4(ipv4, _)) => IpPair {
            src_addr: Some(IpAddr::V4(Ipv4Addr::from(ipv4.source))),
            dst_addr: Some(IpAddr::V4(Ipv4Addr::from(ipv4.destination))),
        },
        Some(IpHeader::Version6(_, _)) => return Err(TraceError::PacketMismatch),
        None => {
            return Err(TraceError::PacketParseFailed {
                layer: "IP",
                reason: "No IP header found".to_string(),
            })
        }
    };

    let icmp = match headers.transport {
        Some(TransportHeader::Icmpv4(icmp)) => icmp,
        _ => return Err(TraceError::PacketMismatch),
    };

    let mut reply = IcmpReply {
        ip_pair,
        icmp_type: icmp.to_bytes()[0],
        icmp_code: icmp.to_bytes()[1],
        echo: None,
        quoted_pair: IpPair::default(),
    };

    match icmp.icmp_type {
        Icmpv4Type::EchoReply(echo) | Icmpv4Type::EchoRequest(echo) => {
            reply.echo = Some(EchoFields {
                id: echo.id,
                seq: echo.seq,
            });
        }
        _ if reply.is_error() => {
            let (quoted_pair, echo) = parse_quoted_packet(headers.payload)?;
            reply.quoted_pair = quoted_pair;
            reply.echo = echo;
        }
        _ => {}
    }

    Ok(reply)
}

/// Parses the IP header and first 8 payload bytes quoted by an ICMP error.
fn parse_quoted_packet(payload: &[u8]) -> Result<(IpPair, Option<EchoFields>), TraceError> {
    let inner = Ipv4HeaderSlice::from_slice(payload).map_err(|e| {
        TraceError::PacketParseFailed {
            layer: "Inner IP",
            reason: e.to_string(),
        }
    })?;

    let pair = IpPair {
        src_addr: Some(IpAddr::V4(inner.source_addr())),
        dst_addr: Some(IpAddr::V4(inner.destination_addr())),
    };

    if inner.protocol() != IPPROTO_ICMP {
        return Ok((pair, None));
    }

    // Type(1) + Code(1) + Checksum(2) + ID(2) + Seq(2)
    let quoted = &payload[inner.slice().len()..];
    if quoted.len() < 8 {
        return Err(TraceError::PacketTooShort {
            expected: 8,
            actual: quoted.len(),
        });
    }
    if quoted[0] != ICMP_ECHO_REQUEST {
        return Ok((pair, None));
    }

    let echo = EchoFields {
        id: u16::from_be_bytes([quoted[4], quoted[5]]),
        seq: u16::from_be_bytes([quoted[6], quoted[7]]),
    };
    Ok((pair, Some(echo)))
}
