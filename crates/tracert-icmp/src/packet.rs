//! ICMP packet construction using pnet.

use pnet_packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet_packet::icmp::{IcmpCode, IcmpPacket, IcmpTypes};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::{Ipv4Flags, MutableIpv4Packet};
use std::net::Ipv4Addr;
use tracert_core::TraceError;

/// Size of the (zeroed) echo request payload.
pub const ECHO_PAYLOAD_SIZE: usize = 32;

const IPV4_HEADER_LEN: usize = 20;
const ICMP_HEADER_LEN: usize = 8;

/// Creates an IPv4 packet carrying an ICMP Echo Request.
///
/// The Don't Fragment flag is set and the IP identification mirrors the
/// sequence number.
pub fn create_echo_request(
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    ttl: u8,
    echo_id: u16,
    seq: u16,
) -> Result<Vec<u8>, TraceError> {
    let icmp_len = ICMP_HEADER_LEN + ECHO_PAYLOAD_SIZE;
    let ip_len = IPV4_HEADER_LEN + icmp_len;

    let mut buffer = vec![0u8; ip_len];

    let mut ip_packet = MutableIpv4Packet::new(&mut buffer)
        .ok_or_else(|| TraceError::Internal("Failed to create IP packet".to_string()))?;

    ip_packet.set_version(4);
    ip_packet.set_header_length(5);
    ip_packet.set_total_length(ip_len as u16);
    ip_packet.set_identification(seq);
    ip_packet.set_flags(Ipv4Flags::DontFragment);
    ip_packet.set_ttl(ttl);
    ip_packet.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
    ip_packet.set_source(src_ip);
    ip_packet.set_destination(dst_ip);

    let ip_checksum = pnet_packet::ipv4::checksum(&ip_packet.to_immutable());
    ip_packet.set_checksum(ip_checksum);

    {
        let mut icmp_packet = MutableEchoRequestPacket::new(&mut buffer[IPV4_HEADER_LEN..])
            .ok_or_else(|| TraceError::Internal("Failed to create ICMP packet".to_string()))?;

        icmp_packet.set_icmp_type(IcmpTypes::EchoRequest);
        icmp_packet.set_icmp_code(IcmpCode::new(0));
        icmp_packet.set_identifier(echo_id);
        icmp_packet.set_sequence_number(seq);
        icmp_packet.set_payload(&[0u8; ECHO_PAYLOAD_SIZE]);
    }

    {
        let icmp_view = IcmpPacket::new(&buffer[IPV4_HEADER_LEN..])
            .ok_or_else(|| TraceError::Internal("Failed to create ICMP view".to_string()))?;
        let icmp_checksum = pnet_packet::icmp::checksum(&icmp_view);
        buffer[IPV4_HEADER_LEN + 2..IPV4_HEADER_LEN + 4]
            .copy_from_slice(&icmp_checksum.to_be_bytes());
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_echo_request() {
        let src_ip: Ipv4Addr = "192.168.1.1".parse().unwrap();
        let dst_ip: Ipv4Addr = "8.8.8.8".parse().unwrap();

        let packet = create_echo_request(src_ip, dst_ip, 5, 12345, 1).unwrap();

        // 20 IP + 8 ICMP header + 32 payload
        assert_eq!(packet.len(), 60);
        assert_eq!(packet[0] >> 4, 4);
        // DF flag
        assert_eq!(packet[6] & 0x40, 0x40);
        assert_eq!(packet[8], 5);
        assert_eq!(packet[9], 1);
        assert_eq!(packet[20], 8);
        assert_eq!(packet[21], 0);
        assert!(packet[28..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_echo_id_and_seq() {
        let src_ip: Ipv4Addr = "192.168.1.1".parse().unwrap();
        let dst_ip: Ipv4Addr = "8.8.8.8".parse().unwrap();

        let packet = create_echo_request(src_ip, dst_ip, 10, 0xABCD, 0x0102).unwrap();

        assert_eq!(u16::from_be_bytes([packet[24], packet[25]]), 0xABCD);
        assert_eq!(u16::from_be_bytes([packet[26], packet[27]]), 0x0102);
        // IP identification mirrors the sequence number.
        assert_eq!(u16::from_be_bytes([packet[4], packet[5]]), 0x0102);
    }

    #[test]
    fn test_checksums_verify() {
        let packet = create_echo_request(
            "10.1.1.1".parse().unwrap(),
            "10.2.2.2".parse().unwrap(),
            1,
            7,
            9,
        )
        .unwrap();

        // One's-complement sum over a header including its checksum is 0xFFFF.
        let fold = |bytes: &[u8]| {
            let mut sum: u32 = bytes
                .chunks(2)
                .map(|c| u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)]) as u32)
                .sum();
            while sum > 0xFFFF {
                sum = (sum & 0xFFFF) + (sum >> 16);
            }
            sum as u16
        };
        assert_eq!(fold(&packet[..20]), 0xFFFF);
        assert_eq!(fold(&packet[20..]), 0xFFFF);
    }
}
