//! ICMP echo probe sender.

use crate::packet::create_echo_request;
use crate::status::{describe_error, describe_icmp_status};
use async_trait::async_trait;
use rand::Rng;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tracert_core::{ProbeOutcome, ProbeSender, TraceError};
use tracert_packets::{local_addr_for, parse_icmp_reply, IcmpReply, Sink, Source};
use tracing::{debug, trace};

const READ_BUFFER_SIZE: usize = 1500;

/// What uniquely identifies the probe currently in flight.
#[derive(Debug, Clone, Copy)]
struct ProbeKey {
    src: Ipv4Addr,
    dst: Ipv4Addr,
    echo_id: u16,
    seq: u16,
}

/// How a received ICMP message answered the probe in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Destination(IpAddr),
    TtlExceeded(IpAddr),
    Error { icmp_type: u8, icmp_code: u8 },
}

/// Where the source address of outgoing probes comes from.
#[derive(Debug, Clone, Copy)]
enum SourceIp {
    Fixed(Ipv4Addr),
    Routed { dst: Ipv4Addr, src: Ipv4Addr },
}

/// Sends ICMP Echo Requests with a chosen TTL over raw sockets.
///
/// Owns its sockets and read buffer; one probe is in flight at a time.
pub struct IcmpProbeSender {
    /// Packet source for receiving.
    source: Box<dyn Source>,
    /// Packet sink for sending.
    sink: Box<dyn Sink>,
    /// Read buffer.
    buffer: Vec<u8>,
    /// Echo identifier for every probe of this sender.
    echo_id: u16,
    /// Sequence number of the next probe.
    next_seq: u16,
    /// Source address, either fixed or looked up once per target.
    src_ip: Option<SourceIp>,
}

impl IcmpProbeSender {
    /// Opens the platform raw sockets.
    pub fn open() -> Result<Self, TraceError> {
        let handle = tracert_packets::new_source_sink()?;
        Ok(Self::new(handle.source, handle.sink))
    }

    /// Creates a sender over an existing source and sink.
    pub fn new(source: Box<dyn Source>, sink: Box<dyn Sink>) -> Self {
        Self {
            source,
            sink,
            buffer: vec![0u8; READ_BUFFER_SIZE],
            echo_id: rand::thread_rng().gen(),
            next_seq: 1,
            src_ip: None,
        }
    }

    /// Uses `src` as the source address of every probe instead of asking
    /// the routing table.
    pub fn with_source_ip(mut self, src: Ipv4Addr) -> Self {
        self.src_ip = Some(SourceIp::Fixed(src));
        self
    }

    pub fn echo_id(&self) -> u16 {
        self.echo_id
    }

    fn source_ip_for(&mut self, dst: Ipv4Addr) -> Result<Ipv4Addr, TraceError> {
        match self.src_ip {
            Some(SourceIp::Fixed(src)) => return Ok(src),
            Some(SourceIp::Routed { dst: cached, src }) if cached == dst => return Ok(src),
            _ => {}
        }

        let src = match local_addr_for(IpAddr::V4(dst))? {
            IpAddr::V4(src) => src,
            IpAddr::V6(_) => {
                return Err(TraceError::Unsupported(
                    "IPv6 source address for an IPv4 target".to_string(),
                ))
            }
        };
        debug!(src = %src, dst = %dst, "Using local address");
        self.src_ip = Some(SourceIp::Routed { dst, src });
        Ok(src)
    }

    fn take_seq(&mut self) -> u16 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        seq
    }

    /// Reads until a message answering `key` arrives.
    ///
    /// Unrelated or unparsable packets are skipped; the caller bounds the
    /// wait with the probe timeout.
    async fn receive_answer(&mut self, key: ProbeKey) -> Result<Answer, TraceError> {
        loop {
            let n = self.source.read(&mut self.buffer).await?;

            match parse_icmp_reply(&self.buffer[..n]).and_then(|reply| match_reply(&reply, &key)) {
                Ok(answer) => return Ok(answer),
                Err(e) if e.is_retryable() => {
                    trace!(error = %e, "Ignoring packet");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Decides whether `reply` answers the probe identified by `key`.
fn match_reply(reply: &IcmpReply, key: &ProbeKey) -> Result<Answer, TraceError> {
    let Some(echo) = reply.echo else {
        return Err(TraceError::PacketMismatch);
    };
    if echo.id != key.echo_id || echo.seq != key.seq {
        trace!(
            expected_id = key.echo_id,
            actual_id = echo.id,
            expected_seq = key.seq,
            actual_seq = echo.seq,
            "Ignored ICMP message for a different probe"
        );
        return Err(TraceError::PacketMismatch);
    }

    let responder = reply
        .ip_pair
        .src_addr
        .ok_or_else(|| TraceError::PacketParseFailed {
            layer: "IP",
            reason: "Missing source address".to_string(),
        })?;

    if reply.is_echo_reply() {
        if responder != IpAddr::V4(key.dst) {
            return Err(TraceError::PacketMismatch);
        }
        return Ok(Answer::Destination(responder));
    }

    if !reply.is_error() {
        return Err(TraceError::PacketMismatch);
    }

    // The quoted packet must be the request we sent.
    if reply.quoted_pair.dst_addr != Some(IpAddr::V4(key.dst))
        || reply.quoted_pair.src_addr != Some(IpAddr::V4(key.src))
    {
        trace!(
            quoted_src = ?reply.quoted_pair.src_addr,
            quoted_dst = ?reply.quoted_pair.dst_addr,
            "Ignored ICMP error quoting a different packet"
        );
        return Err(TraceError::PacketMismatch);
    }

    if reply.is_ttl_exceeded() {
        Ok(Answer::TtlExceeded(responder))
    } else {
        Ok(Answer::Error {
            icmp_type: reply.icmp_type,
            icmp_code: reply.icmp_code,
        })
    }
}

fn classify(answer: Answer, rtt: Duration) -> ProbeOutcome {
    match answer {
        Answer::Destination(addr) => ProbeOutcome::Reached { addr, rtt },
        Answer::TtlExceeded(addr) => ProbeOutcome::HopReply { addr, rtt },
        Answer::Error {
            icmp_type,
            icmp_code,
        } => ProbeOutcome::failed(describe_icmp_status(icmp_type, icmp_code)),
    }
}

#[async_trait]
impl ProbeSender for IcmpProbeSender {
    async fn send(&mut self, target: IpAddr, ttl: u8, timeout: Duration) -> ProbeOutcome {
        let IpAddr::V4(dst) = target else {
            return ProbeOutcome::failed("IPv6 is not supported");
        };

        let src = match self.source_ip_for(dst) {
            Ok(src) => src,
            Err(e) => return ProbeOutcome::failed(describe_error(&e)),
        };

        let key = ProbeKey {
            src,
            dst,
            echo_id: self.echo_id,
            seq: self.take_seq(),
        };

        let packet = match create_echo_request(src, dst, ttl, key.echo_id, key.seq) {
            Ok(packet) => packet,
            Err(e) => return ProbeOutcome::failed(describe_error(&e)),
        };

        trace!(
            ttl = ttl,
            echo_id = key.echo_id,
            seq = key.seq,
            "Sending ICMP Echo Request probe"
        );

        let started = Instant::now();
        // ICMP doesn't have a port; port 0 is a placeholder.
        if let Err(e) = self.sink.write_to(&packet, SocketAddr::new(target, 0)).await {
            debug!(ttl = ttl, error = %e, "Failed to send probe");
            return ProbeOutcome::failed(describe_error(&e));
        }

        match tokio::time::timeout(timeout, self.receive_answer(key)).await {
            Ok(Ok(answer)) => {
                let outcome = classify(answer, started.elapsed());
                debug!(ttl = ttl, seq = key.seq, outcome = ?outcome, "Received probe response");
                outcome
            }
            Ok(Err(e)) => {
                debug!(ttl = ttl, error = %e, "Fatal error during receive");
                ProbeOutcome::failed(describe_error(&e))
            }
            Err(_) => {
                debug!(ttl = ttl, seq = key.seq, "Timeout waiting for response");
                ProbeOutcome::TimedOut
            }
        }
    }

    async fn close(&mut self) -> Result<(), TraceError> {
        let sink_result = self.sink.close().await;
        let source_result = self.source.close().await;

        sink_result?;
        source_result?;

        Ok(())
    }
}
