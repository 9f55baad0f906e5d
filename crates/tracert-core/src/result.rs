//! Result types produced by a trace.

use crate::types::serialize_millis;
use crate::{ProbeOutcome, TraceParams};
use serde::Serialize;
use std::net::IpAddr;
use std::time::Duration;
use uuid::Uuid;

/// The resolved destination of a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceTarget {
    /// Host identifier as given by the user, trimmed.
    pub name: String,
    /// Address the name resolved to.
    pub addr: IpAddr,
    /// Reverse DNS name of the address, if one was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_dns: Option<String>,
}

/// All probes sent for one TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HopRecord {
    /// The TTL for this hop.
    pub ttl: u8,
    /// Per-probe outcomes, in the order they were sent.
    pub probes: Vec<ProbeOutcome>,
    /// The address reported by the hop's last probe (None if it got no reply).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responder: Option<IpAddr>,
    /// Reverse DNS name of the responder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_dns: Option<String>,
}

impl HopRecord {
    pub fn new(ttl: u8) -> Self {
        Self {
            ttl,
            probes: Vec::with_capacity(crate::NUMBER_OF_PACKETS),
            responder: None,
            reverse_dns: None,
        }
    }

    /// Appends a probe outcome. The latest probe always decides the responder.
    pub fn push(&mut self, outcome: ProbeOutcome) {
        self.responder = outcome.responder();
        self.probes.push(outcome);
    }

    /// True when the hop's last probe got no reply.
    pub fn is_timed_out(&self) -> bool {
        matches!(self.probes.last(), Some(ProbeOutcome::TimedOut))
    }
}

/// How a trace ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TraceStatus {
    /// The destination answered.
    Completed,
    /// Every TTL up to the maximum was probed without reaching the destination.
    Exhausted,
    /// A probe failed fatally, or the trace was cancelled.
    Aborted { message: String },
}

impl TraceStatus {
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::Aborted {
            message: message.into(),
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// A finished trace.
#[derive(Debug, Clone, Serialize)]
pub struct TraceSession {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    pub target: TraceTarget,
    pub max_hops: u8,
    #[serde(rename = "timeout_ms", serialize_with = "serialize_millis")]
    pub timeout: Duration,
    /// Hops in TTL order, starting at 1.
    pub hops: Vec<HopRecord>,
    #[serde(flatten)]
    pub status: TraceStatus,
}

impl TraceSession {
    pub(crate) fn new(
        target: TraceTarget,
        params: &TraceParams,
        hops: Vec<HopRecord>,
        status: TraceStatus,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            target,
            max_hops: params.max_hops,
            timeout: params.timeout,
            hops,
            status,
        }
    }

    /// Serializes the session to JSON with indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
