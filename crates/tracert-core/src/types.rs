//! Core types for trace operations.

use serde::{Serialize, Serializer};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Number of probes sent for every TTL.
pub const NUMBER_OF_PACKETS: usize = 3;
pub const DEFAULT_MAX_HOPS: u8 = 30;
pub const DEFAULT_TIMEOUT_MS: u64 = 4000;

/// Message carried by a session that was stopped through its [`CancelFlag`].
pub const CANCELLED_MESSAGE: &str = "Operation cancelled";

/// Outcome of a single echo probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The destination itself answered.
    Reached {
        addr: IpAddr,
        #[serde(rename = "rtt_ms", serialize_with = "serialize_millis")]
        rtt: Duration,
    },
    /// An intermediate node reported the TTL expired.
    HopReply {
        addr: IpAddr,
        #[serde(rename = "rtt_ms", serialize_with = "serialize_millis")]
        rtt: Duration,
    },
    /// No reply arrived before the timeout.
    TimedOut,
    /// Non-recoverable transport or network error.
    Failed { message: String },
}

impl ProbeOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Address of the node that answered, if any.
    pub fn responder(&self) -> Option<IpAddr> {
        match self {
            Self::Reached { addr, .. } | Self::HopReply { addr, .. } => Some(*addr),
            Self::TimedOut | Self::Failed { .. } => None,
        }
    }

    /// Round-trip time, if the probe was answered.
    pub fn rtt(&self) -> Option<Duration> {
        match self {
            Self::Reached { rtt, .. } | Self::HopReply { rtt, .. } => Some(*rtt),
            Self::TimedOut | Self::Failed { .. } => None,
        }
    }

    pub fn is_reached(&self) -> bool {
        matches!(self, Self::Reached { .. })
    }
}

/// Cooperative cancellation flag, checked between probes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Parameters for a trace.
#[derive(Debug, Clone)]
pub struct TraceParams {
    /// Highest TTL to probe.
    pub max_hops: u8,
    /// How long to wait for each probe's reply.
    pub timeout: Duration,
    /// Whether to reverse-resolve the target and every hop.
    pub resolve_names: bool,
    /// Stops the trace before the next probe once set.
    pub cancel: CancelFlag,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            resolve_names: true,
            cancel: CancelFlag::default(),
        }
    }
}

impl TraceParams {
    /// Validates the parameters.
    pub fn validate(&self) -> Result<(), crate::TraceError> {
        if self.max_hops == 0 {
            return Err(crate::TraceError::invalid_configuration(
                "max_hops must be greater than zero",
            ));
        }
        if self.timeout.is_zero() {
            return Err(crate::TraceError::invalid_configuration(
                "timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

pub(crate) fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_params_validate() {
        assert!(TraceParams::default().validate().is_ok());

        let no_hops = TraceParams {
            max_hops: 0,
            ..Default::default()
        };
        assert!(matches!(
            no_hops.validate(),
            Err(crate::TraceError::InvalidConfiguration { .. })
        ));

        let no_timeout = TraceParams {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            no_timeout.validate(),
            Err(crate::TraceError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_defaults() {
        let params = TraceParams::default();
        assert_eq!(params.max_hops, 30);
        assert_eq!(params.timeout, Duration::from_millis(4000));
        assert!(params.resolve_names);
        assert!(!params.cancel.is_cancelled());
    }

    #[test]
    fn test_outcome_accessors() {
        let addr: IpAddr = "10.0.0.1".parse().unwrap();
        let reply = ProbeOutcome::HopReply {
            addr,
            rtt: Duration::from_millis(7),
        };
        assert_eq!(reply.responder(), Some(addr));
        assert_eq!(reply.rtt(), Some(Duration::from_millis(7)));
        assert!(!reply.is_reached());

        assert_eq!(ProbeOutcome::TimedOut.responder(), None);
        assert_eq!(ProbeOutcome::failed("General Failure").rtt(), None);
    }

    #[test]
    fn test_outcome_serialization() {
        let reached = ProbeOutcome::Reached {
            addr: "8.8.8.8".parse().unwrap(),
            rtt: Duration::from_micros(12_500),
        };
        let json = serde_json::to_value(&reached).unwrap();
        assert_eq!(json["status"], "reached");
        assert_eq!(json["addr"], "8.8.8.8");
        assert_eq!(json["rtt_ms"], 12.5);

        let json = serde_json::to_value(ProbeOutcome::TimedOut).unwrap();
        assert_eq!(json["status"], "timed_out");
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }
}
