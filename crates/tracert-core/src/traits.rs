//! Core traits: the probe primitive, name resolution, and result display.

use crate::{HopRecord, ProbeOutcome, ResolveError, TraceError, TraceSession, TraceTarget};
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

/// Sends one echo probe at a time.
///
/// Implementations own their transport resources and are driven strictly
/// sequentially: a call to [`ProbeSender::send`] completes before the next one
/// starts.
#[async_trait]
pub trait ProbeSender: Send {
    /// Sends one echo request to `target` with the given TTL and waits up to
    /// `timeout` for an answer.
    ///
    /// Never retries. Transport problems are reported as
    /// [`ProbeOutcome::Failed`] rather than as an error.
    async fn send(&mut self, target: IpAddr, ttl: u8, timeout: Duration) -> ProbeOutcome;

    /// Releases transport resources.
    async fn close(&mut self) -> Result<(), TraceError> {
        Ok(())
    }
}

/// Forward and reverse name resolution.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Resolves a host name or literal address to an address.
    async fn resolve_address(&self, name: &str) -> Result<IpAddr, ResolveError>;

    /// Resolves an address to a host name.
    async fn resolve_name(&self, addr: IpAddr) -> Result<String, ResolveError>;
}

/// Receives trace progress, in order, for display.
pub trait TraceObserver {
    /// Called once the target is resolved, before the first probe.
    fn on_start(&mut self, _target: &TraceTarget, _max_hops: u8) {}

    /// Called after every probe. `index` counts from 0 within the hop.
    fn on_probe(&mut self, _ttl: u8, _index: usize, _outcome: &ProbeOutcome) {}

    /// Called once a hop is finished (possibly truncated).
    fn on_hop(&mut self, _hop: &HopRecord) {}

    /// Called with the finished session.
    fn on_finish(&mut self, _session: &TraceSession) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TraceObserver for NoopObserver {}
