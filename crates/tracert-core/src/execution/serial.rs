//! Serial trace execution.
//!
//! Sends `NUMBER_OF_PACKETS` probes per TTL, one at a time, and waits for each
//! outcome before sending the next.

use crate::{
    HopRecord, NameResolver, ProbeOutcome, ProbeSender, ResolveError, TraceError, TraceObserver,
    TraceParams, TraceSession, TraceStatus, TraceTarget, CANCELLED_MESSAGE, NUMBER_OF_PACKETS,
};
use std::net::IpAddr;
use tracing::{debug, trace, warn};

/// Traces the route to `target_name`.
///
/// Configuration and resolution problems are returned as errors before any
/// probe is sent. Everything that happens once probing has started (including
/// a fatal probe failure) is described by the returned session's status.
pub async fn trace_route<S, R, O>(
    sender: &mut S,
    resolver: &R,
    observer: &mut O,
    target_name: &str,
    params: &TraceParams,
) -> Result<TraceSession, TraceError>
where
    S: ProbeSender + ?Sized,
    R: NameResolver + ?Sized,
    O: TraceObserver + ?Sized,
{
    params.validate()?;

    let name = target_name.trim();
    if name.is_empty() {
        return Err(TraceError::UnresolvableTarget {
            target: name.to_string(),
            reason: "empty target name".to_string(),
        });
    }

    let addr = resolver
        .resolve_address(name)
        .await
        .map_err(|e| TraceError::UnresolvableTarget {
            target: name.to_string(),
            reason: e.to_string(),
        })?;
    debug!(host = name, ip = %addr, "Resolved target");

    let target = TraceTarget {
        name: name.to_string(),
        addr,
        reverse_dns: reverse_lookup(resolver, addr, params).await,
    };
    observer.on_start(&target, params.max_hops);

    let mut hops = Vec::new();
    let status = probe_hops(sender, resolver, observer, &target, params, &mut hops).await;
    debug!(hops = hops.len(), status = ?status, "Trace finished");

    let session = TraceSession::new(target, params, hops, status);
    observer.on_finish(&session);
    Ok(session)
}

async fn probe_hops<S, R, O>(
    sender: &mut S,
    resolver: &R,
    observer: &mut O,
    target: &TraceTarget,
    params: &TraceParams,
    hops: &mut Vec<HopRecord>,
) -> TraceStatus
where
    S: ProbeSender + ?Sized,
    R: NameResolver + ?Sized,
    O: TraceObserver + ?Sized,
{
    for ttl in 1..=params.max_hops {
        let mut hop = HopRecord::new(ttl);
        let mut finished = None;

        for index in 0..NUMBER_OF_PACKETS {
            if params.cancel.is_cancelled() {
                debug!(ttl = ttl, "Trace cancelled");
                finished = Some(TraceStatus::aborted(CANCELLED_MESSAGE));
                break;
            }

            let outcome = sender.send(target.addr, ttl, params.timeout).await;
            trace!(ttl = ttl, probe = index, outcome = ?outcome, "Probe finished");
            observer.on_probe(ttl, index, &outcome);

            finished = match &outcome {
                ProbeOutcome::Reached { .. } => Some(TraceStatus::Completed),
                ProbeOutcome::Failed { message } => Some(TraceStatus::aborted(message.clone())),
                ProbeOutcome::HopReply { .. } | ProbeOutcome::TimedOut => None,
            };
            hop.push(outcome);

            if finished.is_some() {
                break;
            }
        }

        // Cancelled before this hop sent anything.
        if hop.probes.is_empty() {
            return finished.unwrap_or_else(|| TraceStatus::aborted(CANCELLED_MESSAGE));
        }

        if let Some(addr) = hop.responder {
            hop.reverse_dns = reverse_lookup(resolver, addr, params).await;
        }
        debug!(
            ttl = ttl,
            probes = hop.probes.len(),
            responder = ?hop.responder,
            "Hop finished"
        );
        observer.on_hop(&hop);
        hops.push(hop);

        if let Some(status) = finished {
            return status;
        }
    }

    TraceStatus::Exhausted
}

/// Best-effort reverse lookup; failures degrade to address-only display.
async fn reverse_lookup<R>(resolver: &R, addr: IpAddr, params: &TraceParams) -> Option<String>
where
    R: NameResolver + ?Sized,
{
    if !params.resolve_names {
        return None;
    }

    match resolver.resolve_name(addr).await {
        Ok(name) if !name.is_empty() => Some(name),
        Ok(_) | Err(ResolveError::NotFound(_)) => None,
        Err(e) => {
            warn!(ip = %addr, error = %e, "Reverse lookup failed");
            None
        }
    }
}
