//! Wires the ICMP sender, the resolver and a display into one trace run.

use crate::resolver::HickoryResolver;
use tracert_core::{
    trace_route, NameResolver, ProbeSender, TraceError, TraceObserver, TraceParams, TraceSession,
};
use tracert_icmp::IcmpProbeSender;
use tracing::{debug, info, warn};

/// Runs one trace against `target`, releasing the sender on every path.
pub async fn run_trace(
    target: &str,
    params: &TraceParams,
    observer: &mut dyn TraceObserver,
) -> Result<TraceSession, TraceError> {
    params.validate()?;

    let resolver = HickoryResolver::from_system_conf().map_err(|e| {
        TraceError::UnresolvableTarget {
            target: target.trim().to_string(),
            reason: e.to_string(),
        }
    })?;
    let mut sender = IcmpProbeSender::open()?;
    debug!(echo_id = sender.echo_id(), "ICMP sender opened");

    let cancel = params.cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after the current probe");
            cancel.cancel();
        }
    });

    let result = run_with(&mut sender, &resolver, observer, target, params).await;
    ctrl_c.abort();
    result
}

/// Runs a trace with an already opened sender, closing it afterwards.
pub async fn run_with<S, R>(
    sender: &mut S,
    resolver: &R,
    observer: &mut dyn TraceObserver,
    target: &str,
    params: &TraceParams,
) -> Result<TraceSession, TraceError>
where
    S: ProbeSender + ?Sized,
    R: NameResolver + ?Sized,
{
    let result = trace_route(sender, resolver, observer, target, params).await;

    if let Err(e) = sender.close().await {
        warn!(error = %e, "failed to close probe sender");
    }

    result
}

/// True when the session should map to a successful process exit.
pub fn is_success(session: &TraceSession) -> bool {
    !session.status.is_aborted()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::net::IpAddr;
    use std::time::Duration;
    use tracert_core::{NoopObserver, ProbeOutcome, ResolveError};

    #[derive(Default)]
    struct CountingSender {
        sent: usize,
        closed: usize,
        outcome: Option<ProbeOutcome>,
    }

    #[async_trait]
    impl ProbeSender for CountingSender {
        async fn send(&mut self, target: IpAddr, _ttl: u8, _timeout: Duration) -> ProbeOutcome {
            self.sent += 1;
            self.outcome.clone().unwrap_or(ProbeOutcome::Reached {
                addr: target,
                rtt: Duration::from_millis(1),
            })
        }

        async fn close(&mut self) -> Result<(), TraceError> {
            self.closed += 1;
            Ok(())
        }
    }

    struct Literal;

    #[async_trait]
    impl NameResolver for Literal {
        async fn resolve_address(&self, name: &str) -> Result<IpAddr, ResolveError> {
            name.parse()
                .map_err(|_| ResolveError::NotFound(name.to_string()))
        }

        async fn resolve_name(&self, addr: IpAddr) -> Result<String, ResolveError> {
            Err(ResolveError::NotFound(addr.to_string()))
        }
    }

    #[tokio::test]
    async fn test_sender_closed_after_completed_trace() {
        let mut sender = CountingSender::default();
        let session = run_with(
            &mut sender,
            &Literal,
            &mut NoopObserver,
            "192.0.2.1",
            &TraceParams::default(),
        )
        .await
        .unwrap();

        assert!(is_success(&session));
        assert_eq!(sender.sent, 1);
        assert_eq!(sender.closed, 1);
    }

    #[tokio::test]
    async fn test_sender_closed_after_failed_resolution() {
        let mut sender = CountingSender::default();
        let err = run_with(
            &mut sender,
            &Literal,
            &mut NoopObserver,
            "nowhere.invalid",
            &TraceParams::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TraceError::UnresolvableTarget { .. }));
        assert_eq!(sender.sent, 0);
        assert_eq!(sender.closed, 1);
    }

    #[tokio::test]
    async fn test_aborted_trace_is_failure() {
        let mut sender = CountingSender {
            outcome: Some(ProbeOutcome::failed("General Failure")),
            ..Default::default()
        };
        let session = run_with(
            &mut sender,
            &Literal,
            &mut NoopObserver,
            "192.0.2.1",
            &TraceParams::default(),
        )
        .await
        .unwrap();

        assert!(!is_success(&session));
        assert_eq!(sender.closed, 1);
    }

    #[tokio::test]
    async fn test_invalid_configuration_opens_nothing() {
        let params = TraceParams {
            max_hops: 0,
            ..Default::default()
        };
        let err = run_trace("192.0.2.1", &params, &mut NoopObserver)
            .await
            .unwrap_err();

        assert!(matches!(err, TraceError::InvalidConfiguration { .. }));
    }
}
