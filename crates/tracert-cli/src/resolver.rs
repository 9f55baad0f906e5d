//! DNS resolution backed by hickory-resolver.

use async_trait::async_trait;
use hickory_resolver::error::{ResolveError as DnsError, ResolveErrorKind};
use hickory_resolver::proto::rr::Name;
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use tracert_core::{NameResolver, ResolveError};
use tracing::debug;

/// Resolves names with the system DNS configuration.
pub struct HickoryResolver {
    inner: TokioAsyncResolver,
}

impl HickoryResolver {
    /// Creates a resolver from `/etc/resolv.conf` (or the platform equivalent).
    pub fn from_system_conf() -> Result<Self, ResolveError> {
        let inner = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| ResolveError::Transport(format!("Failed to create DNS resolver: {}", e)))?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl NameResolver for HickoryResolver {
    async fn resolve_address(&self, name: &str) -> Result<IpAddr, ResolveError> {
        if let Ok(ip) = name.parse::<IpAddr>() {
            return Ok(ip);
        }

        let host = parse_host_name(name)?;
        let lookup = self
            .inner
            .lookup_ip(host)
            .await
            .map_err(|e| lookup_error(e, name))?;

        pick_address(lookup.iter()).ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }

    async fn resolve_name(&self, addr: IpAddr) -> Result<String, ResolveError> {
        let lookup = self.inner.reverse_lookup(addr).await.map_err(|e| {
            debug!(%addr, error = %e, "reverse lookup failed");
            lookup_error(e, &addr.to_string())
        })?;

        lookup
            .iter()
            .map(|name| name.to_string())
            .map(|name| name.trim_end_matches('.').to_string())
            .find(|name| !name.is_empty())
            .ok_or_else(|| ResolveError::NotFound(addr.to_string()))
    }
}

/// Rejects names that cannot be encoded as a DNS query.
fn parse_host_name(name: &str) -> Result<Name, ResolveError> {
    Name::from_utf8(name).map_err(|e| {
        debug!(host = name, error = %e, "malformed host name");
        ResolveError::Malformed(name.to_string())
    })
}

fn lookup_error(err: DnsError, query: &str) -> ResolveError {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => ResolveError::NotFound(query.to_string()),
        _ => ResolveError::Transport(err.to_string()),
    }
}

/// Prefers the first IPv4 address, falling back to the first address of any family.
fn pick_address(addrs: impl Iterator<Item = IpAddr>) -> Option<IpAddr> {
    let mut first = None;
    for ip in addrs {
        if ip.is_ipv4() {
            return Some(ip);
        }
        first.get_or_insert(ip);
    }
    first
}
