//! Linux-specific packet I/O using raw IPv4 sockets.

use crate::{Sink, Source, SourceSinkHandle};
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use tokio::io::unix::AsyncFd;
use tracert_core::TraceError;
use tracing::debug;

/// Opens a non-blocking raw IPv4 socket for `protocol`.
fn raw_socket(protocol: i32) -> Result<OwnedFd, TraceError> {
    let fd = unsafe {
        libc::socket(
            libc::AF_INET,
            libc::SOCK_RAW | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
            protocol,
        )
    };

    if fd < 0 {
        return Err(TraceError::SocketCreation(io::Error::last_os_error()));
    }

    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

fn set_int_option(
    fd: &OwnedFd,
    level: i32,
    name: i32,
    option: &'static str,
    value: i32,
) -> Result<(), TraceError> {
    let result = unsafe {
        libc::setsockopt(
            fd.as_raw_fd(),
            level,
            name,
            &value as *const _ as *const libc::c_void,
            std::mem::size_of::<i32>() as libc::socklen_t,
        )
    };

    if result < 0 {
        return Err(TraceError::SocketOption {
            option,
            source: io::Error::last_os_error(),
        });
    }

    Ok(())
}

fn register(fd: OwnedFd) -> Result<AsyncFd<OwnedFd>, TraceError> {
    AsyncFd::new(fd).map_err(TraceError::SocketCreation)
}

fn closed(what: &str) -> TraceError {
    TraceError::Internal(format!("{} is closed", what))
}

/// Raw `IPPROTO_ICMP` socket; every ICMP message for this host is delivered
/// with its IPv4 header.
pub struct IcmpSource {
    fd: Option<AsyncFd<OwnedFd>>,
}

impl IcmpSource {
    /// Creates a new ICMP source.
    pub fn new() -> Result<Self, TraceError> {
        let fd = raw_socket(libc::IPPROTO_ICMP)?;
        Ok(Self {
            fd: Some(register(fd)?),
        })
    }
}

#[async_trait]
impl Source for IcmpSource {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TraceError> {
        let fd = self.fd.as_ref().ok_or_else(|| closed("source"))?;

        loop {
            let mut guard = fd
                .readable()
                .await
                .map_err(|e| TraceError::Internal(format!("Failed to poll raw socket: {}", e)))?;

            let result = guard.try_io(|inner| {
                let n = unsafe {
                    libc::recv(
                        inner.as_raw_fd(),
                        buf.as_mut_ptr() as *mut libc::c_void,
                        buf.len(),
                        0,
                    )
                };
                if n < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(n as usize)
                }
            });

            match result {
                Ok(Ok(n)) => return Ok(n),
                Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Ok(Err(e)) => {
                    return Err(TraceError::Internal(format!(
                        "Failed to read from raw socket: {}",
                        e
                    )))
                }
                // Spurious readiness; wait again.
                Err(_would_block) => continue,
            }
        }
    }

    async fn close(&mut self) -> Result<(), TraceError> {
        self.fd.take();
        Ok(())
    }
}

/// Raw socket-based packet sink; packets carry their own IPv4 header.
pub struct RawSink {
    fd: Option<AsyncFd<OwnedFd>>,
}

impl RawSink {
    /// Creates a new raw socket sink.
    pub fn new() -> Result<Self, TraceError> {
        let fd = raw_socket(libc::IPPROTO_RAW)?;
        set_int_option(&fd, libc::IPPROTO_IP, libc::IP_HDRINCL, "IP_HDRINCL", 1)?;
        Ok(Self {
            fd: Some(register(fd)?),
        })
    }
}

fn sockaddr_v4(addr: SocketAddr) -> Result<libc::sockaddr_in, TraceError> {
    let SocketAddr::V4(v4) = addr else {
        return Err(TraceError::Unsupported(
            "IPv6 destinations are not supported".to_string(),
        ));
    };

    let mut sa: libc::sockaddr_in = unsafe { std::mem::zeroed() };
    sa.sin_family = libc::AF_INET as libc::sa_family_t;
    sa.sin_port = v4.port().to_be();
    sa.sin_addr.s_addr = u32::from_ne_bytes(v4.ip().octets());
    Ok(sa)
}

#[async_trait]
impl Sink for RawSink {
    async fn write_to(&mut self, buf: &[u8], addr: SocketAddr) -> Result<(), TraceError> {
        let fd = self.fd.as_ref().ok_or_else(|| closed("sink"))?;
        let sa = sockaddr_v4(addr)?;

        loop {
            let mut guard = fd.writable().await.map_err(TraceError::WriteFailed)?;

            let result = guard.try_io(|inner| {
                let n = unsafe {
                    libc::sendto(
                        inner.as_raw_fd(),
                        buf.as_ptr() as *const libc::c_void,
                        buf.len(),
                        0,
                        &sa as *const _ as *const libc::sockaddr,
                        std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
                    )
                };
                if n < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(())
                }
            });

            match result {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Ok(Err(e)) => return Err(TraceError::WriteFailed(e)),
                Err(_would_block) => continue,
            }
        }
    }

    async fn close(&mut self) -> Result<(), TraceError> {
        self.fd.take();
        Ok(())
    }
}

/// Creates a new source and sink for Linux.
pub fn new_source_sink() -> Result<SourceSinkHandle, TraceError> {
    let source = IcmpSource::new()?;
    let sink = RawSink::new()?;
    debug!("Opened raw ICMP source and IP_HDRINCL sink");

    Ok(SourceSinkHandle {
        source: Box::new(source),
        sink: Box::new(sink),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddrV4};

    #[test]
    fn test_sockaddr_v4_layout() {
        let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(192, 0, 2, 7), 0));
        let sa = sockaddr_v4(addr).unwrap();
        assert_eq!(sa.sin_family, libc::AF_INET as libc::sa_family_t);
        assert_eq!(sa.sin_addr.s_addr.to_ne_bytes(), [192, 0, 2, 7]);
    }

    #[test]
    fn test_sockaddr_rejects_v6() {
        let addr: SocketAddr = "[2001:db8::1]:0".parse().unwrap();
        assert!(matches!(sockaddr_v4(addr), Err(TraceError::Unsupported(_))));
    }
}
