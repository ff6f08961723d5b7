//! Resolve an [`AddressSpec`] to exactly one IPv4 peer.
//!
//! The platform resolver is asked for IPv4 datagram endpoints only. Candidate
//! selection is kept separate from the lookup so that every outcome can be
//! exercised without DNS.

use std::net::{SocketAddrV4, SocketAddrV6};

use tracing::debug;

use crate::address::AddressSpec;
use crate::error::ResolutionError;

/// One entry returned by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    Ipv4(SocketAddrV4),
    Ipv6(SocketAddrV6),
    /// An address family this transport does not speak.
    Unsupported(i32),
}

impl From<std::net::SocketAddr> for Candidate {
    fn from(addr: std::net::SocketAddr) -> Self {
        match addr {
            std::net::SocketAddr::V4(v4) => Self::Ipv4(v4),
            std::net::SocketAddr::V6(v6) => Self::Ipv6(v6),
        }
    }
}

/// Resolve `address` with the platform resolver and select the single IPv4
/// result.
pub fn resolve(address: &AddressSpec) -> Result<SocketAddrV4, ResolutionError> {
    let candidates = lookup(address)?;
    debug!(%address, count = candidates.len(), "resolved address");
    select_ipv4(address, &candidates)
}

/// Pick the peer out of the resolver's answer.
///
/// Any non-IPv4 candidate fails with [`ResolutionError::NotIpv4`]; any count
/// other than one fails with [`ResolutionError::AmbiguousOrNoResult`].
pub fn select_ipv4(
    address: &AddressSpec,
    candidates: &[Candidate],
) -> Result<SocketAddrV4, ResolutionError> {
    if candidates
        .iter()
        .any(|candidate| !matches!(candidate, Candidate::Ipv4(_)))
    {
        return Err(ResolutionError::NotIpv4 {
            address: address.to_string(),
        });
    }

    match candidates {
        [Candidate::Ipv4(peer)] => Ok(*peer),
        _ => Err(ResolutionError::AmbiguousOrNoResult {
            address: address.to_string(),
            count: candidates.len(),
        }),
    }
}

#[cfg(unix)]
fn lookup(address: &AddressSpec) -> Result<Vec<Candidate>, ResolutionError> {
    use std::ffi::{CStr, CString};

    let failed = |reason: String| ResolutionError::LookupFailed {
        address: address.to_string(),
        reason,
    };

    let node = CString::new(address.host()).map_err(|_| failed("host contains NUL".into()))?;
    let service = CString::new(address.port().to_string())
        .map_err(|_| failed("port contains NUL".into()))?;

    // SAFETY: an all-zero `addrinfo` is the documented "no hints" value; the
    // fields that matter are set below.
    let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
    hints.ai_family = libc::AF_INET;
    hints.ai_socktype = libc::SOCK_DGRAM;

    let mut head: *mut libc::addrinfo = std::ptr::null_mut();
    // SAFETY: `node` and `service` are NUL-terminated and outlive the call,
    // `hints` is initialised and `head` is a valid out-pointer.
    let rc = unsafe { libc::getaddrinfo(node.as_ptr(), service.as_ptr(), &hints, &mut head) };
    if rc != 0 {
        // `head` is unspecified on failure and must not be freed.
        // SAFETY: `gai_strerror` returns a static NUL-terminated string.
        let reason = unsafe { CStr::from_ptr(libc::gai_strerror(rc)) }
            .to_string_lossy()
            .into_owned();
        return Err(failed(reason));
    }
    let list = AddrInfoList(head);

    let mut candidates = Vec::new();
    let mut cursor = list.0;
    while !cursor.is_null() {
        // SAFETY: `cursor` walks the list owned by `list`, which is only freed
        // when `list` drops at the end of this function.
        let entry = unsafe { &*cursor };
        candidates.push(candidate_from(entry));
        cursor = entry.ai_next;
    }

    Ok(candidates)
}

#[cfg(unix)]
fn candidate_from(entry: &libc::addrinfo) -> Candidate {
    use std::net::{Ipv4Addr, Ipv6Addr};

    let len = entry.ai_addrlen as usize;
    if entry.ai_addr.is_null() {
        return Candidate::Unsupported(entry.ai_family);
    }
    match entry.ai_family {
        libc::AF_INET if len >= std::mem::size_of::<libc::sockaddr_in>() => {
            // SAFETY: AF_INET entries carry a `sockaddr_in` of at least `len` bytes.
            let sin = unsafe { &*(entry.ai_addr as *const libc::sockaddr_in) };
            Candidate::Ipv4(SocketAddrV4::new(
                Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)),
                u16::from_be(sin.sin_port),
            ))
        }
        libc::AF_INET6 if len >= std::mem::size_of::<libc::sockaddr_in6>() => {
            // SAFETY: AF_INET6 entries carry a `sockaddr_in6` of at least `len` bytes.
            let sin6 = unsafe { &*(entry.ai_addr as *const libc::sockaddr_in6) };
            Candidate::Ipv6(SocketAddrV6::new(
                Ipv6Addr::from(sin6.sin6_addr.s6_addr),
                u16::from_be(sin6.sin6_port),
                sin6.sin6_flowinfo,
                sin6.sin6_scope_id,
            ))
        }
        family => Candidate::Unsupported(family),
    }
}

#[cfg(not(unix))]
fn lookup(address: &AddressSpec) -> Result<Vec<Candidate>, ResolutionError> {
    use std::net::ToSocketAddrs;

    (address.host(), address.port())
        .to_socket_addrs()
        .map(|addrs| addrs.map(Candidate::from).collect())
        .map_err(|err| ResolutionError::LookupFailed {
            address: address.to_string(),
            reason: err.to_string(),
        })
}

/// Owns a `getaddrinfo` result list and frees it on every exit path.
#[cfg(unix)]
struct AddrInfoList(*mut libc::addrinfo);

#[cfg(unix)]
impl Drop for AddrInfoList {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: the pointer came from a successful `getaddrinfo` call and
            // is freed exactly once.
            unsafe { libc::freeaddrinfo(self.0) };
        }
    }
}
