//! Low-level UDP socket operations

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

/// Sends and receives datagrams on behalf of the resolver.
///
/// The resolver is generic over this trait so the dispatch state machine
/// can be exercised without touching the network.
pub trait Transport {
    /// Sends a datagram to the given address.
    fn send_to(&self, buf: &[u8], addr: &SocketAddr) -> io::Result<usize>;

    /// Receives a single datagram, waiting no longer than `timeout`.
    /// Expiry surfaces as a `WouldBlock` or `TimedOut` error.
    fn recv_timeout(&self, buf: &mut [u8], timeout: Duration) -> io::Result<(usize, SocketAddr)>;
}

/// Represents a socket transmitting DNS messages.
///
/// One socket is bound for the whole run and reused across every server
/// attempt; dropping it closes the descriptor on all exit paths.
pub struct DnsSocket {
    sock: UdpSocket,
}

impl DnsSocket {
    /// Returns a `DnsSocket`, bound to an unspecified address.
    pub fn new() -> io::Result<DnsSocket> {
        DnsSocket::bind("0.0.0.0:0")
    }

    /// Returns a `DnsSocket`, bound to the given address.
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<DnsSocket> {
        Ok(DnsSocket {
            sock: UdpSocket::bind(addr)?,
        })
    }
}

impl Transport for DnsSocket {
    fn send_to(&self, buf: &[u8], addr: &SocketAddr) -> io::Result<usize> {
        self.sock.send_to(buf, addr)
    }

    fn recv_timeout(&self, buf: &mut [u8], timeout: Duration) -> io::Result<(usize, SocketAddr)> {
        self.sock.set_read_timeout(Some(timeout))?;
        self.sock.recv_from(buf)
    }
}

/// Returns whether an I/O error signals expiry of a bounded read.
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
