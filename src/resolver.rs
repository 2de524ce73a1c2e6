//! Query dispatch across the configured name servers

use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Instant;

use log::{debug, info};

use crate::config::DnsConfig;
use crate::message::{Header, Message, Qr, RCode, MESSAGE_LIMIT};
use crate::socket::{is_timeout, DnsSocket, Transport};

/// Port for DNS communication.
pub const DNS_PORT: u16 = 53;

/// Drives one query across the configured servers, in order, until one
/// of them produces a usable answer or the list is exhausted.
pub struct DnsResolver<T = DnsSocket> {
    sock: T,
    config: DnsConfig,
}

impl DnsResolver<DnsSocket> {
    /// Constructs a `DnsResolver` using the given configuration, bound to
    /// an unspecified local address.
    pub fn new(config: DnsConfig) -> io::Result<DnsResolver> {
        Ok(DnsResolver {
            sock: DnsSocket::new()?,
            config,
        })
    }
}

impl<T: Transport> DnsResolver<T> {
    /// Constructs a `DnsResolver` over an arbitrary transport.
    pub fn with_transport(sock: T, config: DnsConfig) -> DnsResolver<T> {
        DnsResolver { sock, config }
    }

    /// Sends the encoded query to each configured server in turn and
    /// classifies the result.
    ///
    /// Per-server failures (send error, timeout, receive error, and
    /// undecodable datagrams) fall through to the next server; the last
    /// failure kind seen is the one reported if every server is
    /// exhausted. A response with a non-zero RCODE never counts as
    /// success; if it came from the final server its header is carried
    /// in the outcome for diagnostics.
    pub fn dispatch(&self, query: &[u8]) -> QueryOutcome {
        let id = u16::from_be_bytes([query[0], query[1]]);

        let mut last = FailureKind::NoServers;
        let mut diagnostic = None;
        let servers = &self.config.name_servers;

        for (i, server) in servers.iter().enumerate() {
            let addr = match server.parse::<Ipv4Addr>() {
                Ok(ip) => SocketAddr::from((ip, DNS_PORT)),
                // Entries that are not addresses are skipped without
                // classifying a failure.
                Err(_) => continue,
            };

            info!("sending query {:04x} to {}", id, addr);

            if let Err(e) = self.sock.send_to(query, &addr) {
                debug!("send to {} failed: {}", addr, e);
                last = FailureKind::SendFailed;
                continue;
            }

            match self.await_response(&addr, id) {
                Wait::Answer(n, msg) => {
                    if msg.header.rcode == RCode::NoError {
                        info!("received {} bytes from {}", n, server);
                        return QueryOutcome::Success {
                            server: server.clone(),
                            bytes: n,
                            message: msg,
                        };
                    }

                    info!("{} answered with {}", server, msg.header.rcode);
                    if i == servers.len() - 1 {
                        diagnostic = Some(msg.header);
                    }
                }
                Wait::TimedOut => {
                    debug!("no response from {}", addr);
                    last = FailureKind::Timeout;
                }
                Wait::RecvFailed => last = FailureKind::ReceiveFailed,
                Wait::Malformed => last = FailureKind::Malformed,
            }
        }

        QueryOutcome::Exhausted {
            kind: last,
            diagnostic,
        }
    }

    /// Waits for a response from `addr` carrying the transaction id of
    /// the query. Datagrams from other sources and responses with a
    /// stale or spoofed id are ignored without consuming the attempt;
    /// the wait resumes with whatever time remains.
    fn await_response(&self, addr: &SocketAddr, id: u16) -> Wait {
        let mut timeout = self.config.timeout;

        loop {
            let mut buf = [0; MESSAGE_LIMIT];
            let start = Instant::now();

            match self.sock.recv_timeout(&mut buf, timeout) {
                Ok((n, from)) if from == *addr => match Message::decode(&buf[..n]) {
                    Ok(msg) => {
                        if msg.header.id == id && msg.header.qr == Qr::Response {
                            return Wait::Answer(n, msg);
                        }
                        debug!("ignoring message {:04x} from {}", msg.header.id, from);
                    }
                    Err(e) => {
                        debug!("malformed response from {}: {}", from, e);
                        return Wait::Malformed;
                    }
                },
                Ok((_, from)) => debug!("ignoring datagram from {}", from),
                Err(ref e) if is_timeout(e) => return Wait::TimedOut,
                Err(_) => return Wait::RecvFailed,
            }

            let passed = start.elapsed();
            if timeout <= passed {
                return Wait::TimedOut;
            }
            timeout -= passed;
        }
    }
}

/// Result of waiting on one server for a relevant datagram.
enum Wait {
    Answer(usize, Message),
    TimedOut,
    RecvFailed,
    Malformed,
}

/// The terminal result of one dispatch run.
#[derive(Clone, Debug)]
pub enum QueryOutcome {
    /// A server returned a well-formed answer with RCODE 0.
    Success {
        /// The server whose answer was accepted, as configured
        server: String,
        /// Size of the answer datagram in bytes
        bytes: usize,
        /// The decoded answer
        message: Message,
    },
    /// Every server was tried without obtaining a usable answer.
    Exhausted {
        /// The last failure classified during the run
        kind: FailureKind,
        /// Header of a non-NOERROR response from the final server, kept
        /// for diagnostics
        diagnostic: Option<Header>,
    },
}

/// Classifies why a server attempt produced no usable answer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// No server was attempted, or none failed in a more specific way
    NoServers,
    /// The transport rejected the outgoing datagram
    SendFailed,
    /// No relevant datagram arrived within the bounded wait
    Timeout,
    /// The transport failed while receiving
    ReceiveFailed,
    /// A response arrived but could not be decoded
    Malformed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            FailureKind::NoServers => "No valid servers.",
            FailureKind::SendFailed => "Send failed.",
            FailureKind::Timeout => "No response from server(s)",
            FailureKind::ReceiveFailed => "Receive failed.",
            FailureKind::Malformed => "Malformed response from server(s)",
        })
    }
}

#[cfg(test)]
mod test {
    use super::{DnsResolver, FailureKind, QueryOutcome, DNS_PORT};
    use crate::config::DnsConfig;
    use crate::message::{build_query, MESSAGE_LIMIT};
    use crate::record::RecordType;
    use crate::socket::Transport;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::net::{Ipv4Addr, SocketAddr};
    use std::time::Duration;

    /// Scripted transport: each server address maps to a canned reaction.
    enum Reaction {
        /// Fail the send itself
        RefuseSend,
        /// Accept the send, never respond
        Silent,
        /// Respond with a header echoing the query id and this rcode
        Respond(u8),
        /// Respond with bytes that do not decode
        Garbage,
    }

    struct MockTransport {
        reactions: HashMap<SocketAddr, Reaction>,
        sends: RefCell<Vec<SocketAddr>>,
        recvs: RefCell<usize>,
        pending: RefCell<Option<(Vec<u8>, SocketAddr)>>,
    }

    impl MockTransport {
        fn new(script: Vec<(&str, Reaction)>) -> MockTransport {
            let reactions = script
                .into_iter()
                .map(|(ip, r)| {
                    let ip: Ipv4Addr = ip.parse().unwrap();
                    (SocketAddr::from((ip, DNS_PORT)), r)
                })
                .collect();

            MockTransport {
                reactions,
                sends: RefCell::new(Vec::new()),
                recvs: RefCell::new(0),
                pending: RefCell::new(None),
            }
        }
    }

    impl Transport for MockTransport {
        fn send_to(&self, buf: &[u8], addr: &SocketAddr) -> io::Result<usize> {
            self.sends.borrow_mut().push(*addr);

            match self.reactions.get(addr) {
                Some(Reaction::RefuseSend) => {
                    Err(io::Error::new(io::ErrorKind::PermissionDenied, "refused"))
                }
                Some(Reaction::Silent) | None => Ok(buf.len()),
                Some(Reaction::Respond(rcode)) => {
                    let mut resp = vec![buf[0], buf[1], 0x80, *rcode];
                    resp.extend_from_slice(&[0; 8]);
                    *self.pending.borrow_mut() = Some((resp, *addr));
                    Ok(buf.len())
                }
                Some(Reaction::Garbage) => {
                    *self.pending.borrow_mut() = Some((vec![0xff; 3], *addr));
                    Ok(buf.len())
                }
            }
        }

        fn recv_timeout(
            &self,
            buf: &mut [u8],
            _timeout: Duration,
        ) -> io::Result<(usize, SocketAddr)> {
            *self.recvs.borrow_mut() += 1;

            match self.pending.borrow_mut().take() {
                Some((data, from)) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok((data.len(), from))
                }
                None => Err(io::Error::new(io::ErrorKind::WouldBlock, "timed out")),
            }
        }
    }

    fn dispatch(
        script: Vec<(&str, Reaction)>,
        servers: &[&str],
    ) -> (QueryOutcome, Vec<SocketAddr>, usize) {
        let mock = MockTransport::new(script);
        let mut config =
            DnsConfig::with_name_servers(servers.iter().map(|s| s.to_string()).collect());
        config.timeout = Duration::from_millis(10);

        let resolver = DnsResolver::with_transport(mock, config);

        let mut buf = [0; MESSAGE_LIMIT];
        let query = build_query("example.com", RecordType::A, &mut buf).unwrap();
        let outcome = resolver.dispatch(query);
        let sends = resolver.sock.sends.borrow().clone();
        let recvs = *resolver.sock.recvs.borrow();
        (outcome, sends, recvs)
    }

    #[test]
    fn test_fallback_after_timeout() {
        let (outcome, sends, recvs) = dispatch(
            vec![
                ("10.0.0.1", Reaction::Silent),
                ("10.0.0.2", Reaction::Respond(0)),
            ],
            &["10.0.0.1", "10.0.0.2"],
        );

        match outcome {
            QueryOutcome::Success { server, bytes, .. } => {
                assert_eq!(server, "10.0.0.2");
                assert_eq!(bytes, 12);
            }
            other => panic!("expected success, got {:?}", other),
        }
        // One attempt per server, in order: a single timed-out wait on
        // the first server, a single answered wait on the second.
        assert_eq!(sends.len(), 2);
        assert_eq!(recvs, 2);
    }

    #[test]
    fn test_send_failure_is_not_no_servers() {
        let (outcome, sends, recvs) =
            dispatch(vec![("10.0.0.1", Reaction::RefuseSend)], &["10.0.0.1"]);

        match outcome {
            QueryOutcome::Exhausted { kind, diagnostic } => {
                assert_eq!(kind, FailureKind::SendFailed);
                assert!(diagnostic.is_none());
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(sends.len(), 1);
        // A failed send never waits on the socket.
        assert_eq!(recvs, 0);
    }

    #[test]
    fn test_empty_server_list() {
        let (outcome, sends, _) = dispatch(vec![], &[]);

        match outcome {
            QueryOutcome::Exhausted { kind, .. } => {
                assert_eq!(kind, FailureKind::NoServers)
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert!(sends.is_empty());
    }

    #[test]
    fn test_unparseable_server_skipped() {
        let (outcome, sends, _) = dispatch(
            vec![("10.0.0.2", Reaction::Respond(0))],
            &["not-an-address", "10.0.0.2"],
        );

        assert!(matches!(outcome, QueryOutcome::Success { .. }));
        assert_eq!(sends.len(), 1);
    }

    #[test]
    fn test_error_rcode_from_last_server_keeps_failure_kind() {
        // First server times out, last answers SERVFAIL: the run reports
        // the timeout, carrying the error header only as a diagnostic.
        let (outcome, _, _) = dispatch(
            vec![
                ("10.0.0.1", Reaction::Silent),
                ("10.0.0.2", Reaction::Respond(2)),
            ],
            &["10.0.0.1", "10.0.0.2"],
        );

        match outcome {
            QueryOutcome::Exhausted { kind, diagnostic } => {
                assert_eq!(kind, FailureKind::Timeout);
                let header = diagnostic.expect("diagnostic header");
                assert_eq!(header.rcode.to_u8(), 2);
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_error_rcode_from_earlier_server_is_not_diagnosed() {
        let (outcome, sends, _) = dispatch(
            vec![
                ("10.0.0.1", Reaction::Respond(3)),
                ("10.0.0.2", Reaction::Silent),
            ],
            &["10.0.0.1", "10.0.0.2"],
        );

        match outcome {
            QueryOutcome::Exhausted { kind, diagnostic } => {
                assert_eq!(kind, FailureKind::Timeout);
                assert!(diagnostic.is_none());
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(sends.len(), 2);
    }

    #[test]
    fn test_undecodable_response() {
        let (outcome, _, _) = dispatch(vec![("10.0.0.1", Reaction::Garbage)], &["10.0.0.1"]);

        match outcome {
            QueryOutcome::Exhausted { kind, .. } => {
                assert_eq!(kind, FailureKind::Malformed)
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }
}
