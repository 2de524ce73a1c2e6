//! DNS resolver configuration

use std::time::Duration;

/// Seconds to wait for a response before moving to the next server.
pub const DEFAULT_TIMEOUT: u64 = 5;

/// Resolver configuration; constructed once and consumed read-only for
/// the whole run.
#[derive(Clone, Debug)]
pub struct DnsConfig {
    /// Ordered list of server addresses, as written in the server list
    /// file; must not be empty. Entries that do not parse as addresses
    /// are skipped at dispatch time.
    pub name_servers: Vec<String>,
    /// Duration to wait for a response from each server
    pub timeout: Duration,
}

impl DnsConfig {
    /// Constructs a `DnsConfig` using the given name servers and the
    /// default timeout.
    pub fn with_name_servers(name_servers: Vec<String>) -> DnsConfig {
        DnsConfig {
            name_servers,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT),
        }
    }
}
