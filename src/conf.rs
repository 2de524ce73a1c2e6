//! Server list file parser

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use crate::config::DnsConfig;

/// Default path of the server list file.
pub const CONF_PATH: &str = "dns_servers.conf";

/// Reads the server list file at the given path and returns a
/// configuration built from its contents. One server address per line;
/// lines starting with `#` are comments. If the file cannot be read or
/// contains no usable entries, an error is returned.
pub fn load(path: &str) -> io::Result<DnsConfig> {
    parse(BufReader::new(File::open(path)?))
}

fn parse<R: BufRead>(r: R) -> io::Result<DnsConfig> {
    let mut name_servers = Vec::new();

    for line in r.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        name_servers.push(line.to_owned());
    }

    if name_servers.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            "no server entries in configuration file",
        ));
    }

    Ok(DnsConfig::with_name_servers(name_servers))
}
