//! Query input classification and reverse-lookup names

use std::fmt;
use std::net::Ipv4Addr;

/// Represents an error in the user-supplied query input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputError {
    /// The input is neither a well-formed domain name nor an IPv4 address
    BadName,
    /// The record type token is not one this client understands
    BadQueryType,
    /// A `TXT` query was requested for an address
    TxtRequiresName,
    /// A `PTR` query was requested for a domain name
    PtrRequiresAddress,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            InputError::BadName => "Please enter a valid IP or domain name!",
            InputError::BadQueryType => "Please enter a valid query type!",
            InputError::TxtRequiresName => "The TXT query requires a domain name",
            InputError::PtrRequiresAddress => "The PTR query requires an IP",
        })
    }
}

/// The kind of query input the user supplied.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputKind {
    /// A domain name, passed through as given
    Name,
    /// An IPv4 address, rewritten into reverse-lookup form
    Address,
}

/// Classifies a query input as a domain name or an IPv4 address.
///
/// Addresses are rewritten into the `d.c.b.a.in-addr.arpa` form used for
/// reverse lookups. A dotted quad with an out-of-range component is
/// rejected rather than treated as a name.
pub fn classify(input: &str) -> Result<(InputKind, String), InputError> {
    if let Some(parts) = dotted_quad(input) {
        let addr = match parts {
            [Ok(a), Ok(b), Ok(c), Ok(d)] => Ipv4Addr::new(a, b, c, d),
            _ => return Err(InputError::BadName),
        };
        return Ok((InputKind::Address, reverse_name(&addr)));
    }

    if !is_valid_name(input) {
        return Err(InputError::BadName);
    }

    Ok((InputKind::Name, input.to_owned()))
}

/// Returns an IPv4 address formatted as a reverse-lookup domain name.
pub fn reverse_name(addr: &Ipv4Addr) -> String {
    let octets = addr.octets();
    format!(
        "{}.{}.{}.{}.in-addr.arpa",
        octets[3], octets[2], octets[1], octets[0]
    )
}

/// Splits the input into four numeric components, if that is its shape.
/// Each component reports whether it fits in an octet.
fn dotted_quad(s: &str) -> Option<[Result<u8, ()>; 4]> {
    let mut parts = [Err(()); 4];
    let mut n = 0;

    for part in s.split('.') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if n == 4 {
            return None;
        }
        parts[n] = part.parse::<u8>().map_err(|_| ());
        n += 1;
    }

    if n == 4 {
        Some(parts)
    } else {
        None
    }
}

/// Returns whether the given string appears to be a valid hostname.
/// The contents of the name (i.e. characters in labels) are not checked
/// here; only the structure of the name is validated.
fn is_valid_name(name: &str) -> bool {
    let len = name.len();
    len != 0 && (len == 1 || !name.starts_with('.')) && !name.contains("..")
}
