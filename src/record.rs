//! DNS resource record types

use std::fmt;
use std::net::Ipv4Addr;

use crate::message::{DecodeError, MsgReader};

/// Represents the class of data in a message.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Class {
    /// Internet (`IN`)
    Internet,
    /// An unrecognized class
    Other(u16),
}

impl Class {
    /// Converts a `u16` to a `Class`.
    pub fn from_u16(u: u16) -> Class {
        match u {
            1 => Class::Internet,
            n => Class::Other(n),
        }
    }

    /// Converts a `Class` to a `u16`.
    pub fn to_u16(&self) -> u16 {
        match *self {
            Class::Internet => 1,
            Class::Other(n) => n,
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Class::Internet => "IN",
            Class::Other(_) => "UNDEFINED",
        })
    }
}

/// Represents the type of data in a message.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RecordType {
    /// An IPv4 host address
    A,
    /// Authoritative name server
    Ns,
    /// Canonical name for an alias
    CName,
    /// Start of authority
    Soa,
    /// Domain name pointer
    Ptr,
    /// Mail exchange
    Mx,
    /// Text string
    Txt,
    /// Unrecognized record type
    Other(u16),
}

macro_rules! record_types {
    ( $( $name:ident => $code:literal , $token:literal , )+ ) => {
        impl RecordType {
            /// Converts a `u16` to a `RecordType`.
            pub fn from_u16(u: u16) -> RecordType {
                match u {
                    $( $code => RecordType::$name , )+
                    n => RecordType::Other(n),
                }
            }

            /// Converts a `RecordType` to a `u16`.
            pub fn to_u16(&self) -> u16 {
                match *self {
                    $( RecordType::$name => $code , )+
                    RecordType::Other(n) => n,
                }
            }

            /// Parses a query type token, ignoring case.
            /// Only the types this client knows how to present are accepted.
            pub fn from_token(s: &str) -> Option<RecordType> {
                $( if s.eq_ignore_ascii_case($token) {
                    return Some(RecordType::$name);
                } )+
                None
            }
        }

        impl fmt::Display for RecordType {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(match *self {
                    $( RecordType::$name => $token , )+
                    RecordType::Other(_) => "UNDEFINED",
                })
            }
        }
    }
}

record_types! {
    A => 1, "A",
    Ns => 2, "NS",
    CName => 5, "CNAME",
    Soa => 6, "SOA",
    Ptr => 12, "PTR",
    Mx => 15, "MX",
    Txt => 16, "TXT",
}

/// Decoded resource record data, one variant per supported type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RData {
    /// An IPv4 host address
    A(Ipv4Addr),
    /// Host which should be authoritative for the specified class and domain
    Ns(String),
    /// Canonical host name
    CName(String),
    /// Start of authority data
    Soa {
        /// Primary source of data for this zone
        mname: String,
        /// Mailbox of the person responsible for this zone
        rname: String,
        /// Version number of the original copy of the zone
        serial: u32,
        /// Time interval before the zone should be refreshed
        refresh: u32,
        /// Time interval before a failed refresh should be retried
        retry: u32,
        /// Upper limit on the time the zone remains authoritative
        expire: u32,
        /// Minimum TTL exported with any record from this zone
        minimum: u32,
    },
    /// The name of the host an address points back to
    Ptr(String),
    /// Mail exchange data
    Mx {
        /// Preference of this record among others; lower values are
        /// preferred. Read as the single low byte of the wire field,
        /// matching the presentation this client has always produced.
        preference: u8,
        /// Domain name willing to act as mail exchange for the host
        exchange: String,
    },
    /// Raw text data, per-segment length bytes included
    Txt(Vec<u8>),
    /// Data of a type this client does not interpret
    Undefined,
}

impl RData {
    /// Decodes the data of a resource record of the given type.
    ///
    /// The reader must be positioned at the start of the RDATA; name-typed
    /// data may follow compression pointers into any earlier part of the
    /// message. The caller is responsible for advancing the cursor to the
    /// end of the RDATA afterward.
    pub fn decode(
        r_type: RecordType,
        r: &mut MsgReader,
        rdlength: u16,
    ) -> Result<RData, DecodeError> {
        match r_type {
            RecordType::A => {
                let bytes = r.read_bytes(4)?;
                Ok(RData::A(Ipv4Addr::new(
                    bytes[0], bytes[1], bytes[2], bytes[3],
                )))
            }
            RecordType::Ns => Ok(RData::Ns(r.read_name()?)),
            RecordType::CName => Ok(RData::CName(r.read_name()?)),
            RecordType::Soa => Ok(RData::Soa {
                mname: r.read_name()?,
                rname: r.read_name()?,
                serial: r.read_u32()?,
                refresh: r.read_u32()?,
                retry: r.read_u32()?,
                expire: r.read_u32()?,
                minimum: r.read_u32()?,
            }),
            RecordType::Ptr => Ok(RData::Ptr(r.read_name()?)),
            RecordType::Mx => {
                // The preference is kept as the low byte of its 16 bit
                // field, the form this client has always printed.
                let pref = r.read_bytes(2)?;
                Ok(RData::Mx {
                    preference: pref[1],
                    exchange: r.read_name()?,
                })
            }
            RecordType::Txt => {
                // The rdata is copied verbatim, per-segment length bytes
                // and all.
                Ok(RData::Txt(r.read_bytes(rdlength as usize)?.to_vec()))
            }
            RecordType::Other(_) => Ok(RData::Undefined),
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RData::A(ref addr) => fmt::Display::fmt(addr, f),
            RData::Ns(ref name) | RData::CName(ref name) | RData::Ptr(ref name) => {
                f.write_str(name)
            }
            RData::Soa {
                ref mname,
                ref rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => write!(
                f,
                "{} {} {} {} {} {} {}",
                mname, rname, serial, refresh, retry, expire, minimum
            ),
            RData::Mx {
                preference,
                ref exchange,
            } => write!(f, "{} {}", preference, exchange),
            RData::Txt(ref data) => f.write_str(&String::from_utf8_lossy(data)),
            RData::Undefined => f.write_str("UNDEFINED"),
        }
    }
}
