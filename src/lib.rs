//! Minimal DNS stub-resolver client.
//!
//! Builds a single query, sends it to each configured name server in
//! turn with a bounded per-server timeout, and decodes the wire-format
//! answer into human-readable records.

#![deny(missing_docs)]

pub use crate::address::{classify, reverse_name, InputError, InputKind};
pub use crate::conf::{load, CONF_PATH};
pub use crate::config::DnsConfig;
pub use crate::message::{
    build_query, DecodeError, EncodeError, Header, Message, MsgReader, MsgWriter, OpCode, Qr,
    Question, RCode, Resource, MESSAGE_LIMIT,
};
pub use crate::record::{Class, RData, RecordType};
pub use crate::resolver::{DnsResolver, FailureKind, QueryOutcome};
pub use crate::socket::{DnsSocket, Transport};

pub mod address;
pub mod conf;
pub mod config;
pub mod message;
pub mod record;
pub mod report;
pub mod resolver;
pub mod socket;
