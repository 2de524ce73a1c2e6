//! Utilities for composing, decoding, and encoding messages.

use std::fmt;
use std::process;

use crate::record::{Class, RData, RecordType};

/// Maximum size of a DNS message, in bytes.
pub const MESSAGE_LIMIT: usize = 512;

/// Represents an error in decoding a DNS message.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// Message end was encountered before expected
    ShortMessage,
    /// A compression pointer referenced an offset outside the message
    /// or formed a chain longer than the message itself
    BadPointer,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            DecodeError::ShortMessage => "short message",
            DecodeError::BadPointer => "bad compression pointer",
        })
    }
}

/// Represents an error in encoding a DNS message.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EncodeError {
    /// Message exceeded given buffer or `MESSAGE_LIMIT` bytes
    TooLong,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EncodeError::TooLong => f.write_str("message too long"),
        }
    }
}

/// Reads a single DNS message from a series of bytes.
///
/// The underlying buffer is never modified; the reader tracks an explicit
/// cursor which each decode operation advances by the number of bytes it
/// consumed.
pub struct MsgReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> MsgReader<'a> {
    /// Constructs a new message reader.
    pub fn new(data: &'a [u8]) -> MsgReader<'a> {
        MsgReader { data, pos: 0 }
    }

    /// Returns the current cursor offset from the start of the message.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes remaining in the message.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Moves the cursor to an absolute offset.
    /// The offset one past the final byte is valid.
    pub fn seek(&mut self, pos: usize) -> Result<(), DecodeError> {
        if pos > self.data.len() {
            return Err(DecodeError::ShortMessage);
        }
        self.pos = pos;
        Ok(())
    }

    /// Reads a single byte from the message.
    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let b = *self.data.get(self.pos).ok_or(DecodeError::ShortMessage)?;
        self.pos += 1;
        Ok(b)
    }

    /// Reads `n` bytes, returning them as a subslice of the message.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(n).ok_or(DecodeError::ShortMessage)?;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(DecodeError::ShortMessage)?;
        self.pos = end;
        Ok(bytes)
    }

    /// Reads a big-endian unsigned 16 bit integer.
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a big-endian unsigned 32 bit integer.
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a name from the message, following compression pointers.
    ///
    /// Every label is followed by a `.` in the result, so a non-empty name
    /// always carries a trailing dot. The cursor advances past the
    /// terminating zero byte, or past the two pointer bytes if the name
    /// ends in a pointer; the pointed-to labels never count as consumed.
    pub fn read_name(&mut self) -> Result<String, DecodeError> {
        let mut res = String::new();
        let mut pos = self.pos;
        // Offset to return to once a pointer has been followed
        let mut restore = None;
        let mut hops = 0;

        loop {
            let len = *self.data.get(pos).ok_or(DecodeError::ShortMessage)?;

            if len == 0 {
                pos += 1;
                break;
            }

            if len & 0b1100_0000 == 0b1100_0000 {
                let lo = *self.data.get(pos + 1).ok_or(DecodeError::ShortMessage)?;
                let target = usize::from(u16::from_be_bytes([len & 0b0011_1111, lo]));

                // A pointer chain can visit each byte at most once in a
                // well-formed message; anything longer is a loop.
                hops += 1;
                if hops > self.data.len() || target >= self.data.len() {
                    return Err(DecodeError::BadPointer);
                }

                if restore.is_none() {
                    restore = Some(pos + 2);
                }

                pos = target;
                continue;
            }

            let end = pos + 1 + len as usize;
            let seg = self
                .data
                .get(pos + 1..end)
                .ok_or(DecodeError::ShortMessage)?;

            res.push_str(&String::from_utf8_lossy(seg));
            res.push('.');
            pos = end;
        }

        self.pos = restore.unwrap_or(pos);
        Ok(res)
    }

    /// Reads a message header.
    pub fn read_header(&mut self) -> Result<Header, DecodeError> {
        let id = self.read_u16()?;
        let flags0 = self.read_byte()?;
        let flags1 = self.read_byte()?;

        Ok(Header {
            id,
            qr: if flags0 & 0b1000_0000 == 0 {
                Qr::Query
            } else {
                Qr::Response
            },
            op: OpCode::from_u8((flags0 >> 3) & 0b1111),
            authoritative: flags0 & 0b0000_0100 != 0,
            truncated: flags0 & 0b0000_0010 != 0,
            recursion_desired: flags0 & 0b0000_0001 != 0,
            recursion_available: flags1 & 0b1000_0000 != 0,
            z: (flags1 >> 4) & 0b0111,
            rcode: RCode::from_u8(flags1 & 0b1111),
            qd_count: self.read_u16()?,
            an_count: self.read_u16()?,
            ns_count: self.read_u16()?,
            ar_count: self.read_u16()?,
        })
    }

    /// Reads a question item.
    pub fn read_question(&mut self) -> Result<Question, DecodeError> {
        let name = self.read_name()?;

        Ok(Question {
            name,
            q_type: RecordType::from_u16(self.read_u16()?),
            q_class: Class::from_u16(self.read_u16()?),
        })
    }

    /// Reads a resource record item, interpreting its data in place.
    pub fn read_resource(&mut self) -> Result<Resource, DecodeError> {
        let name = self.read_name()?;

        let r_type = RecordType::from_u16(self.read_u16()?);
        let r_class = Class::from_u16(self.read_u16()?);
        let ttl = self.read_u32()?;
        let length = self.read_u16()?;

        let start = self.pos;
        let data = RData::decode(r_type, self, length)?;

        // The record occupies exactly RDLENGTH bytes regardless of how the
        // type-specific decoder walked it.
        self.seek(start + length as usize)?;

        Ok(Resource {
            name,
            r_type,
            r_class,
            ttl,
            data,
        })
    }
}

/// Writes a single DNS message as a series of bytes.
pub struct MsgWriter<'a> {
    data: &'a mut [u8],
    pos: usize,
}

impl<'a> MsgWriter<'a> {
    /// Constructs a new message writer that will write into the given byte slice.
    pub fn new(data: &'a mut [u8]) -> MsgWriter<'a> {
        MsgWriter { data, pos: 0 }
    }

    /// Returns the number of bytes written so far.
    pub fn written(&self) -> usize {
        self.pos
    }

    /// Returns a subslice of the wrapped byte slice that contains only the
    /// bytes written.
    pub fn into_bytes(self) -> &'a [u8] {
        &self.data[..self.pos]
    }

    /// Writes a series of bytes to the message. Returns `Err(TooLong)` if the
    /// whole buffer cannot be written.
    pub fn write(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        let end = self.pos + data.len();
        if end > MESSAGE_LIMIT || end > self.data.len() {
            return Err(EncodeError::TooLong);
        }
        self.data[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    /// Writes a single byte to the message.
    pub fn write_byte(&mut self, data: u8) -> Result<(), EncodeError> {
        self.write(&[data])
    }

    /// Writes an unsigned 16 bit integer in big-endian format.
    pub fn write_u16(&mut self, data: u16) -> Result<(), EncodeError> {
        self.write(&data.to_be_bytes())
    }

    /// Writes an unsigned 32 bit integer in big-endian format.
    pub fn write_u32(&mut self, data: u32) -> Result<(), EncodeError> {
        self.write(&data.to_be_bytes())
    }

    /// Writes a name to the message in length-prefixed label format.
    ///
    /// Empty labels are skipped, so both `"foo.com"` and `"foo.com."`
    /// produce the same bytes. Label and total name lengths are not
    /// checked against the RFC 1035 limits; servers reject names they
    /// do not like.
    pub fn write_name(&mut self, name: &str) -> Result<(), EncodeError> {
        for seg in name.split('.').filter(|seg| !seg.is_empty()) {
            self.write_byte(seg.len() as u8)?;
            self.write(seg.as_bytes())?;
        }
        self.write_byte(0)
    }

    /// Writes a message header.
    pub fn write_header(&mut self, header: &Header) -> Result<(), EncodeError> {
        let mut flags0 = 0u8;
        let mut flags1 = 0u8;

        flags0 |= (header.qr as u8 & 1) << 7;
        flags0 |= (header.op.to_u8() & 0b1111) << 3;
        flags0 |= (header.authoritative as u8) << 2;
        flags0 |= (header.truncated as u8) << 1;
        flags0 |= header.recursion_desired as u8;

        flags1 |= (header.recursion_available as u8) << 7;
        flags1 |= (header.z & 0b111) << 4;
        flags1 |= header.rcode.to_u8() & 0b1111;

        self.write_u16(header.id)?;
        self.write_byte(flags0)?;
        self.write_byte(flags1)?;
        self.write_u16(header.qd_count)?;
        self.write_u16(header.an_count)?;
        self.write_u16(header.ns_count)?;
        self.write_u16(header.ar_count)
    }
}

/// Composes a query message for the given name and record type.
///
/// The transaction id is the low 16 bits of the process id; it serves only
/// as a nonce for matching the response. On success, returns a subslice of
/// the given buffer containing only the encoded message bytes.
pub fn build_query<'a>(
    name: &str,
    q_type: RecordType,
    buf: &'a mut [u8],
) -> Result<&'a [u8], EncodeError> {
    let mut w = MsgWriter::new(buf);

    let header = Header {
        id: process::id() as u16,
        recursion_desired: true,
        qd_count: 1,
        ..Header::default()
    };

    w.write_header(&header)?;
    w.write_name(name)?;
    w.write_u16(q_type.to_u16())?;
    w.write_u16(Class::Internet.to_u16())?;

    Ok(w.into_bytes())
}

/// Represents a decoded DNS message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    /// Describes the content of the remainder of the message.
    pub header: Header,
    /// Carries the question of query type messages.
    pub question: Vec<Question>,
    /// Resource records that answer the query
    pub answer: Vec<Resource>,
    /// Resource records that point to an authoritative name server
    pub authority: Vec<Resource>,
    /// Resource records that relate to the query, but are not strictly
    /// answers for the question.
    pub additional: Vec<Resource>,
}

impl Message {
    /// Decodes a message from a series of bytes.
    pub fn decode(data: &[u8]) -> Result<Message, DecodeError> {
        let mut r = MsgReader::new(data);

        let header = r.read_header()?;
        let mut msg = Message {
            header,
            ..Message::default()
        };

        for _ in 0..header.qd_count {
            msg.question.push(r.read_question()?);
        }

        for _ in 0..header.an_count {
            msg.answer.push(r.read_resource()?);
        }

        for _ in 0..header.ns_count {
            msg.authority.push(r.read_resource()?);
        }

        for _ in 0..header.ar_count {
            msg.additional.push(r.read_resource()?);
        }

        Ok(msg)
    }
}

/// Represents a message header.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Header {
    /// Transaction ID; corresponding replies will have the same ID.
    pub id: u16,
    /// Query or response
    pub qr: Qr,
    /// Kind of query
    pub op: OpCode,
    /// In a response, indicates that the responding name server is an
    /// authority for the domain name in question section.
    pub authoritative: bool,
    /// Indicates whether the message was truncated due to length greater
    /// than that permitted on the transmission channel.
    pub truncated: bool,
    /// In a query, directs the name server to pursue the query recursively.
    pub recursion_desired: bool,
    /// In a response, indicates whether recursive queries are available on
    /// the name server.
    pub recursion_available: bool,
    /// Reserved bits; zero in well-formed messages.
    pub z: u8,
    /// Response code
    pub rcode: RCode,
    /// Number of entries in the question section
    pub qd_count: u16,
    /// Number of records in the answer section
    pub an_count: u16,
    /// Number of records in the authority section
    pub ns_count: u16,
    /// Number of records in the additional section
    pub ar_count: u16,
}

impl Default for Header {
    fn default() -> Header {
        Header {
            id: 0,
            qr: Qr::Query,
            op: OpCode::Query,
            authoritative: false,
            truncated: false,
            recursion_desired: false,
            recursion_available: false,
            z: 0,
            rcode: RCode::NoError,
            qd_count: 0,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }
}

/// Represents a question item.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Question {
    /// Query name
    pub name: String,
    /// Query type
    pub q_type: RecordType,
    /// Query class
    pub q_class: Class,
}

/// Represents a resource record item with its data decoded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Resource {
    /// Resource name
    pub name: String,
    /// Resource type
    pub r_type: RecordType,
    /// Resource class
    pub r_class: Class,
    /// Time-to-live
    pub ttl: u32,
    /// Record data
    pub data: RData,
}

/// Indicates a message is either a query or response.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Qr {
    /// Query
    Query = 0,
    /// Response
    Response = 1,
}

/// Represents the kind of message query.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OpCode {
    /// Standard query
    Query,
    /// Inverse query
    IQuery,
    /// Server status request
    Status,
    /// Unrecognized opcode
    Other(u8),
}

impl OpCode {
    /// Converts a `u8` to an `OpCode`.
    pub fn from_u8(u: u8) -> OpCode {
        match u {
            0 => OpCode::Query,
            1 => OpCode::IQuery,
            2 => OpCode::Status,
            n => OpCode::Other(n),
        }
    }

    /// Converts an `OpCode` to a `u8`.
    pub fn to_u8(&self) -> u8 {
        match *self {
            OpCode::Query => 0,
            OpCode::IQuery => 1,
            OpCode::Status => 2,
            OpCode::Other(n) => n,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            OpCode::Query => "QUERY",
            OpCode::IQuery => "IQUERY",
            OpCode::Status => "STATUS",
            OpCode::Other(_) => "INVALID",
        })
    }
}

/// Represents the response code of a message.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RCode {
    /// No error condition.
    NoError,
    /// The server was unable to interpret the query.
    FormatError,
    /// The name server was unable to process the query due to a failure of
    /// the name server.
    ServerFailure,
    /// Name referenced in query does not exist.
    NameError,
    /// Requested query kind is not supported by name server.
    NotImplemented,
    /// The name server refuses to perform the specified operation for
    /// policy reasons.
    Refused,
    /// Unknown response code.
    Other(u8),
}

impl RCode {
    /// Converts a `u8` to an `RCode`.
    pub fn from_u8(u: u8) -> RCode {
        match u {
            0 => RCode::NoError,
            1 => RCode::FormatError,
            2 => RCode::ServerFailure,
            3 => RCode::NameError,
            4 => RCode::NotImplemented,
            5 => RCode::Refused,
            n => RCode::Other(n),
        }
    }

    /// Converts an `RCode` to a `u8`.
    pub fn to_u8(&self) -> u8 {
        match *self {
            RCode::NoError => 0,
            RCode::FormatError => 1,
            RCode::ServerFailure => 2,
            RCode::NameError => 3,
            RCode::NotImplemented => 4,
            RCode::Refused => 5,
            RCode::Other(n) => n,
        }
    }
}

impl fmt::Display for RCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            RCode::NoError => "NOERROR",
            RCode::FormatError => "FORMATERROR",
            RCode::ServerFailure => "SERVERFAILURE",
            RCode::NameError => "NAMEERROR",
            RCode::NotImplemented => "NOTIMPLEMENTED",
            RCode::Refused => "REFUSED",
            RCode::Other(_) => "INVALID",
        })
    }
}
