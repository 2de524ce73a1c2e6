//! Console and log-file reporting of queries and decoded answers

use std::fs::{File, OpenOptions};
use std::io::{self, Write};

use crate::message::{Header, Message, Qr, Question, Resource};

/// Default path of the outbound query log.
pub const MSG_LOG_PATH: &str = "message.log";

/// Default path of the decoded answer log.
pub const DNS_LOG_PATH: &str = "dns.log";

/// Appends one outbound query to the raw message log, as uppercase hex
/// byte pairs terminated by a newline.
pub fn log_query(path: &str, query: &[u8]) -> io::Result<()> {
    let mut file = open_append(path)?;
    file.write_all(hex_line(query).as_bytes())
}

/// Formats a byte buffer as space-separated uppercase hex pairs.
pub fn hex_line(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut s = String::with_capacity(bytes.len() * 3 + 1);
    for b in bytes {
        let _ = write!(s, "{:02X} ", b);
    }
    s.push('\n');
    s
}

/// Formats a header in the style of `host -v`.
pub fn header_text(header: &Header) -> String {
    let mut flags = String::new();
    if header.qr == Qr::Response {
        flags.push_str(" qr");
    }
    if header.authoritative {
        flags.push_str(" aa");
    }
    if header.truncated {
        flags.push_str(" tc");
    }
    if header.recursion_desired {
        flags.push_str(" rd");
    }
    if header.recursion_available {
        flags.push_str(" ra");
    }

    format!(
        ";; ->>HEADER<<- opcode: {}, status: {}, id: {}\n\
         ;; flags:{}; QUERY: {}, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}\n\n",
        header.op,
        header.rcode,
        header.id,
        flags,
        header.qd_count,
        header.an_count,
        header.ns_count,
        header.ar_count
    )
}

/// Prints a header to the console; used to surface an erroneous response
/// from the final server.
pub fn print_header(header: &Header) {
    print!("{}", header_text(header));
}

/// Formats one question section line.
pub fn question_line(question: &Question) -> String {
    format!(
        ";{} {} {}\n\n",
        question.name, question.q_class, question.q_type
    )
}

/// Formats one resource record line.
pub fn record_line(rr: &Resource) -> String {
    format!(";{} {} {} {}\n", rr.name, rr.r_class, rr.r_type, rr.data)
}

/// Writes decoded answers to the console and the answer log.
pub struct Reporter {
    log: File,
}

impl Reporter {
    /// Opens the answer log at the given path for appending.
    pub fn open(path: &str) -> io::Result<Reporter> {
        Ok(Reporter {
            log: open_append(path)?,
        })
    }

    /// Reports every section of a decoded answer: the header and question
    /// go to the console, the record sections to both the console and the
    /// answer log, preceded in the log by a line naming the answering
    /// server and the question.
    pub fn report(&mut self, server: &str, msg: &Message) -> io::Result<()> {
        print!("{}", header_text(&msg.header));

        if !msg.question.is_empty() {
            println!(";; QUESTION SECTION:");
            for q in &msg.question {
                print!("{}", question_line(q));
            }
        }

        match msg.question.first() {
            Some(q) => writeln!(self.log, "; {} - {} {}\n", server, q.name, q.q_type)?,
            None => writeln!(self.log, "; {} -\n", server)?,
        }

        self.section(";; ANSWER SECTION:", &msg.answer)?;
        self.section(";; AUTHORITY SECTION:", &msg.authority)?;
        self.section(";; ADDITIONAL SECTION:", &msg.additional)?;

        self.log.write_all(b"\n")
    }

    fn section(&mut self, banner: &str, records: &[Resource]) -> io::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        self.emit(&format!("{}\n", banner))?;
        for rr in records {
            self.emit(&record_line(rr))?;
        }
        self.emit("\n")
    }

    /// Writes text to both the console and the answer log.
    fn emit(&mut self, text: &str) -> io::Result<()> {
        self.log.write_all(text.as_bytes())?;
        print!("{}", text);
        Ok(())
    }
}

fn open_append(path: &str) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod test {
    use super::{header_text, hex_line, question_line, record_line};
    use crate::message::{Header, OpCode, Qr, Question, RCode, Resource};
    use crate::record::{Class, RData, RecordType};

    #[test]
    fn test_hex_line() {
        assert_eq!(hex_line(&[0x00, 0xab, 0x7f]), "00 AB 7F \n");
        assert_eq!(hex_line(&[]), "\n");
    }

    #[test]
    fn test_header_text() {
        let header = Header {
            id: 4660,
            qr: Qr::Response,
            op: OpCode::Query,
            recursion_desired: true,
            recursion_available: true,
            rcode: RCode::NoError,
            qd_count: 1,
            an_count: 2,
            ..Header::default()
        };

        assert_eq!(
            header_text(&header),
            ";; ->>HEADER<<- opcode: QUERY, status: NOERROR, id: 4660\n\
             ;; flags: qr rd ra; QUERY: 1, ANSWER: 2, AUTHORITY: 0, ADDITIONAL: 0\n\n"
        );
    }

    #[test]
    fn test_header_text_no_flags() {
        let header = Header {
            id: 7,
            rcode: RCode::ServerFailure,
            ..Header::default()
        };

        assert_eq!(
            header_text(&header),
            ";; ->>HEADER<<- opcode: QUERY, status: SERVERFAILURE, id: 7\n\
             ;; flags:; QUERY: 0, ANSWER: 0, AUTHORITY: 0, ADDITIONAL: 0\n\n"
        );
    }

    #[test]
    fn test_question_line() {
        let q = Question {
            name: "example.com.".to_owned(),
            q_type: RecordType::Mx,
            q_class: Class::Internet,
        };

        assert_eq!(question_line(&q), ";example.com. IN MX\n\n");
    }

    #[test]
    fn test_record_line() {
        let rr = Resource {
            name: "example.com.".to_owned(),
            r_type: RecordType::A,
            r_class: Class::Internet,
            ttl: 3600,
            data: RData::A("93.184.216.34".parse().unwrap()),
        };

        assert_eq!(record_line(&rr), ";example.com. IN A 93.184.216.34\n");
    }
}
