//! Command-line DNS stub-resolver client.

use std::env::args;
use std::process;

use stubdns::report::{self, Reporter, DNS_LOG_PATH, MSG_LOG_PATH};
use stubdns::{
    build_query, classify, conf, DnsResolver, InputError, InputKind, QueryOutcome, RecordType,
    CONF_PATH, MESSAGE_LIMIT,
};

fn main() {
    env_logger::init();
    process::exit(run());
}

fn run() -> i32 {
    let args = args().collect::<Vec<_>>();

    if args.len() < 3 {
        eprintln!("Usage: {} name/ip query_type", args[0]);
        return 0;
    }

    let (kind, name) = match classify(&args[1]) {
        Ok(classified) => classified,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    let q_type = match RecordType::from_token(&args[2]) {
        Some(q_type) => q_type,
        None => {
            eprintln!("{}", InputError::BadQueryType);
            return 1;
        }
    };

    if q_type == RecordType::Txt && kind != InputKind::Name {
        eprintln!("{}", InputError::TxtRequiresName);
        return 1;
    }
    if q_type == RecordType::Ptr && kind != InputKind::Address {
        eprintln!("{}", InputError::PtrRequiresAddress);
        return 1;
    }

    let config = match conf::load(CONF_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", CONF_PATH, e);
            return 1;
        }
    };

    let resolver = match DnsResolver::new(config) {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("Failed to open socket: {}", e);
            return 1;
        }
    };

    let mut buf = [0; MESSAGE_LIMIT];
    let query = match build_query(&name, q_type, &mut buf) {
        Ok(query) => query,
        Err(e) => {
            eprintln!("Failed to build query: {}", e);
            return 1;
        }
    };

    if let Err(e) = report::log_query(MSG_LOG_PATH, query) {
        eprintln!("Could not open message log file: {}", e);
        return 1;
    }

    println!("Trying \"{}\"", name);

    match resolver.dispatch(query) {
        QueryOutcome::Success {
            server,
            bytes,
            message,
        } => {
            let mut reporter = match Reporter::open(DNS_LOG_PATH) {
                Ok(reporter) => reporter,
                Err(e) => {
                    eprintln!("Could not open answer log file: {}", e);
                    return 1;
                }
            };

            if let Err(e) = reporter.report(&server, &message) {
                eprintln!("Could not write answer log: {}", e);
                return 1;
            }

            println!("Received {} bytes from {}", bytes, server);
            0
        }
        QueryOutcome::Exhausted { kind, diagnostic } => {
            // A well-formed but erroneous answer from the final server is
            // shown for diagnosis; it does not change the reported outcome.
            if let Some(header) = diagnostic {
                report::print_header(&header);
            }

            eprintln!("{}", kind);
            1
        }
    }
}
