//! Command stream model.
//!
//! Lines arrive either as JSON objects (`{"type": "lookup", "data": …}`)
//! or as bare addresses. They are parsed into tagged variants right at
//! the edge so the worker hot path never inspects dynamic payloads.

use std::net::Ipv6Addr;

use serde::Deserialize;
use thiserror::Error;

use crate::prefix::{parse_addr, ParseError, Prefix};

/// Errors from the command stream.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The JSON `type` field names no known command.
    #[error("unknown command type: {0}")]
    UnknownType(String),
    /// Inserts need a network, not a single address.
    #[error("cannot insert a bare address, expected CIDR notation")]
    InsertNeedsNetwork,
    /// The data field parsed as neither address nor network.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A parsed target: a single address or a whole network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// One canonical address.
    Addr(Ipv6Addr),
    /// A CIDR network.
    Net(Prefix),
}

/// One parsed input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Classify the target; networks expand to every contained address.
    Lookup(Target),
    /// Grow the alias set.
    Insert(Target),
    /// Stop reading input.
    Quit,
}

/// The unit of work handed to lookup workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Classify one address.
    Lookup(Ipv6Addr),
    /// Insert one aliased prefix.
    Insert(Prefix),
    /// Drain and exit.
    Quit,
}

#[derive(Deserialize)]
struct WireCommand {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: String,
}

/// Parse one line of the command stream. Anything that is not a JSON
/// command object is treated as a bare lookup target.
pub fn parse_line(line: &str) -> Result<Request, CommandError> {
    if let Ok(wire) = serde_json::from_str::<WireCommand>(line) {
        match wire.kind.as_str() {
            "lookup" => Ok(Request::Lookup(parse_target(&wire.data)?)),
            "insert" => Ok(Request::Insert(parse_target(&wire.data)?)),
            "quit" => Ok(Request::Quit),
            other => Err(CommandError::UnknownType(other.to_owned())),
        }
    } else {
        Ok(Request::Lookup(parse_target(line)?))
    }
}

/// Parse a record as an address first, then as CIDR notation.
pub fn parse_target(record: &str) -> Result<Target, ParseError> {
    let record = record.trim();
    if let Ok(addr) = parse_addr(record) {
        return Ok(Target::Addr(addr));
    }
    match record.parse::<Prefix>() {
        Ok(net) => Ok(Target::Net(net)),
        Err(_) => Err(ParseError::NotAnAddress(record.to_owned())),
    }
}
