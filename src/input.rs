//! Input feeds: the construction file and the command stream.

use std::io::BufRead;
use std::net::Ipv6Addr;
use std::path::Path;

use anyhow::Context;
use crossbeam_channel::Sender;
use tracing::{info, warn};

use crate::command::{parse_line, Command, CommandError, Request, Target};
use crate::prefix::Prefix;
use crate::radix::RadixTrie;

/// Load a construction file (one CIDR per line) into the trie. Lines
/// that fail to parse are logged and skipped. Returns how many prefixes
/// were inserted.
pub fn load_construction_file(trie: &mut RadixTrie, path: impl AsRef<Path>) -> anyhow::Result<usize> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening construction file {}", path.display()))?;
    let mut inserted = 0usize;
    for line in std::io::BufReader::new(file).lines() {
        let line = line?;
        let record = line.trim();
        if record.is_empty() {
            continue;
        }
        match record.parse::<Prefix>() {
            Ok(prefix) => {
                trie.insert(&prefix);
                inserted += 1;
            }
            Err(err) => warn!(record, %err, "couldn't parse construction input"),
        }
    }
    Ok(inserted)
}

/// Read the command stream and deliver work units to the process queue.
///
/// A network lookup expands into one command per contained address. A
/// quit command stops the feed; per-record errors are logged and
/// skipped. Returns once the source is exhausted or quit arrives.
pub fn feed_commands(source: impl BufRead, queue: &Sender<Command>) -> anyhow::Result<()> {
    for line in source.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(Request::Quit) => {
                info!("quit command received, closing the feed");
                return Ok(());
            }
            Ok(Request::Lookup(Target::Addr(addr))) => {
                queue
                    .send(Command::Lookup(addr))
                    .context("process queue closed")?;
            }
            Ok(Request::Lookup(Target::Net(net))) => {
                for value in net.first()..=net.last() {
                    queue
                        .send(Command::Lookup(Ipv6Addr::from(value)))
                        .context("process queue closed")?;
                }
            }
            Ok(Request::Insert(Target::Net(net))) => {
                queue
                    .send(Command::Insert(net))
                    .context("process queue closed")?;
            }
            Ok(Request::Insert(Target::Addr(_))) => {
                let err = CommandError::InsertNeedsNetwork;
                warn!(record = line.trim(), %err, "skipping insert");
            }
            Err(err) => warn!(record = line.trim(), %err, "parse error, skipping"),
        }
    }
    info!("no more input is coming");
    Ok(())
}
