//! Offline modes: engine checks and shape studies driven by flat files.

use std::io::BufRead;
use std::net::Ipv6Addr;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::amt::{Amt, RadixEquivalence};
use crate::config::{Config, TestType};
use crate::input::load_construction_file;
use crate::prefix::parse_addr;
use crate::radix::RadixTrie;

/// Dispatch the configured offline mode.
pub fn run(config: &Config) -> anyhow::Result<()> {
    let construct = config
        .construct_input_file
        .as_deref()
        .context("offline modes need a construction input file")?;
    match config.test_type {
        TestType::Radix => {
            let targets = config
                .test_input_file
                .as_deref()
                .context("the radix mode needs a lookup target file")?;
            radix_check(construct, targets, config.test_step_size)
        }
        TestType::Stats => {
            let out = config
                .test_output_file
                .as_deref()
                .context("the stats mode needs an output file")?;
            stats_radix(construct, config.test_step_size)?;
            stats_checkpointed(construct, out, config.test_step_size)
        }
        TestType::Stress => stress(construct),
    }
}

fn read_addrs(path: &Path) -> anyhow::Result<Vec<Ipv6Addr>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening address file {}", path.display()))?;
    let mut addrs = Vec::new();
    for line in std::io::BufReader::new(file).lines() {
        let line = line?;
        if let Ok(addr) = parse_addr(&line) {
            addrs.push(addr);
        }
    }
    Ok(addrs)
}

/// Build a trie from a prefix file, then answer every lookup in the
/// target file, printing each label.
pub fn radix_check(
    construct: impl AsRef<Path>,
    targets: impl AsRef<Path>,
    step: usize,
) -> anyhow::Result<()> {
    let mut trie = RadixTrie::new();
    let inserted = load_construction_file(&mut trie, construct)?;
    info!(inserted, "alias trie constructed");

    for (count, addr) in read_addrs(targets.as_ref())?.into_iter().enumerate() {
        let label = trie.lookup(&addr.octets());
        println!(
            "Lookup for: {addr} -> aliased={} metadata={}",
            label.aliased, label.metadata
        );
        if (count + 1) % step == 0 {
            info!(progress = count + 1, "lookups answered");
        }
    }
    Ok(())
}

/// Feed addresses into an AMT, reporting the radix-equivalent node count
/// at every step boundary and once at the end.
pub fn stats_radix(construct: impl AsRef<Path>, step: usize) -> anyhow::Result<Vec<RadixEquivalence>> {
    let mut amt = Amt::new();
    let mut censuses = Vec::new();
    let mut counter = 0usize;
    for addr in read_addrs(construct.as_ref())? {
        amt.insert(&addr.octets());
        counter += 1;
        if counter % step == 0 {
            info!(progress = counter, "addresses inserted");
            censuses.push(amt.traverse_bfs_radix(counter));
        }
    }
    info!(progress = counter, "addresses inserted");
    censuses.push(amt.traverse_bfs_radix(counter));
    Ok(censuses)
}

/// Feed addresses into an AMT with per-checkpoint statistics, exporting
/// a per-depth table at every step boundary and once at the end.
pub fn stats_checkpointed(
    construct: impl AsRef<Path>,
    out_base: &str,
    step: usize,
) -> anyhow::Result<()> {
    let mut amt = Amt::new();
    let mut counter = 0usize;
    for addr in read_addrs(construct.as_ref())? {
        amt.insert_with_checkpoint(&addr.octets());
        counter += 1;
        if counter % step == 0 {
            info!(progress = counter, "addresses inserted");
            amt.export_stats(format!("{out_base}-{counter}.txt"))?;
            amt.add_checkpoint();
        }
    }
    info!(progress = counter, "addresses inserted");
    amt.export_stats(format!("{out_base}-{counter}.txt"))?;
    amt.add_checkpoint();
    Ok(())
}

/// Bulk-insert a whole address file into an AMT, logging progress, and
/// finish with a radix-equivalence census.
pub fn stress(construct: impl AsRef<Path>) -> anyhow::Result<()> {
    let file = std::fs::File::open(construct.as_ref())
        .with_context(|| format!("opening address file {}", construct.as_ref().display()))?;
    let mut amt = Amt::new();
    let mut counter = 0usize;
    for line in std::io::BufReader::new(file).lines() {
        let line = line?;
        let Ok(addr) = parse_addr(&line) else {
            info!(record = line.as_str(), counter, "skipping unparsable address");
            continue;
        };
        amt.insert(&addr.octets());
        counter += 1;
        if counter % 100_000 == 0 {
            info!(progress = counter, "addresses inserted");
        }
    }
    let census = amt.traverse_bfs_radix(counter);
    info!(
        total = census.normal_nodes,
        radix = census.radix_nodes,
        "stress insert finished"
    );
    Ok(())
}
