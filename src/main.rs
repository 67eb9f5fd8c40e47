//! aliasmap binary: construct the alias trie, then run the lookup
//! pipeline: parallel lookup workers over a shared trie, serialized
//! inserts, a checkpoint timer, and JSON result lines.

use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use crossbeam_channel::{bounded, RecvTimeoutError};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use aliasmap::command::Command;
use aliasmap::config::Config;
use aliasmap::input::{feed_commands, load_construction_file};
use aliasmap::lookup::run_lookup;
use aliasmap::modes;
use aliasmap::monitor::{Monitor, MonitorState};
use aliasmap::output::write_results;
use aliasmap::radix::RadixTrie;
use aliasmap::store::AliasStore;

/// What one run did, written to the metadata sink on exit.
#[derive(Serialize)]
struct RunSummary {
    status: MonitorState,
    start: String,
    end: String,
    duration: String,
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_file == "-" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        let file = File::create(&config.log_file)
            .with_context(|| format!("creating log file {}", config.log_file))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    }
    Ok(())
}

fn construct_store(config: &Config) -> anyhow::Result<RadixTrie> {
    let mut trie = RadixTrie::new();
    trie.set_checkpoint_base_name(&config.checkpoint_base_name);
    trie.set_checkpoint_frequency(config.checkpoint_frequency);
    if let Some(path) = &config.construct_input_file {
        let inserted = load_construction_file(&mut trie, path)?;
        let (nodes, leaves) = trie.node_counts();
        info!(inserted, nodes, leaves, "alias trie constructed");
    }
    // Construction churn does not need a checkpoint of its own...
    trie.set_changed(false);
    // ...unless covering aliases surfaced that the input file lacks.
    if trie.construction_alias_found() {
        let when = Utc::now();
        info!("found new aliases while constructing the tree, exporting a checkpoint");
        trie.export_checkpoint(when)
            .context("exporting the construction checkpoint")?;
    }
    Ok(trie)
}

fn run_pipeline(config: &Config) -> anyhow::Result<()> {
    let store = Arc::new(AliasStore::new(construct_store(config)?));
    let monitor = Arc::new(Monitor::new());
    let ticker = Monitor::spawn_ticker(Arc::clone(&monitor));

    let start = Utc::now();
    info!(at = %start.to_rfc3339_opts(SecondsFormat::Secs, true), "started dealiasing");

    let queue_depth = 4 * config.num_lookup_workers;
    let (cmd_tx, cmd_rx) = bounded::<Command>(queue_depth);
    let (out_tx, out_rx) = bounded::<Vec<u8>>(queue_depth);

    // Checkpoint timer: poll the change flag, export under exclusive
    // access. Export failure means the host cannot persist state, which
    // is fatal.
    let (timer_stop_tx, timer_stop_rx) = bounded::<()>(0);
    let timer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            let period = Duration::from_secs_f32(store.checkpoint_frequency().max(0.001));
            loop {
                match timer_stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        match store.export_if_changed(Utc::now()) {
                            Ok(Some(path)) => {
                                info!(path = %path.display(), "detected changes in the tree, checkpoint created");
                            }
                            Ok(None) => {}
                            Err(err) => {
                                error!(%err, "checkpoint export failed");
                                std::process::exit(1);
                            }
                        }
                    }
                    _ => return,
                }
            }
        })
    };

    let output = {
        let sink = config.open_output().context("opening the output file")?;
        let flush_each = config.flush;
        thread::spawn(move || write_results(sink, out_rx, flush_each))
    };

    let mut workers = Vec::with_capacity(config.num_lookup_workers);
    for _ in 0..config.num_lookup_workers {
        let commands = cmd_rx.clone();
        let results = out_tx.clone();
        let store = Arc::clone(&store);
        let monitor = Arc::clone(&monitor);
        let expanded = config.expanded;
        workers.push(thread::spawn(move || {
            for command in commands.iter() {
                match command {
                    Command::Lookup(addr) => {
                        let response = run_lookup(&store, &monitor, addr, expanded);
                        match serde_json::to_vec(&response) {
                            Ok(line) => {
                                if results.send(line).is_err() {
                                    return;
                                }
                            }
                            Err(err) => error!(%err, "unable to marshal result"),
                        }
                    }
                    Command::Insert(prefix) => {
                        info!(%prefix, "inserting");
                        store.insert(&prefix);
                    }
                    Command::Quit => return,
                }
            }
        }));
    }
    drop(cmd_rx);
    drop(out_tx);

    let source = config.open_input().context("opening the input file")?;
    feed_commands(source, &cmd_tx)?;
    drop(cmd_tx);

    for worker in workers {
        worker.join().expect("lookup worker panicked");
    }
    output
        .join()
        .expect("output writer panicked")
        .context("writing results")?;

    drop(timer_stop_tx);
    timer.join().expect("checkpoint timer panicked");
    monitor.stop();
    ticker.join().expect("monitor ticker panicked");

    let end = Utc::now();
    info!(at = %end.to_rfc3339_opts(SecondsFormat::Secs, true), "finished dealiasing");

    let summary = RunSummary {
        status: monitor.state(),
        start: start.to_rfc3339_opts(SecondsFormat::Secs, true),
        end: end.to_rfc3339_opts(SecondsFormat::Secs, true),
        duration: format!("{:?}", (end - start).to_std().unwrap_or_default()),
    };
    let mut meta = config.open_metadata().context("opening the metadata file")?;
    serde_json::to_writer(&mut meta, &summary).context("writing the run summary")?;
    meta.write_all(b"\n")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    config.validate()?;
    init_logging(&config)?;

    if config.test {
        let start = Utc::now();
        info!(at = %start.to_rfc3339_opts(SecondsFormat::Secs, true), "started test mode");
        modes::run(&config)?;
        let end = Utc::now();
        info!(at = %end.to_rfc3339_opts(SecondsFormat::Secs, true), "finished test mode");
        return Ok(());
    }

    run_pipeline(&config)
}
