//! Command-line configuration.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use anyhow::bail;
use clap::{Parser, ValueEnum};

/// Offline mode selection for `--test`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestType {
    /// Build a trie and answer lookups from a file.
    Radix,
    /// AMT shape statistics and radix-equivalence counts.
    Stats,
    /// Bulk-insert stress run over the AMT.
    Stress,
}

/// Framework options parsed from the command line.
#[derive(Debug, Clone, Parser)]
#[command(name = "aliasmap", version, about = "IPv6 aliased-prefix classification at line rate")]
pub struct Config {
    /// Output filename, use - for stdout
    #[arg(short = 'o', long, default_value = "-")]
    pub output_file: String,

    /// Input filename, use - for stdin
    #[arg(short = 'f', long, default_value = "-")]
    pub input_file: String,

    /// Metadata filename, use - for stderr
    #[arg(short = 'm', long, default_value = "-")]
    pub metadata_file: String,

    /// Log filename, use - for stderr
    #[arg(short = 'l', long, default_value = "-")]
    pub log_file: String,

    /// List of prefixes used to construct the alias trie
    #[arg(short = 'c', long)]
    pub construct_input_file: Option<String>,

    /// Filename prefix for checkpoint exports; the export timestamp is
    /// appended
    #[arg(long, default_value = crate::radix::DEFAULT_CHECKPOINT_BASE)]
    pub checkpoint_base_name: String,

    /// How often to poll for tree changes and export a checkpoint, in
    /// seconds
    #[arg(long, default_value_t = crate::radix::DEFAULT_CHECKPOINT_FREQUENCY)]
    pub checkpoint_frequency: f32,

    /// Run an offline mode instead of the lookup pipeline
    #[arg(short = 't', long)]
    pub test: bool,

    /// Which offline mode to run
    #[arg(long, value_enum, default_value_t = TestType::Radix)]
    pub test_type: TestType,

    /// Input file for the offline mode (e.g. lookup targets for radix)
    #[arg(long)]
    pub test_input_file: Option<String>,

    /// Output file for the stats mode
    #[arg(long)]
    pub test_output_file: Option<String>,

    /// Progress/checkpoint step size for offline modes
    #[arg(long, default_value_t = 1_000_000)]
    pub test_step_size: usize,

    /// Print IPs in an expanded format
    #[arg(long)]
    pub expanded: bool,

    /// Number of workers performing concurrent lookups
    #[arg(long, default_value_t = 1000)]
    pub num_lookup_workers: usize,

    /// Flush after each line of output
    #[arg(long)]
    pub flush: bool,
}

impl Config {
    /// Reject option combinations the pipeline cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.num_lookup_workers == 0 {
            bail!("need at least one lookup worker");
        }
        if self.test {
            if self.test_input_file.is_none() && self.test_type == TestType::Radix {
                bail!("test input file should be provided in the radix test mode");
            }
            if self.construct_input_file.is_none() {
                bail!("construction input file should be provided in any test mode");
            }
            if self.test_type == TestType::Stats && self.test_output_file.is_none() {
                bail!("test output file should be provided in the stats test mode");
            }
        }
        Ok(())
    }

    /// The command stream: stdin for `-`, otherwise the named file.
    pub fn open_input(&self) -> io::Result<Box<dyn BufRead + Send>> {
        Ok(if self.input_file == "-" {
            Box::new(BufReader::new(io::stdin()))
        } else {
            Box::new(BufReader::new(File::open(&self.input_file)?))
        })
    }

    /// The result sink: stdout for `-`, otherwise the named file.
    pub fn open_output(&self) -> io::Result<Box<dyn Write + Send>> {
        open_sink(&self.output_file, io::stdout)
    }

    /// The run-summary sink: stderr for `-`, otherwise the named file.
    pub fn open_metadata(&self) -> io::Result<Box<dyn Write + Send>> {
        open_sink(&self.metadata_file, io::stderr)
    }
}

fn open_sink<W: Write + Send + 'static>(
    name: &str,
    fallback: impl FnOnce() -> W,
) -> io::Result<Box<dyn Write + Send>> {
    Ok(if name == "-" {
        Box::new(fallback())
    } else {
        Box::new(File::create(name)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let config = Config::parse_from(["aliasmap"]);
        assert_eq!(config.checkpoint_base_name, "checkpoint");
        assert_eq!(config.checkpoint_frequency, 30.0);
        assert_eq!(config.num_lookup_workers, 1000);
        assert_eq!(config.test_step_size, 1_000_000);
        assert!(!config.test);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = Config::parse_from(["aliasmap", "--num-lookup-workers", "0"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn stats_mode_requires_an_output_file() {
        let config = Config::parse_from([
            "aliasmap",
            "--test",
            "--test-type",
            "stats",
            "--construct-input-file",
            "prefixes.txt",
        ]);
        assert!(config.validate().is_err());
    }
}
