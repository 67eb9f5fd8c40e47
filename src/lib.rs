//! # aliasmap
//!
//! Line-rate classification of IPv6 addresses against a set of aliased
//! CIDR prefixes.
//!
//! Two trie engines share the crate. The [`radix`] engine is the
//! production side: a path-compressed, bit-granular binary trie that
//! answers "does any alias prefix cover this address", grows at runtime
//! through inserts, and checkpoints itself to disk whenever it changed.
//! The [`amt`] engine is the measurement side: a fanout-16 array-mapped
//! trie over nibble sequences used to study tree shape, reporting
//! per-depth fanout statistics and the node count a radix rendition
//! would need.
//!
//! The rest of the crate is the host surface around the engines: a
//! tagged command stream ([`command`], [`input`]), JSON result lines
//! ([`lookup`], [`output`]), the shared-access wrapper ([`store`]),
//! throughput accounting ([`monitor`]), and the offline modes
//! ([`modes`]).
//!
//! ## Example
//!
//! ```rust
//! use aliasmap::radix::RadixTrie;
//!
//! let mut trie = RadixTrie::new();
//! trie.insert(&"2001:db8::/32".parse().unwrap());
//!
//! let addr: std::net::Ipv6Addr = "2001:db8::1".parse().unwrap();
//! let label = trie.lookup(&addr.octets());
//! assert!(label.aliased);
//! assert_eq!(label.metadata, "2001:db8::/32");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod amt;
pub mod bits;
pub mod command;
pub mod config;
pub mod input;
pub mod lookup;
pub mod modes;
pub mod monitor;
pub mod output;
pub mod prefix;
pub mod radix;
pub mod store;

#[cfg(test)]
mod proptests;

pub use command::Command;
pub use config::Config;
pub use lookup::{run_lookup, LookupResponse, LookupStatus};
pub use monitor::Monitor;
pub use prefix::Prefix;
pub use radix::{Label, RadixTrie};
pub use store::AliasStore;

/// Crate version, as published.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
