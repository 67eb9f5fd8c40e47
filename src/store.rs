//! Shared-access wrapper around the radix engine.
//!
//! The engine itself does no locking; this wrapper enforces the
//! multi-reader/single-writer discipline. Lookups take the read side and
//! run concurrently; inserts and checkpoint exports take the write side.
//! A lookup issued after an insert completes on the same thread observes
//! the insert's effects.

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::prefix::Prefix;
use crate::radix::{Label, RadixTrie};

/// A concurrently shareable alias trie.
pub struct AliasStore {
    inner: RwLock<RadixTrie>,
}

impl AliasStore {
    /// Wrap an already-constructed trie.
    pub fn new(trie: RadixTrie) -> Self {
        Self {
            inner: RwLock::new(trie),
        }
    }

    /// Classify a target under shared access.
    pub fn lookup(&self, addr: &[u8; 16]) -> Label {
        self.inner.read().lookup(addr)
    }

    /// Insert an aliased prefix under exclusive access.
    pub fn insert(&self, prefix: &Prefix) {
        self.inner.write().insert(prefix);
    }

    /// Whether the tree changed since the last checkpoint export.
    pub fn is_changed(&self) -> bool {
        self.inner.read().is_changed()
    }

    /// Checkpoint poll interval in seconds.
    pub fn checkpoint_frequency(&self) -> f32 {
        self.inner.read().checkpoint_frequency()
    }

    /// Export a checkpoint if the tree changed, under exclusive access.
    /// Returns the written path, or `None` when nothing changed.
    pub fn export_if_changed(&self, when: DateTime<Utc>) -> io::Result<Option<PathBuf>> {
        let mut trie = self.inner.write();
        if !trie.is_changed() {
            return Ok(None);
        }
        trie.export_checkpoint(when).map(Some)
    }
}
