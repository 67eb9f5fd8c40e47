//! Compressed binary radix trie over 128-bit addresses.
//!
//! The production engine behind alias lookups: bit-granular edges with
//! path compression, split/merge on insert, leaf-terminated lookup, and a
//! covering-alias rule that replaces a whole subtree with a shorter leaf
//! once an insert proves the subtree fully aliased. Change tracking feeds
//! the periodic checkpoint export.
//!
//! The engine does no locking of its own; callers serialize access
//! through [`crate::store::AliasStore`].

mod node;

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::net::Ipv6Addr;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::debug;

use crate::bits::{clear_addr_bit, ADDR_BITS};
use crate::prefix::Prefix;

pub(crate) use node::Node;

/// Default checkpoint filename prefix.
pub const DEFAULT_CHECKPOINT_BASE: &str = "checkpoint";

/// Default checkpoint poll interval in seconds.
pub const DEFAULT_CHECKPOINT_FREQUENCY: f32 = 30.0;

/// The outcome of a lookup: whether the target sits inside a known alias
/// prefix, and which one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    /// True when a leaf on the target's path fully matched its edge.
    pub aliased: bool,
    /// Canonical `address/len` of the covering leaf when aliased.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub metadata: String,
}

impl Label {
    fn miss() -> Self {
        Self {
            aliased: false,
            metadata: String::new(),
        }
    }

    fn hit(value: &[u8; 16], end_prefix: u8) -> Self {
        Self {
            aliased: true,
            metadata: format!("{}/{}", Ipv6Addr::from(*value), end_prefix),
        }
    }
}

/// What an insert did to the tree.
#[derive(Clone, Copy, Default)]
struct InsertEffect {
    changed: bool,
    alias_found: bool,
}

impl InsertEffect {
    const NONE: Self = Self {
        changed: false,
        alias_found: false,
    };
    const CHANGED: Self = Self {
        changed: true,
        alias_found: false,
    };
    const NEW_ALIAS: Self = Self {
        changed: true,
        alias_found: true,
    };
}

/// The alias trie: multi-reader/single-writer radix engine.
pub struct RadixTrie {
    root: Node,
    changed: bool,
    construction_alias_found: bool,
    checkpoint_base_name: String,
    checkpoint_frequency: f32,
}

impl RadixTrie {
    /// Create an empty trie. The root is a degenerate leaf covering zero
    /// bits; the first insert turns it into an internal node.
    pub fn new() -> Self {
        Self {
            root: Node::leaf(0, 0, [0; 16]),
            changed: false,
            construction_alias_found: false,
            checkpoint_base_name: DEFAULT_CHECKPOINT_BASE.to_owned(),
            checkpoint_frequency: DEFAULT_CHECKPOINT_FREQUENCY,
        }
    }

    /// Classify a target address against the alias set.
    ///
    /// Walks from the root matching whole edges; a partial edge match is
    /// not a hit and the scan moves on to siblings. Reaching a leaf whose
    /// edge fully matches yields the covering prefix.
    pub fn lookup(&self, addr: &[u8; 16]) -> Label {
        let mut current = &self.root;
        let mut i: u8 = 0;
        while i < ADDR_BITS {
            let mut matched: Option<&Node> = None;
            for child in &current.children {
                if child.start_prefix != i {
                    panic!(
                        "radix invariant violated: child start prefix {} at cursor {}",
                        child.start_prefix, i
                    );
                }
                let m = child.matching_bits(addr, i, child.end_prefix);
                if m == child.length && child.length > 0 {
                    matched = Some(child);
                    break;
                }
            }
            match matched {
                None => return Label::miss(),
                Some(c) if c.is_leaf => return Label::hit(&c.value, c.end_prefix),
                Some(c) => {
                    i = c.end_prefix;
                    current = c;
                }
            }
        }
        Label::miss()
    }

    /// Insert an aliased prefix.
    ///
    /// Idempotent with respect to the observed alias set: a prefix already
    /// implied by an existing leaf is a no-op, and a prefix covering
    /// existing leaves replaces the covered subtree with a single leaf.
    pub fn insert(&mut self, prefix: &Prefix) {
        let addr = prefix.octets();
        let ip_end = prefix.prefix_len();
        let effect = if self.root.is_leaf {
            // Empty tree: hang the first leaf off the root.
            self.root.children.push(Node::leaf(0, ip_end, addr));
            self.root.is_leaf = false;
            InsertEffect::CHANGED
        } else {
            Self::insert_at(&mut self.root, &addr, ip_end)
        };
        self.changed |= effect.changed;
        self.construction_alias_found |= effect.alias_found;
    }

    fn insert_at(root: &mut Node, addr: &[u8; 16], ip_end: u8) -> InsertEffect {
        let mut current = root;
        let mut i: u8 = 0;
        while i < ip_end {
            // Commit to the first child sharing at least one bit with the
            // insert; siblings disagree on their first bit, so at most one
            // can qualify.
            let mut found: Option<(usize, u8)> = None;
            for (j, child) in current.children.iter().enumerate() {
                if child.start_prefix != i {
                    panic!(
                        "radix invariant violated: child start prefix {} at cursor {}",
                        child.start_prefix, i
                    );
                }
                let limit = child.end_prefix.min(ip_end);
                let m = child.matching_bits(addr, i, limit);
                if m > 0 {
                    found = Some((j, m));
                    break;
                }
            }

            let Some((j, m)) = found else {
                // No child shares a bit: append a fresh leaf for the rest
                // of the inserted prefix.
                current.children.push(Node::leaf(i, ip_end, *addr));
                current.is_leaf = false;
                return InsertEffect::CHANGED;
            };

            let child_end = current.children[j].end_prefix;
            let child_is_leaf = current.children[j].is_leaf;

            if i + m < ip_end {
                // The insert extends beyond the matched bits.
                if i + m == child_end {
                    if child_is_leaf {
                        // A shorter existing leaf already covers the insert.
                        return InsertEffect::NONE;
                    }
                    i = child_end;
                    current = &mut current.children[j];
                    continue;
                }
                if child_is_leaf {
                    if child_end == ip_end && ip_end - (i + m) == 1 {
                        // The old leaf and the insert differ only in their
                        // final bit: collapse both into the common /n-1
                        // prefix with the diverging bit forced to zero.
                        let old = &current.children[j];
                        let mut value = old.value;
                        clear_addr_bit(&mut value, i + m);
                        let collapsed = Node::leaf(old.start_prefix, i + m, value);
                        current.children[j] = collapsed;
                        return InsertEffect::NEW_ALIAS;
                    }
                    // Split the leaf: an internal node over the common
                    // bits adopts the old remainder and the new entry.
                    let old = std::mem::replace(&mut current.children[j], Node::leaf(0, 0, [0; 16]));
                    let mut internal = Node::internal(i, i + m, old.value);
                    internal
                        .children
                        .push(Node::leaf(i + m, old.end_prefix, old.value));
                    internal.children.push(Node::leaf(i + m, ip_end, *addr));
                    current.children[j] = internal;
                    return InsertEffect::CHANGED;
                }
                // Split an internal edge: the new leaf takes the residual
                // insert, the old child is demoted past the split point.
                let mut demoted =
                    std::mem::replace(&mut current.children[j], Node::leaf(0, 0, [0; 16]));
                let mut internal = Node::internal(i, i + m, demoted.value);
                internal.children.push(Node::leaf(i + m, ip_end, *addr));
                demoted.start_prefix = i + m;
                demoted.length = demoted.end_prefix - (i + m);
                internal.children.push(demoted);
                current.children[j] = internal;
                return InsertEffect::CHANGED;
            }

            // The insert is fully consumed by the matched bits.
            if child_end != ip_end || !child_is_leaf {
                // Covering alias: the new prefix subsumes the matched
                // subtree. Replacing the edge drops the old subtree
                // depth-first.
                let start = current.children[j].start_prefix;
                current.children[j] = Node::leaf(start, ip_end, *addr);
                return InsertEffect::NEW_ALIAS;
            }
            // Identical leaf already present.
            return InsertEffect::NONE;
        }
        InsertEffect::NONE
    }

    /// Write every leaf as `address/len`, one per line in DFS child
    /// order, to `<base>-<RFC3339 timestamp>`. Clears the change flags
    /// only once the file is fully written.
    pub fn export_checkpoint(&mut self, when: DateTime<Utc>) -> io::Result<PathBuf> {
        let path = PathBuf::from(format!(
            "{}-{}",
            self.checkpoint_base_name,
            when.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        let mut buf = BufWriter::new(File::create(&path)?);
        if !self.root.is_leaf {
            Self::export_dfs(&self.root, &mut buf)?;
        }
        buf.flush()?;
        debug!(path = %path.display(), "checkpoint written");
        self.changed = false;
        self.construction_alias_found = false;
        Ok(path)
    }

    fn export_dfs(node: &Node, buf: &mut BufWriter<File>) -> io::Result<()> {
        if node.is_leaf {
            writeln!(
                buf,
                "{}/{}",
                Ipv6Addr::from(node.value),
                node.end_prefix
            )?;
        } else {
            for child in &node.children {
                Self::export_dfs(child, buf)?;
            }
        }
        Ok(())
    }

    /// Whether the tree changed since the last checkpoint export.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Force the change flag, e.g. to discard construction-time churn.
    pub fn set_changed(&mut self, changed: bool) {
        self.changed = changed;
    }

    /// Whether an insert since the last export collapsed existing leaves
    /// into a covering alias.
    pub fn construction_alias_found(&self) -> bool {
        self.construction_alias_found
    }

    /// Filename prefix for checkpoint exports.
    pub fn checkpoint_base_name(&self) -> &str {
        &self.checkpoint_base_name
    }

    /// Set the filename prefix for checkpoint exports.
    pub fn set_checkpoint_base_name(&mut self, base: impl Into<String>) {
        self.checkpoint_base_name = base.into();
    }

    /// How often the host should poll [`Self::is_changed`], in seconds.
    pub fn checkpoint_frequency(&self) -> f32 {
        self.checkpoint_frequency
    }

    /// Set the checkpoint poll interval in seconds.
    pub fn set_checkpoint_frequency(&mut self, seconds: f32) {
        self.checkpoint_frequency = seconds;
    }

    /// BFS totals: `(nodes, leaves)`, the root included.
    pub fn node_counts(&self) -> (usize, usize) {
        let mut nodes = 0;
        let mut leaves = 0;
        let mut queue = VecDeque::from([&self.root]);
        while let Some(node) = queue.pop_front() {
            nodes += 1;
            if node.is_leaf {
                leaves += 1;
            }
            queue.extend(node.children.iter());
        }
        (nodes, leaves)
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &Node {
        &self.root
    }

    #[cfg(test)]
    pub(crate) fn clone_tree(&self) -> Node {
        self.root.clone()
    }
}

impl Default for RadixTrie {
    fn default() -> Self {
        Self::new()
    }
}
