//! Per-depth fanout statistics for the array-mapped trie.
//!
//! One [`LevelStats`] per bit depth, one table per checkpoint. The
//! arithmetic matches what the exported rows report: `avg` is always
//! `total_children / total_nodes` at the time it is computed.

use std::collections::BTreeMap;

/// Sentinel below any real child count (fanout is at most 16).
pub(crate) const MIN_SENTINEL: f64 = 17.0;
/// Sentinel above no real child count.
pub(crate) const MAX_SENTINEL: f64 = -1.0;
/// Sentinel for an extremum whose nibble has not been observed.
pub(crate) const VALUE_SENTINEL: f64 = -1.0;

/// Fanout statistics for one bit depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelStats {
    /// Nodes seen at this depth.
    pub total_nodes: f64,
    /// Children hanging off nodes at this depth.
    pub total_children: f64,
    /// `total_children / total_nodes`.
    pub avg: f64,
    /// Smallest per-node child count.
    pub min: f64,
    /// Largest per-node child count.
    pub max: f64,
    /// Nibble of the node holding the minimum.
    pub min_value: f64,
    /// Nibble of the node holding the maximum.
    pub max_value: f64,
}

impl LevelStats {
    pub(crate) fn empty() -> Self {
        Self {
            total_nodes: 0.0,
            total_children: 0.0,
            avg: 0.0,
            min: MIN_SENTINEL,
            max: MAX_SENTINEL,
            min_value: VALUE_SENTINEL,
            max_value: VALUE_SENTINEL,
        }
    }
}

/// Statistics tables keyed by bit depth, one per checkpoint.
pub(crate) type LevelTable = BTreeMap<u8, LevelStats>;

/// A node at depth `prefix` with nibble `value` gained a child and now
/// has `num_children` of them.
pub(crate) fn record_child_added(
    table: &mut LevelTable,
    prefix: u8,
    value: u8,
    num_children: usize,
) {
    let n = num_children as f64;
    let v = f64::from(value);
    match table.get_mut(&prefix) {
        Some(level) => {
            level.total_children += 1.0;
            level.avg = level.total_children / level.total_nodes;
            if level.total_nodes == 1.0 {
                level.max = n;
                level.max_value = v;
                level.min = n;
                level.min_value = v;
            } else {
                if level.max < n {
                    level.max = n;
                    level.max_value = v;
                }
                if level.min > n {
                    level.min = n;
                    level.min_value = v;
                }
            }
        }
        None => {
            table.insert(
                prefix,
                LevelStats {
                    total_nodes: 1.0,
                    total_children: n,
                    avg: n,
                    min: n,
                    max: n,
                    min_value: v,
                    max_value: v,
                },
            );
        }
    }
}

/// A fresh childless node with nibble `value` appeared at depth `prefix`.
pub(crate) fn record_node_created(table: &mut LevelTable, prefix: u8, value: u8) {
    let v = f64::from(value);
    match table.get_mut(&prefix) {
        Some(level) => {
            level.total_nodes += 1.0;
            level.avg = level.total_children / level.total_nodes;
            if level.max < 0.0 {
                level.max = 0.0;
                level.max_value = v;
            }
            if level.min > 0.0 {
                level.min = 0.0;
                level.min_value = v;
            }
        }
        None => {
            table.insert(
                prefix,
                LevelStats {
                    total_nodes: 1.0,
                    total_children: 0.0,
                    avg: 0.0,
                    min: 0.0,
                    max: 0.0,
                    min_value: v,
                    max_value: v,
                },
            );
        }
    }
}
