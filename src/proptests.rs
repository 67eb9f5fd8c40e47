//! Model-based property tests for both engines.
//!
//! The radix engine is checked against a naive range-set model: after any
//! interleaving of inserts, an address is aliased exactly when some
//! inserted prefix contains it, because splits, prunes, and sibling
//! collapses all preserve the covered set. The AMT is checked against a
//! plain `HashSet` of fixed-length keys.

use std::collections::HashSet;
use std::net::Ipv6Addr;

use proptest::prelude::*;
use proptest_derive::Arbitrary;

use crate::amt::{Amt, Node};
use crate::prefix::Prefix;
use crate::radix::RadixTrie;

/// Inserted prefixes as closed integer ranges.
#[derive(Default)]
struct RangeModel {
    ranges: Vec<(u128, u128)>,
}

impl RangeModel {
    fn insert(&mut self, prefix: &Prefix) {
        self.ranges.push((prefix.first(), prefix.last()));
    }

    fn covered(&self, addr: u128) -> bool {
        self.ranges.iter().any(|&(lo, hi)| lo <= addr && addr <= hi)
    }
}

#[derive(Arbitrary, Debug, Clone)]
enum RadixAction {
    Insert {
        bits: u128,
        #[proptest(strategy = "1..=128u8")]
        len: u8,
    },
    Lookup {
        bits: u128,
    },
    /// Probe the first address of a previously inserted prefix.
    ProbeInserted {
        seed: usize,
    },
}

#[derive(Arbitrary, Debug, Clone)]
enum AmtAction {
    Insert([u8; 4]),
    Find([u8; 4]),
    Remove([u8; 4]),
}

/// Bitmap/slot/depth invariants over the whole AMT.
fn check_amt_node(node: &Node) {
    assert_eq!(
        node.children.len(),
        node.bitmap().count_ones() as usize,
        "dense children must mirror the bitmap"
    );
    let mut last_value = None;
    for child in &node.children {
        assert!(
            node.bitmap() & (1 << child.value()) != 0,
            "child nibble missing from the bitmap"
        );
        if let Some(last) = last_value {
            assert!(child.value() > last, "children must stay in nibble order");
        }
        last_value = Some(child.value());
        assert_eq!(child.prefix(), node.prefix() + 4);
        check_amt_node(child);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn radix_lookup_agrees_with_the_range_model(
        actions in prop::collection::vec(any::<RadixAction>(), 1..64)
    ) {
        let mut trie = RadixTrie::new();
        let mut model = RangeModel::default();
        let mut inserted: Vec<Prefix> = Vec::new();

        for action in actions {
            match action {
                RadixAction::Insert { bits, len } => {
                    let prefix = Prefix::new(Ipv6Addr::from(bits), len);
                    trie.insert(&prefix);
                    model.insert(&prefix);
                    inserted.push(prefix);
                }
                RadixAction::Lookup { bits } => {
                    let addr = Ipv6Addr::from(bits).octets();
                    prop_assert_eq!(trie.lookup(&addr).aliased, model.covered(bits));
                }
                RadixAction::ProbeInserted { seed } => {
                    if inserted.is_empty() {
                        continue;
                    }
                    let prefix = inserted[seed % inserted.len()];
                    let addr = Ipv6Addr::from(prefix.first()).octets();
                    prop_assert!(trie.lookup(&addr).aliased);
                }
            }
        }
    }

    #[test]
    fn radix_insert_is_idempotent(bits in any::<u128>(), len in 1..=128u8) {
        let prefix = Prefix::new(Ipv6Addr::from(bits), len);
        let mut trie = RadixTrie::new();
        trie.insert(&prefix);
        trie.set_changed(false);
        let before = trie.clone_tree();

        trie.insert(&prefix);
        prop_assert!(!trie.is_changed());
        prop_assert!(trie.clone_tree() == before);
    }

    #[test]
    fn amt_agrees_with_a_set_model(
        actions in prop::collection::vec(any::<AmtAction>(), 1..64)
    ) {
        let mut amt = Amt::new();
        let mut model: HashSet<[u8; 4]> = HashSet::new();

        for action in actions {
            match action {
                AmtAction::Insert(key) => {
                    amt.insert(&key);
                    model.insert(key);
                }
                AmtAction::Find(key) => {
                    prop_assert_eq!(amt.find(&key), model.contains(&key));
                }
                AmtAction::Remove(key) => {
                    let removed = amt.remove_entry(&key);
                    prop_assert_eq!(removed > 0, model.remove(&key));
                }
            }
        }

        for key in &model {
            prop_assert!(amt.find(key));
        }
        check_amt_node(amt.get_path(&[]).pop().expect("root is always reachable"));
    }
}
