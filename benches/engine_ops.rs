//! Benchmarks for the radix and AMT engines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::net::Ipv6Addr;

use aliasmap::prefix::Prefix;
use aliasmap::radix::RadixTrie;
use aliasmap::amt::Amt;

/// Deterministic pseudo-random 128-bit values (splitmix-style), so runs
/// are comparable without an RNG dependency.
fn scramble(i: u64) -> u128 {
    let mut z = i.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (u128::from(z) << 64) | u128::from(z.rotate_left(17))
}

fn generate_prefixes(n: usize) -> Vec<Prefix> {
    const LENS: [u8; 4] = [32, 48, 64, 112];
    (0..n)
        .map(|i| {
            let bits = scramble(i as u64);
            Prefix::new(Ipv6Addr::from(bits), LENS[i % LENS.len()])
        })
        .collect()
}

fn generate_addrs(n: usize) -> Vec<[u8; 16]> {
    (0..n)
        .map(|i| Ipv6Addr::from(scramble(i as u64 ^ 0x5555)).octets())
        .collect()
}

fn bench_radix_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("radix_insert");
    for size in [1_000, 10_000, 100_000] {
        let prefixes = generate_prefixes(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &prefixes, |b, prefixes| {
            b.iter(|| {
                let mut trie = RadixTrie::new();
                for prefix in prefixes {
                    trie.insert(prefix);
                }
                black_box(trie)
            });
        });
    }
    group.finish();
}

fn bench_radix_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("radix_lookup");
    for size in [1_000, 10_000, 100_000] {
        let mut trie = RadixTrie::new();
        for prefix in generate_prefixes(size) {
            trie.insert(&prefix);
        }
        let addrs = generate_addrs(10_000);
        group.bench_with_input(BenchmarkId::from_parameter(size), &addrs, |b, addrs| {
            b.iter(|| {
                let mut hits = 0usize;
                for addr in addrs {
                    if trie.lookup(addr).aliased {
                        hits += 1;
                    }
                }
                black_box(hits)
            });
        });
    }
    group.finish();
}

fn bench_amt_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("amt_insert");
    for size in [1_000, 10_000, 100_000] {
        let addrs = generate_addrs(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &addrs, |b, addrs| {
            b.iter(|| {
                let mut amt = Amt::new();
                for addr in addrs {
                    amt.insert(addr);
                }
                black_box(amt)
            });
        });
    }
    group.finish();
}

fn bench_amt_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("amt_find");
    for size in [1_000, 10_000, 100_000] {
        let addrs = generate_addrs(size);
        let mut amt = Amt::new();
        for addr in &addrs {
            amt.insert(addr);
        }
        group.bench_with_input(BenchmarkId::from_parameter(size), &addrs, |b, addrs| {
            b.iter(|| {
                let mut found = 0usize;
                for addr in addrs {
                    if amt.find(addr) {
                        found += 1;
                    }
                }
                black_box(found)
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_radix_insert,
    bench_radix_lookup,
    bench_amt_insert,
    bench_amt_find
);
criterion_main!(benches);
