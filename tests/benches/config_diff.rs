//! # Config Diff Benchmarks
//!
//! Cost of `compute_update` on channels with many organizations.
//!
//! | Case | Expectation |
//! |------|-------------|
//! | shared snapshot | skipped via `Arc::ptr_eq`, O(1) |
//! | decoded copy, no change | full walk, nothing written |
//! | one leaf changed | full walk, one write entry |
//! | every org changed | full walk, write entry per org |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_channel_config::domain::names;
use qc_channel_config::{
    compute_update, ConfigGroup, ConfigPath, ConfigPolicy, ConfigTree, ConfigValue, Policy,
    ValueAddress,
};
use shared_types::{IdentityRole, NamespaceId};
use std::time::Duration;

const ORG_COUNTS: [usize; 3] = [10, 100, 1_000];

fn org(name: &str) -> ConfigGroup {
    ConfigGroup::new(names::ADMINS_POLICY)
        .with_value("MSP", ConfigValue::new(vec![0xAB; 512], names::ADMINS_POLICY))
        .with_value(
            "AnchorPeers",
            ConfigValue::new(format!("{}.peer0:7051", name).into_bytes(), names::ADMINS_POLICY),
        )
        .with_policy(
            names::ADMINS_POLICY,
            ConfigPolicy::new(Policy::one_of(name, IdentityRole::Admin), names::ADMINS_POLICY),
        )
        .with_policy(
            names::READERS_POLICY,
            ConfigPolicy::new(Policy::one_of(name, IdentityRole::Member), names::ADMINS_POLICY),
        )
}

fn channel(orgs: usize) -> ConfigTree {
    let application = (0..orgs).fold(ConfigGroup::new(names::ADMINS_POLICY), |group, i| {
        let name = format!("Org{}", i);
        group.with_group(name.clone(), org(&name))
    });
    let root = ConfigGroup::new(names::ADMINS_POLICY).with_group(names::APPLICATION_GROUP, application);
    ConfigTree::new(NamespaceId::new("benchchannel").unwrap(), root)
}

fn anchor_peers(org: usize) -> ValueAddress {
    ValueAddress::new(
        ConfigPath::new([names::APPLICATION_GROUP.to_string(), format!("Org{}", org)]),
        "AnchorPeers",
    )
}

fn bench_compute_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("config-diff");
    group.measurement_time(Duration::from_secs(5));

    for orgs in ORG_COUNTS {
        let current = channel(orgs);
        // Decoding yields a tree with no subtrees shared with `current`.
        let decoded = ConfigTree::from_bytes(&current.to_bytes().unwrap()).unwrap();

        let mut one_changed = current.clone();
        one_changed.value_mut(&anchor_peers(orgs / 2)).unwrap().value = b"moved:7051".to_vec();

        let mut all_changed = current.clone();
        for i in 0..orgs {
            all_changed.value_mut(&anchor_peers(i)).unwrap().value = b"moved:7051".to_vec();
        }

        group.throughput(Throughput::Elements(orgs as u64));
        group.bench_with_input(BenchmarkId::new("shared_snapshot", orgs), &current, |b, tree| {
            b.iter(|| black_box(compute_update(tree, &tree.clone()).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("decoded_no_change", orgs), &decoded, |b, tree| {
            b.iter(|| black_box(compute_update(&current, tree).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("one_leaf", orgs), &one_changed, |b, tree| {
            b.iter(|| black_box(compute_update(&current, tree).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("every_org", orgs), &all_changed, |b, tree| {
            b.iter(|| black_box(compute_update(&current, tree).unwrap()))
        });
    }

    group.finish();
}

fn bench_update_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("config-update-encoding");

    let current = channel(1_000);
    let mut desired = current.clone();
    for i in (0..1_000).step_by(10) {
        desired.value_mut(&anchor_peers(i)).unwrap().value = b"moved:7051".to_vec();
    }
    let update = compute_update(&current, &desired).unwrap();
    let bytes = update.to_bytes().unwrap();

    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("encode_100_changes", |b| {
        b.iter(|| black_box(update.to_bytes().unwrap()))
    });
    group.bench_function("decode_100_changes", |b| {
        b.iter(|| black_box(qc_channel_config::ConfigUpdate::from_bytes(&bytes).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_compute_update, bench_update_encoding);
criterion_main!(benches);
