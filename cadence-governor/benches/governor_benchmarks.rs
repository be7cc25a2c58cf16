//! Benchmarks for governor operations
//!
//! Covers the admission hot path over the in-memory store:
//! - `can_send` on a warm campaign (no rollover to persist)
//! - `schedule_batch` for varying request sizes
//! - `reserve` + `commit` across many campaigns
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::{hint::black_box, sync::Arc};

use cadence_governor::{CampaignId, Governor, RateConfig};
use cadence_store::MemoryStore;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn governor() -> Governor {
    Governor::new(Arc::new(MemoryStore::new())).with_defaults(RateConfig {
        per_hour: u32::MAX,
        per_day: u32::MAX,
        min_delay_seconds: 0,
        warmup_enabled: false,
        ..RateConfig::default()
    })
}

fn bench_can_send(c: &mut Criterion) {
    let governor = governor();
    let campaign: CampaignId = "bench".parse().expect("valid id");
    governor.can_send(&campaign).expect("first access");

    c.bench_function("can_send", |b| {
        b.iter(|| governor.can_send(black_box(&campaign)).unwrap());
    });
}

fn bench_schedule_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_batch");
    let governor = governor();
    let campaign: CampaignId = "bench".parse().expect("valid id");

    for requested in [1_u32, 100, 10_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(requested),
            &requested,
            |b, &requested| {
                b.iter(|| {
                    governor
                        .schedule_batch(&campaign, black_box(requested))
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

fn bench_reserve_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("reserve_commit");

    for campaigns in [1_usize, 100] {
        let governor = governor();
        let ids: Vec<CampaignId> = (0..campaigns)
            .map(|i| format!("campaign-{i}").parse().expect("valid id"))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(campaigns), &ids, |b, ids| {
            let mut next = ids.iter().cycle();
            b.iter(|| {
                let id = next.next().unwrap();
                governor.reserve(id).unwrap().commit().unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_can_send,
    bench_schedule_batch,
    bench_reserve_commit
);
criterion_main!(benches);
