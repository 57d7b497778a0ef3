// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the identifier registry hot paths: handle
// allocation, strong resolution of event sources, and weak discovery of
// event arguments.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use chromelink_core::types::InstanceDescriptor;
use chromelink_registry::{HostObject, InstanceRegistry};

struct BenchView;

impl HostObject for BenchView {
    fn describe(&self) -> InstanceDescriptor {
        InstanceDescriptor::WebView
    }
}

/// Allocate a fresh strong entry per iteration.
fn bench_register_host_created(c: &mut Criterion) {
    let registry = InstanceRegistry::new(65_536);
    let view = Arc::new(BenchView);

    c.bench_function("register_host_created", |b| {
        b.iter(|| {
            let handle = registry
                .register_host_created(black_box(&view))
                .expect("register failed");
            black_box(handle);
        });
    });
}

/// Resolve an event source among 10 000 registered instances. This runs on
/// every forwarded event.
fn bench_resolve_strong(c: &mut Criterion) {
    let registry = InstanceRegistry::new(65_536);
    let views: Vec<_> = (0..10_000).map(|_| Arc::new(BenchView)).collect();
    for view in &views {
        registry.register_host_created(view).expect("register failed");
    }
    let target = &views[views.len() / 2];

    c.bench_function("resolve_strong (10k entries)", |b| {
        b.iter(|| {
            let handle = registry.resolve_strong(black_box(target)).expect("resolve failed");
            black_box(handle);
        });
    });
}

/// Weak lookup of an already-discovered argument (the common case for a
/// web view passed to every chrome callback).
fn bench_resolve_or_register_weak_hit(c: &mut Criterion) {
    let registry = InstanceRegistry::new(65_536);
    let view = Arc::new(BenchView);
    registry
        .resolve_or_register_weak(&view)
        .expect("initial weak registration failed");

    c.bench_function("resolve_or_register_weak (hit)", |b| {
        b.iter(|| {
            let handle = registry
                .resolve_or_register_weak(black_box(&view))
                .expect("resolve failed");
            black_box(handle);
        });
    });
}

criterion_group!(
    benches,
    bench_register_host_created,
    bench_resolve_strong,
    bench_resolve_or_register_weak_hit,
);
criterion_main!(benches);
