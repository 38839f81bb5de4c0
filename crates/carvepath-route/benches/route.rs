#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::hint::black_box;

use carvepath_route::{RouteConfig, SkeletonPoint, build_graph, construct_route, route};
use criterion::{Criterion, criterion_group, criterion_main};

/// Boundary walk of a comb: a horizontal spine with a vertical tooth every
/// `spacing` units. Every tooth root is a junction and every tooth tip a
/// terminal, so the walk scores and bridges at each tooth.
fn comb_skeleton(teeth: u32, spacing: u32, tooth_len: u32) -> Vec<SkeletonPoint> {
    let mut out = Vec::new();
    for i in 0..teeth {
        let x = i * spacing;
        out.push(SkeletonPoint::with_radius(f64::from(x), 0.0, 0.5));
        for k in 1..=tooth_len {
            out.push(SkeletonPoint::new(f64::from(x), f64::from(k)));
        }
        for k in (1..tooth_len).rev() {
            out.push(SkeletonPoint::new(f64::from(x), f64::from(k)));
        }
        out.push(SkeletonPoint::with_radius(f64::from(x), 0.0, 0.5));
        if i + 1 < teeth {
            for s in 1..spacing {
                out.push(SkeletonPoint::new(f64::from(x + s), 0.0));
            }
        }
    }
    let last = (teeth.saturating_sub(1)) * spacing;
    for x in (1..last).rev() {
        out.push(SkeletonPoint::new(f64::from(x), 0.0));
    }
    out
}

fn bench_build_graph(c: &mut Criterion) {
    let skeleton = comb_skeleton(200, 4, 20);
    let config = RouteConfig::default();

    c.bench_function("carvepath_build_graph_comb_200", |b| {
        b.iter(|| {
            let g = build_graph(&[black_box(skeleton.as_slice())], config.tolerance);
            black_box((g.site_count(), g.edge_count()));
        });
    });
}

fn bench_construct_route(c: &mut Criterion) {
    let skeleton = comb_skeleton(200, 4, 20);
    let graph = build_graph(&[skeleton.as_slice()], RouteConfig::DEFAULT_TOLERANCE);

    let mut group = c.benchmark_group("carvepath_construct_route_comb_200");
    group.bench_function("default_budget", |b| {
        b.iter(|| {
            let trace = construct_route(
                black_box(&graph),
                Some(RouteConfig::DEFAULT_SEARCH_BUDGET),
            );
            black_box(trace.sites.len());
        });
    });
    group.bench_function("discovery_order", |b| {
        b.iter(|| {
            let trace = construct_route(black_box(&graph), Some(1));
            black_box(trace.sites.len());
        });
    });
    group.finish();
}

fn bench_route_end_to_end(c: &mut Criterion) {
    let skeleton = comb_skeleton(50, 4, 20);
    let config = RouteConfig::default();

    c.bench_function("carvepath_route_comb_50", |b| {
        b.iter(|| {
            let r = route(black_box(&skeleton), black_box(&config)).unwrap();
            black_box(r.len());
        });
    });
}

criterion_group!(
    benches,
    bench_build_graph,
    bench_construct_route,
    bench_route_end_to_end
);
criterion_main!(benches);
