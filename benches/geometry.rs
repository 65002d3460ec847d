//! Benchmarks for viewport math and grid operations.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(
    clippy::expect_used,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use vgrid::{Column, GeometryTable, Grid, GridConfig};

fn rows(count: usize) -> Vec<serde_json::Value> {
    (0..count)
        .map(|i| json!({"id": i.to_string(), "value": i as f64}))
        .collect()
}

/// Pixel to index lookups on tables of growing size
fn bench_index_at_offset(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_at_offset");
    for size in [1_000usize, 100_000, 1_000_000] {
        let table = GeometryTable::uniform(size, 30.0);
        let total = table.total_size();
        group.bench_with_input(BenchmarkId::from_parameter(size), &table, |b, table| {
            b.iter(|| table.index_at_offset(black_box(total * 0.5)))
        });
    }
    group.finish();
}

/// Visible window at the middle of a large table
fn bench_visible_range(c: &mut Criterion) {
    let table = GeometryTable::uniform(1_000_000, 30.0).with_frozen(2, 1);
    c.bench_function("visible_range_1m", |b| {
        b.iter(|| table.visible_range(black_box(15_000_000.0), black_box(600.0)))
    });
}

/// Expanding a tree row near the top of a large table: splice plus the
/// suffix recompute on the next lookup
fn bench_splice(c: &mut Criterion) {
    let mut group = c.benchmark_group("splice");
    for size in [10_000usize, 100_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut table = GeometryTable::uniform(size, 30.0);
            b.iter(|| {
                table.splice(10, 0, [30.0; 50]);
                let total = table.total_size();
                table.splice(10, 50, []);
                black_box(total)
            })
        });
    }
    group.finish();
}

/// Laying out one frame of a 100k-row grid
fn bench_frame(c: &mut Criterion) {
    let config = GridConfig {
        row_key_field: Some("id".to_string()),
        ..GridConfig::default()
    };
    let mut grid = Grid::new(config).expect("valid config");
    grid.load_columns(vec![Column::new("value", "Value")])
        .expect("columns load");
    grid.load_data(&rows(100_000)).expect("data loads");

    c.bench_function("frame_100k", |b| {
        let mut y = 0.0;
        b.iter(|| {
            y = (y + 997.0) % 2_000_000.0;
            grid.scroll_y_to(y);
            black_box(grid.flush_frame())
        })
    });
}

criterion_group!(
    benches,
    bench_index_at_offset,
    bench_visible_range,
    bench_splice,
    bench_frame,
);

criterion_main!(benches);
