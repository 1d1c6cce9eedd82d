// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Benchmarks for the stock ledger.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Single-threaded movements against the in-memory store
//! - Contended movements from rayon worker threads
//! - Report rendering over growing histories

use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use inventory_ledger::{
    HistoryEntry, Ledger, MemoryStore, MovementType, ProductKey, ProductRecord, report,
};
use rayon::prelude::*;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn ledger_with(products: usize, quantity: u64) -> Ledger<MemoryStore> {
    let ledger = Ledger::new(MemoryStore::new());
    for i in 0..products {
        ledger.add_product(&format!("Product {i}"), quantity).unwrap();
    }
    ledger
}

/// Alternating IN/OUT history for one product, one minute apart, stored
/// newest first so the report has to sort it.
fn make_history(key: &ProductKey, count: usize) -> (ProductRecord, Vec<HistoryEntry>) {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
    let mut record = ProductRecord::new(0);
    let mut history = Vec::with_capacity(count);

    for i in 0..count {
        let at = start + Duration::minutes(i as i64);
        let (kind, quantity) = if i % 2 == 0 {
            record.receive(10).unwrap();
            (MovementType::In, 10)
        } else {
            record.consume(5).unwrap();
            (MovementType::Out, 5)
        };
        history.push(HistoryEntry::new(kind, key.clone(), quantity, at));
    }

    history.reverse();
    (record, history)
}

// =============================================================================
// Single-Threaded Benchmarks
// =============================================================================

fn bench_single_stock_in(c: &mut Criterion) {
    c.bench_function("single_stock_in", |b| {
        let ledger = ledger_with(1, 0);
        b.iter(|| {
            ledger.stock_in(black_box("product 0"), 10).unwrap();
        })
    });
}

fn bench_single_stock_out(c: &mut Criterion) {
    c.bench_function("single_stock_out", |b| {
        let ledger = ledger_with(1, 0);
        b.iter(|| {
            ledger.stock_in("Product 0", 10).unwrap();
            ledger.stock_out(black_box("PRODUCT 0"), 5).unwrap();
        })
    });
}

fn bench_movement_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("movement_throughput");

    for count in [100, 1_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let ledger = ledger_with(10, 100);
                for i in 0..count {
                    let name = format!("product {}", i % 10);
                    if i % 2 == 0 {
                        ledger.stock_in(&name, 10).unwrap();
                    } else {
                        let _ = ledger.stock_out(&name, 5);
                    }
                }
                black_box(&ledger);
            })
        });
    }
    group.finish();
}

// =============================================================================
// Multi-Threaded Benchmarks
// =============================================================================

fn bench_parallel_movements_same_product(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_movements_same_product");

    for count in [100, 1_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let ledger = Arc::new(ledger_with(1, 1_000));
                (0..count).into_par_iter().for_each(|i| {
                    if i % 2 == 0 {
                        ledger.stock_in("Product 0", 3).unwrap();
                    } else {
                        let _ = ledger.stock_out("product 0", 2);
                    }
                });
                black_box(&ledger);
            })
        });
    }
    group.finish();
}

fn bench_parallel_movements_different_products(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_movements_different_products");

    for products in [4, 16].iter() {
        group.throughput(Throughput::Elements(1_000));
        group.bench_with_input(
            BenchmarkId::from_parameter(products),
            products,
            |b, &products| {
                b.iter(|| {
                    let ledger = Arc::new(ledger_with(products, 1_000));
                    (0..1_000usize).into_par_iter().for_each(|i| {
                        let name = format!("Product {}", i % products);
                        ledger.stock_in(&name, 1).unwrap();
                    });
                    black_box(&ledger);
                })
            },
        );
    }
    group.finish();
}

// =============================================================================
// Report Benchmarks
// =============================================================================

fn bench_report_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_render");
    let key = ProductKey::from("Olive Oil");
    let generated_at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    for count in [100, 1_000, 10_000].iter() {
        let (record, history) = make_history(&key, *count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let rendered = report::render(&key, &record, history.clone(), None, generated_at);
                black_box(rendered);
            })
        });
    }
    group.finish();
}

// =============================================================================
// Criterion Groups
// =============================================================================

criterion_group!(
    single_threaded,
    bench_single_stock_in,
    bench_single_stock_out,
    bench_movement_throughput,
);

criterion_group!(
    multi_threaded,
    bench_parallel_movements_same_product,
    bench_parallel_movements_different_products,
);

criterion_group!(reports, bench_report_render,);

criterion_main!(single_threaded, multi_threaded, reports);
