// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Benchmarks for transaction operations.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use strontium_mvcc::storage::{ColumnId, DataTable, Delta, TableId, TupleSlot, Value};
use strontium_mvcc::txn::{TransactionManager, TransactionManagerConfig};
use strontium_mvcc::{GarbageCollector, UndoArena};

const NUM_TUPLES: usize = 1024;

fn create_test_manager(gc_enabled: bool) -> Arc<TransactionManager> {
    Arc::new(TransactionManager::new(
        Arc::new(UndoArena::new()),
        TransactionManagerConfig::default().with_gc(gc_enabled),
    ))
}

fn create_test_table() -> (Arc<DataTable>, Vec<TupleSlot>) {
    let table = Arc::new(DataTable::new(TableId(1), 2));
    let slots = (0..NUM_TUPLES)
        .map(|i| {
            table
                .insert(vec![Value::new(vec![0u8; 100]), Value::from(format!("{i}").as_str())])
                .unwrap()
        })
        .collect();
    (table, slots)
}

fn payload() -> Delta {
    Delta::new().with(ColumnId(0), Value::new(vec![1u8; 100]))
}

fn bench_begin_commit(c: &mut Criterion) {
    let mgr = create_test_manager(false);

    c.bench_function("txn::begin_commit_empty", |b| {
        b.iter(|| {
            let txn = mgr.begin();
            black_box(mgr.commit(&txn))
        })
    });
}

fn bench_update_abort(c: &mut Criterion) {
    let mgr = create_test_manager(false);
    let (table, slots) = create_test_table();
    let delta = payload();

    c.bench_function("txn::update_abort", |b| {
        b.iter_batched(
            || slots[rand::random::<usize>() % NUM_TUPLES],
            |slot| {
                let txn = mgr.begin();
                table.update(&txn, slot, &delta).unwrap();
                mgr.abort(&txn);
                black_box(txn)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_commit_10_tuples(c: &mut Criterion) {
    let mgr = create_test_manager(true);
    let mut gc = GarbageCollector::new(Arc::clone(&mgr));
    let (table, slots) = create_test_table();
    let delta = payload();

    let mut group = c.benchmark_group("txn");
    group.throughput(Throughput::Elements(10));

    group.bench_function("commit_10_tuples", |b| {
        b.iter_batched(
            || {
                gc.perform_gc();
                let base = rand::random::<usize>() % (NUM_TUPLES - 10);
                let txn = mgr.begin();
                for slot in &slots[base..base + 10] {
                    table.update(&txn, *slot, &delta).unwrap();
                }
                txn
            },
            |txn| black_box(mgr.commit(&txn)),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_select_through_chain(c: &mut Criterion) {
    let mgr = create_test_manager(false);
    let (table, slots) = create_test_table();
    let slot = slots[0];

    // The reader starts first, so it must undo every later commit.
    let reader = mgr.begin();
    for i in 0..16u8 {
        let txn = mgr.begin();
        table
            .update(&txn, slot, &Delta::new().with(ColumnId(0), Value::new(vec![i; 100])))
            .unwrap();
        mgr.commit(&txn);
    }

    c.bench_function("storage::select_chain_16", |b| {
        b.iter(|| black_box(table.select(&reader, slot).unwrap()))
    });
}

fn bench_oldest_start_time(c: &mut Criterion) {
    let mgr = create_test_manager(false);
    let _running: Vec<_> = (0..100).map(|_| mgr.begin()).collect();

    c.bench_function("txn::oldest_start_time_100_running", |b| {
        b.iter(|| black_box(mgr.oldest_transaction_start_time()))
    });
}

fn bench_concurrent_begin_commit(c: &mut Criterion) {
    let mgr = create_test_manager(false);

    let mut group = c.benchmark_group("txn");
    group.throughput(Throughput::Elements(4 * 1000));

    group.bench_function("begin_commit_4_threads", |b| {
        b.iter(|| {
            std::thread::scope(|s| {
                for _ in 0..4 {
                    s.spawn(|| {
                        for _ in 0..1000 {
                            let txn = mgr.begin();
                            mgr.commit(&txn);
                        }
                    });
                }
            })
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_begin_commit,
    bench_update_abort,
    bench_commit_10_tuples,
    bench_select_through_chain,
    bench_oldest_start_time,
    bench_concurrent_begin_commit,
);
criterion_main!(benches);
