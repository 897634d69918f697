use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use scdb_core::codec::{OP_RETURN, SCOP_VERIFY, SCOP_VERSION, SCOP_VERSION_DELIM};
use scdb_core::primitives::{TestTx, TxOut};
use scdb_engine::SidechainDb;

fn verify_coinbase() -> TestTx {
    let script = vec![OP_RETURN, SCOP_VERSION, SCOP_VERSION_DELIM, SCOP_VERIFY];
    TestTx::new(TestTx::txid_from_label("cb")).with_outputs(vec![TxOut::new(script)])
}

fn seeded_db(blocks: u32) -> SidechainDb<TestTx> {
    let db = SidechainDb::mainnet();
    let wtxid = TestTx::txid_from_label("w");
    db.add_wtjoin(0, TestTx::new(wtxid)).unwrap();
    for _ in 0..blocks {
        db.apply_block_coinbase(&verify_coinbase()).unwrap();
    }
    db
}

fn bench_apply_block_coinbase(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_block_coinbase");
    for &depth in &[0u32, 100, 299] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter_batched(
                || seeded_db(depth),
                |db| black_box(db.apply_block_coinbase(&verify_coinbase()).unwrap()),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_check_work_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_work_score");
    for &depth in &[1u32, 100, 299] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let db = seeded_db(depth);
            let wtxid = TestTx::txid_from_label("w");
            b.iter(|| black_box(db.check_work_score(black_box(0), black_box(wtxid))));
        });
    }
    group.finish();
}

fn bench_create_state_script(c: &mut Criterion) {
    let db = seeded_db(150);
    c.bench_function("create_state_script_at_height_150", |b| {
        b.iter(|| black_box(db.create_state_script(black_box(150))));
    });
}

criterion_group!(
    benches,
    bench_apply_block_coinbase,
    bench_check_work_score,
    bench_create_state_script,
);
criterion_main!(benches);
