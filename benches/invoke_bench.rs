//! Interpreter benchmarks using Criterion.
//!
//! Run with: `cargo bench --bench invoke_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dynemit::{
    scenario::{self, DEFAULT_CONSTANT},
    CompiledRoutine, RoutineBuilder, Signature, Val, ValType,
};

// ── Routine builders ──────────────────────────────────────────────────────────

/// `depth` nested calls, each adding one to its callee's result.
fn call_chain(depth: usize) -> CompiledRoutine {
    let mut leaf = RoutineBuilder::with_signature("leaf", Signature::uniform(1, ValType::I32));
    leaf.append_load_parameter(0).unwrap();
    leaf.append_return().unwrap();
    let mut current = leaf.finalize().unwrap();

    for level in 0..depth {
        let mut b = RoutineBuilder::with_signature(
            format!("level{level}"),
            Signature::uniform(1, ValType::I32),
        );
        b.append_load_parameter(0).unwrap();
        b.append_call(&current).unwrap();
        b.append_load_constant(1i32).unwrap();
        b.append_add().unwrap();
        b.append_return().unwrap();
        current = b.finalize().unwrap();
    }
    current
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_scenario(c: &mut Criterion) {
    let pair = scenario::emit(DEFAULT_CONSTANT).unwrap();
    c.bench_function("scenario/method_a(5)", |b| {
        b.iter(|| black_box(pair.a.invoke(&[Val::I32(black_box(5))]).unwrap()))
    });
    c.bench_function("scenario/method_b(5,1000)", |b| {
        b.iter(|| {
            black_box(
                pair.b
                    .invoke(&[Val::I32(black_box(5)), Val::I32(black_box(1000))])
                    .unwrap(),
            )
        })
    });
}

fn bench_call_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("call_depth");
    for depth in [1usize, 8, 32] {
        let routine = call_chain(depth);
        group.bench_with_input(BenchmarkId::new("chain", depth), &depth, |b, _| {
            b.iter(|| black_box(routine.invoke(&[Val::I32(black_box(0))]).unwrap()))
        });
    }
    group.finish();
}

fn bench_emit(c: &mut Criterion) {
    c.bench_function("emit/scenario_pair", |b| {
        b.iter(|| black_box(scenario::emit(black_box(DEFAULT_CONSTANT)).unwrap()))
    });
}

criterion_group!(benches, bench_scenario, bench_call_depth, bench_emit);
criterion_main!(benches);
