use criterion::{criterion_group, criterion_main, Criterion};
use spanprof::{Payload, PooledStack, Profiler, RecordStack};
use std::hint::black_box;

const NAMES: [&str; 8] = [
    "load", "parse", "lex", "resolve", "check", "lower", "emit", "link",
];

#[derive(Clone, Copy, Default)]
struct Pair(u64, u64);

impl Payload for Pair {
    const FIELDS: usize = 2;
}

pub fn criterion_benchmark(criterion: &mut Criterion) {
    let mut criterion = criterion.benchmark_group("span_overhead");

    // A warm profiler: names interned, pools at their high-water mark.
    let mut profiler: Profiler = Profiler::default();
    for name in NAMES {
        let handle = profiler.begin(name, None).unwrap();
        profiler.end(handle, None);
    }

    criterion.bench_function("begin_end_flat", |bencher| {
        bencher.iter(|| {
            let handle = profiler.begin(black_box("parse"), None).unwrap();
            profiler.end(handle, None)
        });
    });

    criterion.bench_function("begin_end_nested_8", |bencher| {
        bencher.iter(|| {
            let handles: [_; 8] = NAMES.map(|name| profiler.begin(black_box(name), None).unwrap());
            for handle in handles.into_iter().rev() {
                profiler.end(handle, None);
            }
        });
    });

    criterion.bench_function("begin_end_secondary_context", |bencher| {
        let mut id = 0;
        bencher.iter(|| {
            id += 1;
            let handle = profiler.begin("emit", Some(black_box(id))).unwrap();
            profiler.end(handle, Some(id))
        });
    });

    criterion.bench_function("leak_recovery", |bencher| {
        bencher.iter(|| {
            let outer = profiler.begin("load", None).unwrap();
            profiler.begin("parse", None).unwrap();
            profiler.begin("lex", None).unwrap();
            profiler.end(black_box(outer), None)
        });
    });

    criterion.bench_function("results_drain", |bencher| {
        bencher.iter(|| {
            for name in NAMES {
                let handle = profiler.begin(name, None).unwrap();
                profiler.end(handle, None);
            }
            black_box(profiler.results(None, None))
        });
    });

    criterion.bench_function("pooled_stack_push_delete", |bencher| {
        let mut stack = PooledStack::<Pair>::with_capacity(64);
        bencher.iter(|| {
            for key in 1..=64 {
                stack.push(black_box(key), Pair(key.into(), 0));
            }
            while stack.delete() > 0 {}
        });
    });

    criterion.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
