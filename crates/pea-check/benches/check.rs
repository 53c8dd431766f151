//! Checking and codec throughput.

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use pea_check::{Config, Session, Store, codec};

/// A module of `n` generic record types, each instantiated by a value and
/// read through a method.
fn generated_source(n: usize) -> String {
    let mut src = String::new();
    for i in 0..n {
        src.push_str(&format!(
            "type (T) Rec{i} {{ a: T b: String }}\n\
             meth (T) Rec{i} [first ^T | ^self a]\n\
             val rec{i} := [{{Int Rec{i} | {i}, \"x\"}}]\n\
             func [get{i} ^Int | ^rec{i} first + 1]\n"
        ));
    }
    src
}

fn session() -> Session {
    Session::new(Config::default()).expect("universal module checks")
}

fn bench_universe(c: &mut Criterion) {
    c.bench_function("universe", |b| b.iter(session));
}

fn bench_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("check");
    for n in [10, 100, 1000] {
        let source = generated_source(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &source, |b, source| {
            b.iter_batched(
                session,
                |mut session| session.check_source("bench", black_box(source)).unwrap(),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    for n in [10, 100, 1000] {
        let mut session = session();
        let module = session.check_source("bench", &generated_source(n)).unwrap();
        let bytes = codec::export(session.store(), &module).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("export", n), &module, |b, module| {
            b.iter(|| codec::export(session.store(), black_box(module)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("import", n), &bytes, |b, bytes| {
            b.iter(|| codec::import(&mut Store::new(), black_box(bytes)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_universe, bench_check, bench_codec);
criterion_main!(benches);
