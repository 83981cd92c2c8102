use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgrecord::{ClauseBuilder, Fields, build_insert_clause, build_where_clause};

/// `n` columns `col0 .. col{n-1}` with integer values.
fn wide_fields(n: usize) -> Fields {
    (0..n).map(|i| (format!("col{i}"), i as i64)).collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("clause_builder/insert");

    for n in [1, 5, 10, 50, 100] {
        let fields = wide_fields(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &fields, |b, fields| {
            b.iter(|| {
                let clause = build_insert_clause(fields).unwrap();
                black_box((clause.column_list(), clause.placeholder_list()));
            });
        });
    }

    group.finish();
}

fn bench_where(c: &mut Criterion) {
    let mut group = c.benchmark_group("clause_builder/where");

    for n in [0, 1, 5, 10, 50] {
        let fields = wide_fields(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &fields, |b, fields| {
            b.iter(|| black_box(build_where_clause(fields)));
        });
    }

    group.finish();
}

fn bench_update_statement(c: &mut Criterion) {
    let mut group = c.benchmark_group("clause_builder/update_statement");

    for n in [1, 5, 10, 50] {
        let fields = wide_fields(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &fields, |b, fields| {
            b.iter(|| {
                let mut builder = ClauseBuilder::new();
                let set = builder.set(fields).unwrap();
                let sql = format!("UPDATE t SET {} WHERE id = {}", set.sql, builder.placeholder());
                black_box((sql, set.values));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_where, bench_update_statement);
criterion_main!(benches);
