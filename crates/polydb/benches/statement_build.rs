use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use polydb::{Bounds, Dialect, Expression, Record, TableTarget, build_insert, paginate, stmt};

/// `n` rows of three columns, one of them a UUID fragment shared by all rows.
fn build_rows(n: usize) -> Vec<Record> {
    let guid = Expression::new(Dialect::MySql).set_uuid("3f2504e0-4f89-11d3-9a0c-0305e82c3301");
    (0..n)
        .map(|i| {
            Record::new()
                .set("name", format!("user{i}"))
                .set("age", i as i64)
                .set("guid", guid.clone())
        })
        .collect()
}

fn bench_build_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_build/insert");
    let target = TableTarget::from("users");

    for n in [1, 10, 100, 500] {
        let rows = build_rows(n);
        for dialect in [Dialect::MySql, Dialect::Oracle] {
            group.bench_with_input(
                BenchmarkId::new(dialect.name(), n),
                &rows,
                |b, rows| {
                    b.iter(|| black_box(build_insert(dialect, &target, rows)));
                },
            );
        }
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_build/validate");

    for n in [5, 50, 500] {
        let exp = Expression::new(Dialect::MySql);
        let mut q = stmt("SELECT * FROM t WHERE a = :a AND id").bind(":a", 1);
        if let Ok(q) = q.push_fragment(&exp.in_list(0..n as i64)) {
            q.push(" AND note <> ':literal'");
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.validate(Dialect::MySql)));
        });
    }

    group.finish();
}

fn bench_paginate(c: &mut Criterion) {
    let sql = "SELECT id, name FROM users WHERE status = :status ORDER BY id";
    let bounds = Bounds {
        offset: 1000,
        length: 50,
    };

    c.bench_function("statement_build/paginate_mysql", |b| {
        b.iter(|| black_box(paginate(Dialect::MySql, sql, bounds)));
    });
    c.bench_function("statement_build/paginate_oracle", |b| {
        b.iter(|| black_box(paginate(Dialect::Oracle, sql, bounds)));
    });
}

criterion_group!(benches, bench_build_insert, bench_validate, bench_paginate);
criterion_main!(benches);
