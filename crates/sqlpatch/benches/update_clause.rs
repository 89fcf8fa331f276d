use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlpatch::{
    Column, Engine, FieldValue, MySql, OrmError, OrmResult, Postgres, Record, SqlType, TableDef,
    ToField, UpdatePolicy,
};

/// A record with `n` text columns plus an integer primary key.
struct Wide {
    table: &'static TableDef,
    values: Vec<String>,
}

impl Wide {
    fn new(n: usize) -> Self {
        let mut table =
            TableDef::new("t").column(Column::new("id").primary_key().sql_type(SqlType::BigInt));
        for i in 0..n {
            table = table.column(Column::new(format!("col{i}")));
        }
        let mut values = vec!["1".to_string()];
        values.extend((0..n).map(|i| format!("value {i}")));
        Self {
            table: Box::leak(Box::new(table)),
            values,
        }
    }
}

impl Record for Wide {
    fn table_def() -> &'static TableDef {
        unimplemented!("Wide carries its own catalog")
    }

    fn table(&self) -> &'static TableDef {
        self.table
    }

    fn field(&self, column: &Column) -> OrmResult<FieldValue<'_>> {
        let idx = self
            .table
            .columns()
            .iter()
            .position(|c| c.name == column.name)
            .ok_or_else(|| OrmError::field_access(&column.name, "no such field"))?;
        if idx == 0 {
            return Ok(FieldValue::Int(1));
        }
        Ok(self.values[idx].to_field())
    }
}

fn bench_update_clause(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_clause/build");
    let engine = Engine::new(MySql);

    for n in [1, 5, 10, 50, 100] {
        let record = Wide::new(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &record, |b, record| {
            b.iter(|| black_box(engine.update_clause(record, &UpdatePolicy::new())));
        });
    }

    group.finish();
}

fn bench_policy_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_clause/policy_filtering");
    let engine = Engine::new(MySql);

    for n in [10, 50, 100] {
        let record = Wide::new(n);
        let policy = UpdatePolicy::new()
            .cols((0..n).step_by(2).map(|i| format!("col{i}")))
            .omit(["col0"])
            .must_cols(["COL2"]);
        group.bench_with_input(BenchmarkId::from_parameter(n), &record, |b, record| {
            b.iter(|| black_box(engine.update_clause(record, &policy)));
        });
    }

    group.finish();
}

fn bench_render_statement(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_clause/to_statement");
    let engine = Engine::new(Postgres);

    for n in [1, 10, 100] {
        let record = Wide::new(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &record, |b, record| {
            b.iter(|| black_box(engine.update_statement(record, &UpdatePolicy::new())));
        });
    }

    group.finish();
}

fn bench_template_render(c: &mut Criterion) {
    let engine = Engine::new(MySql);
    engine
        .register_sql("bench", "q", "SELECT *\n  FROM t\n  WHERE  a = ?   AND b = ?")
        .unwrap();
    let params = serde_json::Value::Null;

    c.bench_function("template/build_sql", |b| {
        b.iter(|| black_box(engine.build_sql("bench.q", &params)));
    });
}

criterion_group!(
    benches,
    bench_update_clause,
    bench_policy_filtering,
    bench_render_statement,
    bench_template_render
);
criterion_main!(benches);
