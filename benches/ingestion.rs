use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tabular_ingest::hydrate::{as_structs, FieldBinding, FromRecord};
use tabular_ingest::ingestion::LoadedRows;

#[derive(Default)]
struct Row {
    date: String,
    price: f64,
    qty: i64,
}

impl FromRecord for Row {
    fn bindings() -> Vec<FieldBinding<Self>> {
        vec![
            FieldBinding::text("date", |r: &mut Self, v| r.date = v),
            FieldBinding::float("price", |r: &mut Self, v| r.price = v),
            FieldBinding::signed("qty", |r: &mut Self, v| r.qty = v),
        ]
    }
}

fn sample_buffer(rows: usize) -> Vec<u8> {
    let mut out = String::from("date,price,qty\n");
    for i in 0..rows {
        out.push_str(&format!("2024-01-{:02},{}.25,{}\n", i % 28 + 1, i, i * 3));
    }
    out.pop();
    out.into_bytes()
}

fn bench_ingestion(c: &mut Criterion) {
    let data = sample_buffer(50_000);

    c.bench_function("from_bytes_interpret_50k", |b| {
        b.iter(|| {
            LoadedRows::from_bytes(black_box(&data), "\n", ",", None)
                .interpret_columns()
                .unwrap()
        })
    });

    let ds = LoadedRows::from_bytes(&data, "\n", ",", None)
        .interpret_columns()
        .unwrap();
    c.bench_function("as_structs_50k", |b| {
        b.iter(|| as_structs::<Row>(black_box(&ds)).unwrap())
    });
}

criterion_group!(benches, bench_ingestion);
criterion_main!(benches);
