use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{Criterion, criterion_group, criterion_main};
use csv_loader::infer::{InferOptions, infer_schema};
use csv_loader::io_utils::CsvSource;
use tempfile::TempDir;

fn generate_orders(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("orders.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "id,ordered_at,amount,shipped,customer").expect("header");
    for i in 0..rows {
        let day = (i % 28) + 1;
        let shipped = i % 2 == 0;
        writeln!(
            file,
            "{i},2024-01-{day:02},{}.{:02},{shipped},\"Customer {i}, Ltd.\"",
            i % 500,
            i % 100
        )
        .expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_inference(c: &mut Criterion) {
    let (_dir, path) = generate_orders(50_000);
    let source = CsvSource::from_path(&path);

    c.bench_function("infer_single_sample", |b| {
        b.iter(|| infer_schema(&source, &InferOptions::default()).expect("infer"))
    });

    let full_scan = InferOptions {
        sample_rows: 0,
        ..InferOptions::default()
    };
    c.bench_function("infer_full_vote", |b| {
        b.iter(|| infer_schema(&source, &full_scan).expect("infer"))
    });
}

criterion_group!(benches, bench_inference);
criterion_main!(benches);
