//! Row decoding benchmarks for CSV and binary streams.
//!
//! Run with: `cargo bench --package hapi-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use futures::io::Cursor;
use hapi_bench::{binary_payload, csv_payload, parameters};
use hapi_lib::{ColumnReader, CsvDecoder, RowReader, StreamFormat};
use std::hint::black_box;

const ROW_COUNTS: [usize; 2] = [1_000, 10_000];

fn columns() -> Vec<ColumnReader> {
    parameters().iter().map(ColumnReader::new).collect()
}

async fn count_rows(payload: &[u8], format: StreamFormat) -> usize {
    let reader = Cursor::new(payload);
    let mut rows = RowReader::from_reader(reader, format, columns())
        .await
        .expect("open row reader");
    let mut count = 0;
    while rows.next().await.expect("read row") {
        black_box(rows.row());
        count += 1;
    }
    count
}

fn csv_split_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("csv_split");

    for rows in ROW_COUNTS {
        let payload = csv_payload(rows);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &payload, |b, payload| {
            b.to_async(&runtime).iter(|| async move {
                let mut decoder = CsvDecoder::new();
                let mut reader = Cursor::new(payload.as_slice());
                let mut count = 0;
                while let Some(fields) = decoder.read_row(&mut reader).await.expect("read row") {
                    black_box(fields);
                    count += 1;
                }
                count
            });
        });
    }
    group.finish();
}

fn row_decode_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("row_decode");

    for rows in ROW_COUNTS {
        group.throughput(Throughput::Elements(rows as u64));
        for (name, format, payload) in [
            ("csv", StreamFormat::Csv, csv_payload(rows)),
            ("binary", StreamFormat::Binary, binary_payload(rows)),
        ] {
            group.bench_with_input(BenchmarkId::new(name, rows), &payload, |b, payload| {
                b.to_async(&runtime)
                    .iter(|| async move { count_rows(payload, format).await });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, csv_split_benchmark, row_decode_benchmark);
criterion_main!(benches);
