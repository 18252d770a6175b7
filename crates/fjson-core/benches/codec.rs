//! Serialize/deserialize hot-loop benchmarks

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use fjson_rs::{ByteWriter, JsonOptions, from_slice, json_object, to_vec, to_writer_buf};

json_object! {
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Event {
        pub id: u64 => "id",
        pub source: String => "source",
        pub samples: Vec<f64> => "samples",
        pub note: Option<String> => "note",
    }
}

fn sample_event() -> Event {
    Event {
        id: 982_451_653,
        source: "collector-7".to_string(),
        samples: (0..64).map(|i| i as f64 * 0.25).collect(),
        note: None,
    }
}

fn bench_serialize(c: &mut Criterion) {
    let event = sample_event();
    let ints: Vec<i64> = (0..1024).collect();

    c.bench_function("serialize_object", |b| {
        let mut out = ByteWriter::with_capacity(4096);
        b.iter(|| {
            out.clear();
            to_writer_buf(black_box(&event), &mut out, JsonOptions::default()).unwrap();
            black_box(out.len());
        });
    });

    c.bench_function("serialize_int_array", |b| {
        let mut out = ByteWriter::with_capacity(8192);
        b.iter(|| {
            out.clear();
            to_writer_buf(black_box(&ints), &mut out, JsonOptions::default()).unwrap();
            black_box(out.len());
        });
    });
}

fn bench_deserialize(c: &mut Criterion) {
    let event_bytes = to_vec(&sample_event()).unwrap();
    let ints_bytes = to_vec(&(0..1024).collect::<Vec<i64>>()).unwrap();

    c.bench_function("deserialize_object", |b| {
        b.iter(|| {
            let event: Event = from_slice(black_box(&event_bytes)).unwrap();
            black_box(event.id);
        });
    });

    c.bench_function("deserialize_int_array", |b| {
        b.iter(|| {
            let values: Vec<i64> = from_slice(black_box(&ints_bytes)).unwrap();
            black_box(values.len());
        });
    });
}

criterion_group!(benches, bench_serialize, bench_deserialize);
criterion_main!(benches);
