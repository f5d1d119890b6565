use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use jagged::{ArrayBuilder, Content, Index64, ListOffsetArray, NumpyArray, Reducer, Slice};

const SIZE: usize = 100_000;

/// `SIZE` lists of lengths cycling through 0..13 over float data.
fn ragged() -> Content {
    let mut offsets = Vec::with_capacity(SIZE + 1);
    offsets.push(0i64);
    for i in 0..SIZE {
        let last = offsets[offsets.len() - 1];
        offsets.push(last + ((i * 7) % 13) as i64);
    }
    let total = offsets[SIZE] as usize;
    let values: Content = NumpyArray::from_vec((0..total).map(|x| x as f64 * 0.5).collect::<Vec<_>>()).into();
    ListOffsetArray::new(Index64::from(offsets), values).unwrap().into()
}

fn criterion_benchmark(c: &mut Criterion) {
    let array = ragged();

    c.bench_function("getitem range then range", |b| {
        let slice = Slice::new().range(Some(10), Some(-10)).range(Some(1), None);
        b.iter(|| array.getitem(black_box(&slice)).unwrap());
    });

    c.bench_function("getitem fancy", |b| {
        let positions: Vec<i64> = (0..SIZE as i64).step_by(3).collect();
        let slice = Slice::new().array(positions);
        b.iter(|| array.getitem(black_box(&slice)).unwrap());
    });

    for reducer in [Reducer::Sum, Reducer::Max, Reducer::ArgMin] {
        c.bench_function(&format!("reduce {} axis=-1", reducer), |b| {
            b.iter(|| array.reduce(black_box(reducer), -1, false, false).unwrap());
        });
    }

    c.bench_function("reduce sum axis=0", |b| {
        b.iter(|| array.reduce(Reducer::Sum, 0, false, false).unwrap());
    });

    c.bench_function("merge", |b| {
        b.iter(|| array.merge(black_box(&array)).unwrap());
    });

    c.bench_function("ArrayBuilder lists", |b| {
        b.iter(|| {
            let mut builder = ArrayBuilder::default();
            for i in 0..SIZE / 10 {
                builder.begin_list().unwrap();
                for k in 0..(i % 5) {
                    builder.real(k as f64).unwrap();
                }
                builder.end_list().unwrap();
            }
            builder.snapshot().unwrap()
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
