use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use ephys::{
    filter_signal, parse_range, select, AnalogSignal, Block, FilterBand, ResolvedIndex, Segment, SeriesRequest,
};
use ndarray::Array2;

/// 50 segments × 20 analog signals of 4 ch × 256 samples.
fn large_block() -> Block {
    let segments = (0..50)
        .map(|s| {
            let signals = (0..20)
                .map(|k| AnalogSignal::new(format!("s{s}a{k}"), Array2::zeros((4, 256)), 256.0).unwrap())
                .collect();
            Segment::with_series(signals, vec![])
        })
        .collect();
    Block::new().with_segments(segments)
}

fn bench_parse_range(c: &mut Criterion) {
    c.bench_function("parse_range \"2:40:3\"", |b| {
        b.iter(|| parse_range(black_box("2:40:3")).unwrap())
    });
}

fn bench_select(c: &mut Criterion) {
    let block = large_block();
    let request = SeriesRequest::analog_signals(parse_range("0:9").unwrap());
    c.bench_function("select all segments × 10 signals", |b| {
        b.iter(|| {
            let picked = select(&block, black_box(&ResolvedIndex::ALL), &request).unwrap();
            black_box(picked.len())
        })
    });
}

fn bench_filter(c: &mut Criterion) {
    let data = Array2::from_shape_fn((12, 3840), |(ch, t)| ((ch + t) as f32 * 0.01).sin());
    let sig = AnalogSignal::new("eeg", data, 256.0).unwrap();
    c.bench_function("filter_signal HP 0.5 Hz [12×3840]", |b| {
        b.iter(|| {
            let out = filter_signal(black_box(&sig), FilterBand::Highpass(0.5), None).unwrap();
            black_box(out.data[[0, 0]])
        })
    });
}

criterion_group!(benches, bench_parse_range, bench_select, bench_filter);
criterion_main!(benches);
