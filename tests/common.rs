/// Shared fixtures for the integration tests.
use ephys::{AnalogSignal, Block, Segment, SeriesRef, SpikeTrain};
use ndarray::Array2;

#[allow(unused)]
/// Single-channel signal whose samples count up from `offset` in steps of 0.25.
pub fn signal(name: &str, n_t: usize, sfreq: f64, offset: f32) -> AnalogSignal {
    let data = Array2::from_shape_fn((1, n_t), |(_, t)| offset + t as f32 * 0.25);
    AnalogSignal::new(name, data, sfreq).unwrap()
}

#[allow(unused)]
/// `[C, T]` sum of sines, one row per entry of `freqs` (Hz), plus `dc`.
pub fn sines(name: &str, freqs: &[f64], dc: f32, n_t: usize, sfreq: f64) -> AnalogSignal {
    let data = Array2::from_shape_fn((freqs.len(), n_t), |(c, t)| {
        let phase = 2.0 * std::f64::consts::PI * freqs[c] * t as f64 / sfreq;
        dc + phase.sin() as f32
    });
    AnalogSignal::new(name, data, sfreq).unwrap()
}

#[allow(unused)]
pub fn spike_train(name: &str, times: &[f64], t_stop: f64) -> SpikeTrain {
    SpikeTrain::new(name, times.to_vec(), 0.0, t_stop).unwrap()
}

#[allow(unused)]
/// Block whose segment `s` holds `counts[s]` analog signals named `s{s}a{k}`
/// and as many spike trains named `s{s}u{k}`.
pub fn make_block(counts: &[usize]) -> Block {
    let segments = counts
        .iter()
        .enumerate()
        .map(|(s, &n)| {
            let signals = (0..n)
                .map(|k| signal(&format!("s{s}a{k}"), 16, 1000.0, k as f32))
                .collect();
            let trains = (0..n)
                .map(|k| spike_train(&format!("s{s}u{k}"), &[0.125 * (k + 1) as f64, 0.5], 1.0))
                .collect();
            Segment::with_series(signals, trains)
        })
        .collect();
    Block::named("recording").with_segments(segments)
}

#[allow(unused)]
pub fn names(picked: &[SeriesRef<'_>]) -> Vec<String> {
    picked.iter().map(|s| s.name().to_string()).collect()
}
