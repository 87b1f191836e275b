mod common;
use common::spike_train;
use ephys::{
    instantaneous_rate, parse_range, select_spike_trains_by_segment, trial_rates, Block, Kernel, KernelShape,
    RateConfig, Segment,
};

const DT: f64 = 0.001;

fn integral(rate: &ephys::AnalogSignal, channel: usize) -> f64 {
    rate.data.row(channel).iter().map(|&v| v as f64 * rate.sampling_period()).sum()
}

fn gaussian(sigma: f64) -> Kernel {
    Kernel::new(KernelShape::Gaussian, sigma).unwrap()
}

// ── Mass ──────────────────────────────────────────────────────────────────────

#[test]
fn rate_integrates_to_spike_count() {
    let st = spike_train("unit", &[0.3, 0.5, 0.7], 1.0);
    for shape in [KernelShape::Gaussian, KernelShape::Rectangular, KernelShape::Triangular] {
        let kernel = Kernel::new(shape, 0.02).unwrap();
        let rate = instantaneous_rate(&[&st], DT, kernel, &RateConfig::default()).unwrap();
        assert_eq!(rate.n_channels(), 1);
        assert_eq!(rate.n_samples(), 1000);
        approx::assert_abs_diff_eq!(integral(&rate, 0), 3.0, epsilon = 2e-2);
    }
}

#[test]
fn output_is_in_hz_on_the_grid() {
    let st = spike_train("unit", &[0.5], 1.0);
    let rate = instantaneous_rate(&[&st], DT, gaussian(0.02), &RateConfig::default()).unwrap();
    assert_eq!(rate.name, "unit_rate");
    assert_eq!(rate.units, "Hz");
    approx::assert_abs_diff_eq!(rate.sampling_rate, 1000.0, epsilon = 1e-9);
    assert_eq!(rate.t_start, 0.0);
    assert!(rate.annotations["kernel"].starts_with("gaussian"));
}

#[test]
fn rectangular_peak_height() {
    let st = spike_train("unit", &[0.5], 1.0);
    let kernel = Kernel::new(KernelShape::Rectangular, 0.01).unwrap();
    let rate = instantaneous_rate(&[&st], DT, kernel, &RateConfig::default()).unwrap();
    let peak = rate.data.iter().cloned().fold(f32::MIN, f32::max) as f64;
    approx::assert_abs_diff_eq!(peak, 1.0 / (2.0 * 3f64.sqrt() * 0.01), epsilon = 1e-3);
}

// ── Options ───────────────────────────────────────────────────────────────────

#[test]
fn one_channel_per_train_or_pooled() {
    let a = spike_train("a", &[0.5], 1.0);
    let b = spike_train("b", &[0.25, 0.75], 1.0);
    let rate = instantaneous_rate(&[&a, &b], DT, gaussian(0.02), &RateConfig::default()).unwrap();
    assert_eq!(rate.n_channels(), 2);
    approx::assert_abs_diff_eq!(integral(&rate, 1), 2.0, epsilon = 1e-2);

    let cfg = RateConfig { pool_spike_trains: true, ..RateConfig::default() };
    let pooled = instantaneous_rate(&[&a, &b], DT, gaussian(0.02), &cfg).unwrap();
    assert_eq!(pooled.n_channels(), 1);
    approx::assert_abs_diff_eq!(integral(&pooled, 0), 1.5, epsilon = 1e-2);
}

#[test]
fn trim_drops_kernel_support_at_both_ends() {
    let st = spike_train("unit", &[0.5], 1.0);
    let cfg = RateConfig { trim: true, ..RateConfig::default() };
    let rate = instantaneous_rate(&[&st], DT, gaussian(0.02), &cfg).unwrap();
    // support = 5 σ = 0.1 s = 100 samples each side
    assert!((rate.n_samples() as i64 - 800).abs() <= 2, "{}", rate.n_samples());
    approx::assert_abs_diff_eq!(rate.t_start, 0.1, epsilon = 2e-3);
}

#[test]
fn uncentered_kernel_shifts_peak_forward() {
    let st = spike_train("unit", &[0.3], 1.0);
    let cfg = RateConfig { center_kernel: false, ..RateConfig::default() };
    let rate = instantaneous_rate(&[&st], DT, gaussian(0.02), &cfg).unwrap();
    let argmax = rate
        .data
        .row(0)
        .iter()
        .enumerate()
        .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0;
    assert!((argmax as i64 - 400).abs() <= 1, "peak at {argmax}");
}

#[test]
fn border_correction_restores_mass_at_edges() {
    let st = spike_train("unit", &[0.0], 1.0);
    let plain = instantaneous_rate(&[&st], DT, gaussian(0.02), &RateConfig::default()).unwrap();
    let cfg = RateConfig { border_correction: true, ..RateConfig::default() };
    let corrected = instantaneous_rate(&[&st], DT, gaussian(0.02), &cfg).unwrap();
    approx::assert_abs_diff_eq!(integral(&plain, 0), 0.5, epsilon = 2e-2);
    // The half-kernel lost below t_start is compensated near the border.
    assert!(integral(&corrected, 0) > 0.6, "{}", integral(&corrected, 0));
}

#[test]
fn border_correction_divides_by_truncated_mass() {
    let st = spike_train("unit", &[0.01, 0.55, 0.98], 1.0);
    let kernel = gaussian(0.02);
    for center_kernel in [true, false] {
        let plain_cfg = RateConfig { center_kernel, ..RateConfig::default() };
        let cfg = RateConfig { border_correction: true, ..plain_cfg.clone() };
        let plain = instantaneous_rate(&[&st], DT, kernel, &plain_cfg).unwrap();
        let corrected = instantaneous_rate(&[&st], DT, kernel, &cfg).unwrap();

        let support = kernel.support(cfg.cutoff);
        let offset = if center_kernel { 0.0 } else { support };
        let n_t = plain.n_samples();
        for i in [0, 3, 40, 99, 500, 930, 990, n_t - 1] {
            let mass: f64 = (0..n_t)
                .map(|j| {
                    let d = i as f64 * DT - j as f64 * DT - offset;
                    if d.abs() <= support { kernel.density(d) * DT } else { 0.0 }
                })
                .sum();
            let expected = plain.data[[0, i]] as f64 / mass;
            approx::assert_relative_eq!(
                corrected.data[[0, i]] as f64,
                expected,
                max_relative = 1e-4,
                epsilon = 1e-6
            );
        }
    }
}

#[test]
fn border_correction_on_long_recording() {
    // 200 s at 1 ms: the mass of each sample only looks at its kernel support.
    let times: Vec<f64> = (0..200).map(|k| k as f64 + 0.5).chain([0.0]).collect();
    let st = spike_train("unit", &times, 200.0);
    let kernel = gaussian(0.005);
    let plain = instantaneous_rate(&[&st], DT, kernel, &RateConfig::default()).unwrap();
    let cfg = RateConfig { border_correction: true, ..RateConfig::default() };
    let corrected = instantaneous_rate(&[&st], DT, kernel, &cfg).unwrap();
    assert_eq!(corrected.n_samples(), 200_000);
    // Far from the borders the whole kernel lies inside the interval.
    approx::assert_relative_eq!(corrected.data[[0, 100_500]], plain.data[[0, 100_500]], max_relative = 1e-4);
    // At t_start about half the kernel is outside.
    let ratio = corrected.data[[0, 0]] / plain.data[[0, 0]];
    assert!(ratio > 1.8 && ratio < 2.0, "{ratio}");
}

#[test]
fn explicit_interval() {
    let st = spike_train("unit", &[0.5, 1.5], 2.0);
    let cfg = RateConfig { t_start: Some(1.0), t_stop: Some(2.0), ..RateConfig::default() };
    let rate = instantaneous_rate(&[&st], DT, gaussian(0.02), &cfg).unwrap();
    assert_eq!(rate.t_start, 1.0);
    assert_eq!(rate.n_samples(), 1000);
    approx::assert_abs_diff_eq!(integral(&rate, 0), 1.0, epsilon = 1e-2);
}

// ── Trials ────────────────────────────────────────────────────────────────────

fn two_trials() -> Block {
    let trial = |a: &[f64], b: &[f64]| {
        Segment::with_series(vec![], vec![spike_train("u0", a, 1.0), spike_train("u1", b, 1.0)])
    };
    Block::new().with_segments(vec![
        trial(&[0.5], &[0.2, 0.4, 0.6, 0.8]),
        trial(&[0.3, 0.5, 0.7], &[0.5, 0.6]),
    ])
}

#[test]
fn trains_grouped_by_segment() {
    let block = two_trials();
    let all = parse_range("all").unwrap();
    let trials = select_spike_trains_by_segment(&block, &all, &all).unwrap();
    assert_eq!(trials.len(), 2);
    assert!(trials.iter().all(|t| t.len() == 2));
    assert_eq!(trials[1][0].times.len(), 3);
    assert!(select_spike_trains_by_segment(&block, &parse_range("2").unwrap(), &parse_range("0").unwrap()).is_err());
}

#[test]
fn pooled_trials_average_matching_trains() {
    let block = two_trials();
    let segments = parse_range("0:1").unwrap();
    let trials = select_spike_trains_by_segment(&block, &segments, &parse_range("all").unwrap()).unwrap();

    let per_trial = trial_rates(&trials, DT, gaussian(0.02), &RateConfig::default()).unwrap();
    assert_eq!(per_trial.len(), 2);

    let cfg = RateConfig { pool_trials: true, ..RateConfig::default() };
    let pooled = trial_rates(&trials, DT, gaussian(0.02), &cfg).unwrap();
    assert_eq!(pooled.len(), 1);
    let rate = &pooled[0];
    assert_eq!(rate.name, "trial_averaged_rate");
    assert_eq!(rate.n_channels(), 2);
    assert_eq!(rate.n_samples(), 1000);
    assert_eq!(rate.annotations["trials"], "2");
    approx::assert_abs_diff_eq!(integral(rate, 0), 2.0, epsilon = 1e-2);
    approx::assert_abs_diff_eq!(integral(rate, 1), 3.0, epsilon = 1e-2);
    let mean = (per_trial[0].data[[1, 400]] + per_trial[1].data[[1, 400]]) / 2.0;
    approx::assert_abs_diff_eq!(rate.data[[1, 400]], mean, epsilon = 1e-4);
}

#[test]
fn pooled_trials_need_matching_shapes() {
    let block = two_trials();
    let a = &block.segments[0].spike_trains;
    let b = &block.segments[1].spike_trains;
    let cfg = RateConfig { pool_trials: true, ..RateConfig::default() };
    let uneven = vec![vec![&a[0], &a[1]], vec![&b[0]]];
    assert!(trial_rates(&uneven, DT, gaussian(0.02), &cfg).is_err());
    assert!(trial_rates(&[], DT, gaussian(0.02), &cfg).is_err());

    let single = vec![vec![&a[0]], vec![&b[0]]];
    assert_eq!(trial_rates(&single, DT, gaussian(0.02), &cfg).unwrap()[0].name, "u0_trial_rate");
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[test]
fn invalid_parameters_rejected() {
    let st = spike_train("unit", &[0.5], 1.0);
    let cfg = RateConfig::default();
    assert!(instantaneous_rate(&[], DT, gaussian(0.02), &cfg).is_err());
    assert!(instantaneous_rate(&[&st], 0.0, gaussian(0.02), &cfg).is_err());
    let empty = RateConfig { t_start: Some(0.8), t_stop: Some(0.8), ..RateConfig::default() };
    assert!(instantaneous_rate(&[&st], DT, gaussian(0.02), &empty).is_err());
    assert!(Kernel::new(KernelShape::Gaussian, -1.0).is_err());
}
