//! Instantaneous firing rate by kernel density estimation.
//!
//! `rate(t) = Σ_k K(t − t_k)` evaluated on a regular grid
//! `t_i = t_start + i·Δt`, with `K` a unit-area kernel truncated at
//! `cutoff·σ`. The result is in spikes per second (Hz).
use std::fmt;
use std::str::FromStr;

use log::debug;
use ndarray::Array2;

use crate::config::RateConfig;
use crate::error::{Error, Result};
use crate::model::{AnalogSignal, SpikeTrain};

/// Kernel shape; each is parameterised by its standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelShape {
    Gaussian,
    Rectangular,
    Triangular,
}

impl FromStr for KernelShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gaussian" => Ok(KernelShape::Gaussian),
            "rectangular" => Ok(KernelShape::Rectangular),
            "triangular" => Ok(KernelShape::Triangular),
            other => Err(Error::InvalidParameter(format!(
                "unknown kernel '{other}': expected gaussian, rectangular or triangular"
            ))),
        }
    }
}

impl fmt::Display for KernelShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KernelShape::Gaussian => "gaussian",
            KernelShape::Rectangular => "rectangular",
            KernelShape::Triangular => "triangular",
        })
    }
}

/// A unit-area smoothing kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    pub shape: KernelShape,
    /// Standard deviation in seconds.
    pub sigma: f64,
}

impl Kernel {
    pub fn new(shape: KernelShape, sigma: f64) -> Result<Self> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(Error::InvalidParameter(format!("kernel sigma must be positive, got {sigma}")));
        }
        Ok(Self { shape, sigma })
    }

    /// Half-width of the non-zero region before truncation.
    fn natural_half_width(&self) -> f64 {
        match self.shape {
            KernelShape::Gaussian => f64::INFINITY,
            KernelShape::Rectangular => 3f64.sqrt() * self.sigma,
            KernelShape::Triangular => 6f64.sqrt() * self.sigma,
        }
    }

    /// Half-width of the evaluated region for a given cutoff.
    pub fn support(&self, cutoff: f64) -> f64 {
        (cutoff * self.sigma).min(self.natural_half_width())
    }

    /// Density at offset `t` seconds from the spike (untruncated).
    pub fn density(&self, t: f64) -> f64 {
        let s = self.sigma;
        match self.shape {
            KernelShape::Gaussian => {
                (-(t * t) / (2.0 * s * s)).exp() / (s * (2.0 * std::f64::consts::PI).sqrt())
            }
            KernelShape::Rectangular => {
                let a = self.natural_half_width();
                if t.abs() <= a { 1.0 / (2.0 * a) } else { 0.0 }
            }
            KernelShape::Triangular => {
                let a = self.natural_half_width();
                if t.abs() < a { (1.0 - t.abs() / a) / a } else { 0.0 }
            }
        }
    }
}

/// Estimate the firing rate of `spike_trains` sampled every `sampling_period` seconds.
///
/// Returns a `[C, T]` signal in Hz: one channel per spike train, or a single
/// channel with their mean when `cfg.pool_spike_trains` is set.
///
/// # Errors
///
/// [`Error::InvalidParameter`] for an empty input, a non-positive sampling
/// period or cutoff, an empty interval, or a trim that leaves no samples.
pub fn instantaneous_rate(
    spike_trains: &[&SpikeTrain],
    sampling_period: f64,
    kernel: Kernel,
    cfg: &RateConfig,
) -> Result<AnalogSignal> {
    if spike_trains.is_empty() {
        return Err(Error::InvalidParameter("no spike trains given".into()));
    }
    if !(sampling_period.is_finite() && sampling_period > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "sampling period must be positive, got {sampling_period}"
        )));
    }
    if !(cfg.cutoff.is_finite() && cfg.cutoff > 0.0) {
        return Err(Error::InvalidParameter(format!("cutoff must be positive, got {}", cfg.cutoff)));
    }

    let t_start = cfg
        .t_start
        .unwrap_or_else(|| spike_trains.iter().map(|st| st.t_start).fold(f64::INFINITY, f64::min));
    let t_stop = cfg
        .t_stop
        .unwrap_or_else(|| spike_trains.iter().map(|st| st.t_stop).fold(f64::NEG_INFINITY, f64::max));
    // Tolerance keeps e.g. 1.0 / 0.001 from rounding down a sample.
    let n_t = ((t_stop - t_start) / sampling_period + 1e-9).floor();
    if !(n_t >= 1.0) {
        return Err(Error::InvalidParameter(format!(
            "interval [{t_start}, {t_stop}] holds no sample at period {sampling_period}"
        )));
    }
    let n_t = n_t as usize;
    let dt = sampling_period;

    let support = kernel.support(cfg.cutoff);
    let offset = if cfg.center_kernel { 0.0 } else { support };
    let taps = (support / dt).floor() as i64;
    debug!(
        "rate: {} train(s), {n_t} samples @ {dt} s, kernel {} σ={} s ({} taps each side)",
        spike_trains.len(),
        kernel.shape,
        kernel.sigma,
        taps
    );

    let mut rates = Array2::<f64>::zeros((spike_trains.len(), n_t));
    for (c, st) in spike_trains.iter().enumerate() {
        let mut row = rates.row_mut(c);
        for &spike in st.times.iter().filter(|&&t| t >= t_start && t <= t_stop) {
            let centre = spike + offset;
            let lo = ((centre - support - t_start) / dt).ceil().max(0.0) as usize;
            let hi = ((centre + support - t_start) / dt).floor();
            if hi < 0.0 {
                continue;
            }
            let hi = (hi as usize).min(n_t - 1);
            for i in lo..=hi {
                let t = t_start + i as f64 * dt;
                row[i] += kernel.density(t - centre);
            }
        }
    }

    if cfg.border_correction {
        // Kernel mass inside the interval, seen from each grid point. Only
        // grid points within `offset ± support` of `t_i` contribute.
        let reach_lo = ((offset - support) / dt).floor() as i64 - 1;
        let reach_hi = ((offset + support) / dt).ceil() as i64 + 1;
        let last = n_t as i64 - 1;
        let mass: Vec<f64> = (0..n_t as i64)
            .map(|i| {
                let t_i = t_start + i as f64 * dt;
                ((i - reach_hi).max(0)..=(i - reach_lo).min(last))
                    .map(|j| {
                        let d = t_i - (t_start + j as f64 * dt) - offset;
                        if d.abs() <= support { kernel.density(d) * dt } else { 0.0 }
                    })
                    .sum::<f64>()
            })
            .collect();
        for mut row in rates.rows_mut() {
            for (v, &m) in row.iter_mut().zip(&mass) {
                if m > 0.0 {
                    *v /= m;
                }
            }
        }
    }

    let (rates, first) = if cfg.trim {
        let cut = taps.max(0) as usize;
        if 2 * cut >= n_t {
            return Err(Error::InvalidParameter(format!(
                "trimming {cut} samples from each end leaves nothing of {n_t}"
            )));
        }
        (rates.slice(ndarray::s![.., cut..n_t - cut]).to_owned(), cut)
    } else {
        (rates, 0)
    };

    let rates = if cfg.pool_spike_trains {
        rates.mean_axis(ndarray::Axis(0)).map(|m| m.insert_axis(ndarray::Axis(0))).unwrap_or(rates)
    } else {
        rates
    };

    let name = match spike_trains {
        [single] => format!("{}_rate", single.name),
        _ => "instantaneous_rate".to_string(),
    };
    let mut out = AnalogSignal::new(name, rates.mapv(|v| v as f32), 1.0 / dt)?
        .with_units("Hz")
        .with_t_start(t_start + first as f64 * dt);
    out.annotations.insert("kernel".into(), format!("{} sigma={} s", kernel.shape, kernel.sigma));
    Ok(out)
}

/// Rates of spike trains grouped by trial (one group per segment).
///
/// Each group goes through [`instantaneous_rate`]. With `cfg.pool_trials`
/// the per-trial rates are averaged element-wise into one signal: channel
/// `k` is the mean over trials of the `k`-th train's rate, and the time axis
/// is the first trial's. Otherwise one signal per trial is returned.
///
/// # Errors
///
/// [`Error::InvalidParameter`] for no trials, and when pooled trials differ
/// in channel or sample count; plus everything [`instantaneous_rate`] rejects.
pub fn trial_rates(
    trials: &[Vec<&SpikeTrain>],
    sampling_period: f64,
    kernel: Kernel,
    cfg: &RateConfig,
) -> Result<Vec<AnalogSignal>> {
    if trials.is_empty() {
        return Err(Error::InvalidParameter("no trials given".into()));
    }
    let rates = trials
        .iter()
        .map(|trial| instantaneous_rate(trial, sampling_period, kernel, cfg))
        .collect::<Result<Vec<_>>>()?;
    if !cfg.pool_trials {
        return Ok(rates);
    }

    let mut rates = rates.into_iter();
    let Some(first) = rates.next() else {
        return Err(Error::InvalidParameter("no trials given".into()));
    };
    let mut sum = first.data.mapv(f64::from);
    for (k, rate) in rates.enumerate() {
        if rate.data.dim() != sum.dim() {
            return Err(Error::InvalidParameter(format!(
                "trial {} has rate shape {:?}, trial 0 has {:?}",
                k + 1,
                rate.data.dim(),
                sum.dim()
            )));
        }
        sum.zip_mut_with(&rate.data, |s, &v| *s += f64::from(v));
    }
    let n = trials.len() as f64;
    debug!("rate: averaged {} trial(s) of shape {:?}", trials.len(), sum.dim());

    let name = match first.name.strip_suffix("_rate") {
        Some(train) if trials[0].len() == 1 => format!("{train}_trial_rate"),
        _ => "trial_averaged_rate".to_string(),
    };
    let mut out = first.with_data(name, sum.mapv(|v| (v / n) as f32));
    out.annotations.insert("trials".into(), trials.len().to_string());
    Ok(vec![out])
}
