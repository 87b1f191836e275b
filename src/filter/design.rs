//! Windowed-sinc FIR design.
//!
//! For an edge at `f` Hz with sampling rate `sfreq`:
//!   • transition bandwidth, low edge  = min(max(0.25·f, 2), f)
//!   • transition bandwidth, high edge = min(max(0.25·f, 2), sfreq/2 − f)
//!   • filter length N = ceil(3.3 / min(tb) · sfreq), rounded to odd
//!   • each edge is placed at the middle of its transition band
//!
//! Every band is built from unit-DC-gain Hamming lowpass kernels:
//!
//! ```text
//! lowpass(h)      = lp(h)
//! highpass(l)     = δ − lp(l)
//! bandpass(l, h)  = lp(h) − lp(l)
//! bandstop(l, h)  = δ − lp(h) + lp(l)
//! ```
use std::f64::consts::PI;

use crate::error::{Error, Result};

/// Pass band of a filter. Frequencies in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterBand {
    Highpass(f64),
    Lowpass(f64),
    Bandpass(f64, f64),
    Bandstop(f64, f64),
}

impl FilterBand {
    /// Band from optional highpass and lowpass cutoffs.
    ///
    /// Both set with `highpass < lowpass` gives a bandpass, with
    /// `highpass >= lowpass` a bandstop between them.
    pub fn from_cutoffs(highpass: Option<f64>, lowpass: Option<f64>) -> Result<Self> {
        match (highpass, lowpass) {
            (Some(l), None) => Ok(FilterBand::Highpass(l)),
            (None, Some(h)) => Ok(FilterBand::Lowpass(h)),
            (Some(l), Some(h)) if l < h => Ok(FilterBand::Bandpass(l, h)),
            (Some(l), Some(h)) => Ok(FilterBand::Bandstop(h, l)),
            (None, None) => Err(Error::InvalidFilter(
                "at least one of highpass or lowpass frequency is required".into(),
            )),
        }
    }

    fn edges(&self) -> Vec<f64> {
        match *self {
            FilterBand::Highpass(f) | FilterBand::Lowpass(f) => vec![f],
            FilterBand::Bandpass(l, h) | FilterBand::Bandstop(l, h) => vec![l, h],
        }
    }

    /// Reject edges outside `(0, sfreq/2)`.
    pub fn validate(&self, sfreq: f64) -> Result<()> {
        let nyq = sfreq / 2.0;
        for f in self.edges() {
            if !(f.is_finite() && f > 0.0 && f < nyq) {
                return Err(Error::InvalidFilter(format!(
                    "cutoff {f} Hz must lie strictly between 0 and the Nyquist frequency {nyq} Hz"
                )));
            }
        }
        Ok(())
    }
}

/// Transition bandwidth below a low (highpass) edge.
pub fn low_trans_bandwidth(l_freq: f64) -> f64 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// Transition bandwidth above a high (lowpass) edge.
pub fn high_trans_bandwidth(h_freq: f64, sfreq: f64) -> f64 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Number of taps for a given transition bandwidth, rounded up to odd.
pub fn auto_filter_length(trans_bw: f64, sfreq: f64) -> usize {
    let n_raw = (3.3 / trans_bw * sfreq).ceil() as usize;
    n_raw | 1
}

/// Design the zero-phase FIR kernel for `band`.
///
/// `length` overrides the automatic tap count and must be odd.
///
/// # Examples
///
/// ```
/// use ephys::filter::{design, FilterBand};
///
/// let h = design(FilterBand::Highpass(0.5), 256.0, None).unwrap();
/// assert_eq!(h.len(), 1691);
/// ```
pub fn design(band: FilterBand, sfreq: f64, length: Option<usize>) -> Result<Vec<f64>> {
    band.validate(sfreq)?;

    // Cutoffs at mid-transition, and the narrowest transition sets the length.
    let (lower, upper, min_tb) = match band {
        FilterBand::Highpass(l) => {
            let tb = low_trans_bandwidth(l);
            (Some(l - tb / 2.0), None, tb)
        }
        FilterBand::Lowpass(h) => {
            let tb = high_trans_bandwidth(h, sfreq);
            (None, Some(h + tb / 2.0), tb)
        }
        FilterBand::Bandpass(l, h) | FilterBand::Bandstop(l, h) => {
            let (tl, th) = (low_trans_bandwidth(l), high_trans_bandwidth(h, sfreq));
            (Some(l - tl / 2.0), Some(h + th / 2.0), tl.min(th))
        }
    };

    let n = match length {
        Some(n) if n % 2 == 1 && n >= 3 => n,
        Some(n) => {
            return Err(Error::InvalidFilter(format!("filter length must be odd and at least 3, got {n}")))
        }
        None => auto_filter_length(min_tb, sfreq),
    };

    let lp = |fc: f64| firwin(n, fc, sfreq);
    let mut h = match band {
        FilterBand::Lowpass(_) => lp(upper.unwrap_or_default()),
        FilterBand::Highpass(_) => negate(lp(lower.unwrap_or_default())),
        FilterBand::Bandpass(..) => sub(lp(upper.unwrap_or_default()), &lp(lower.unwrap_or_default())),
        FilterBand::Bandstop(..) => sub(lp(lower.unwrap_or_default()), &lp(upper.unwrap_or_default())),
    };
    if matches!(band, FilterBand::Highpass(_) | FilterBand::Bandstop(..)) {
        h[n / 2] += 1.0;
    }
    Ok(h)
}

fn negate(mut h: Vec<f64>) -> Vec<f64> {
    h.iter_mut().for_each(|v| *v = -*v);
    h
}

fn sub(mut a: Vec<f64>, b: &[f64]) -> Vec<f64> {
    a.iter_mut().zip(b).for_each(|(x, y)| *x -= y);
    a
}

/// Hamming-windowed sinc lowpass with `-6 dB` point at `cutoff_hz`,
/// normalised to unit DC gain. `n` must be odd.
pub fn firwin(n: usize, cutoff_hz: f64, sfreq: f64) -> Vec<f64> {
    debug_assert!(n % 2 == 1, "firwin requires odd N for a linear-phase filter");
    let alpha = (n - 1) as f64 / 2.0;
    let fc = cutoff_hz / (sfreq / 2.0);

    let win = hamming(n);
    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - alpha;
            // sin(π·fc·x) / (π·x) → fc as x → 0
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * win[i]
        })
        .collect();

    let s: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= s);
    h
}

/// Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}
