//! Butterworth IIR filters as cascades of second-order sections.
//!
//! Design, for `order` n and sampling rate `fs`:
//!   • analog prototype poles `p_k = exp(iπ(2k + n + 1) / 2n)`, k = 0..n
//!   • band edges pre-warped to `ω = 2fs·tan(π f / fs)`
//!   • lowpass `s = ω p`, highpass `s = ω / p`; bandpass and bandstop map
//!     each prototype pole to two poles around `ω0 = √(ωl·ωh)`
//!   • bilinear transform `z = (2fs + s) / (2fs − s)`
//!   • conjugate pole pairs become biquads, sorted by pole radius, and the
//!     gain is normalised to 1 at DC, Nyquist or the band centre
//!
//! Bandpass and bandstop filters therefore have `2n` poles.
//!
//! | function      | passes           | padding (odd extension)       |
//! |---------------|------------------|-------------------------------|
//! | `lfilter`     | forward          | none, zero initial state      |
//! | `filtfilt`    | forward+backward | `3·(n_poles + 1)` samples     |
//! | `sosfiltfilt` | forward+backward | `3·(2·n_sections + 1)` samples |
//!
//! The forward-backward passes start from the steady state of a step at the
//! edge value, giving zero phase and the squared magnitude response.
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use log::debug;
use ndarray::ArrayView1;
use rustfft::num_complex::Complex;

use crate::error::{Error, Result};
use crate::model::AnalogSignal;

use super::apply::reflect_limited_pad;
use super::design::FilterBand;

type C64 = Complex<f64>;

const MAX_ORDER: usize = 32;

/// How a designed filter runs over a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterFunction {
    /// Causal, forward only.
    Lfilter,
    /// Zero phase, padded by `3·(n_poles + 1)`.
    #[default]
    Filtfilt,
    /// Zero phase, padded by `3·(2·n_sections + 1)`.
    Sosfiltfilt,
}

impl FromStr for FilterFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lfilter" => Ok(FilterFunction::Lfilter),
            "filtfilt" => Ok(FilterFunction::Filtfilt),
            "sosfiltfilt" => Ok(FilterFunction::Sosfiltfilt),
            other => Err(Error::InvalidFilter(format!(
                "unknown filter function '{other}': expected lfilter, filtfilt or sosfiltfilt"
            ))),
        }
    }
}

impl fmt::Display for FilterFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilterFunction::Lfilter => "lfilter",
            FilterFunction::Filtfilt => "filtfilt",
            FilterFunction::Sosfiltfilt => "sosfiltfilt",
        })
    }
}

/// `(b0 + b1 z⁻¹ + b2 z⁻²) / (1 + a1 z⁻¹ + a2 z⁻²)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 2],
}

impl Biquad {
    fn response(&self, z_inv: C64) -> C64 {
        let z2 = z_inv * z_inv;
        let num = C64::new(self.b[0], 0.0) + z_inv * self.b[1] + z2 * self.b[2];
        let den = C64::new(1.0, 0.0) + z_inv * self.a[0] + z2 * self.a[1];
        num / den
    }

    fn dc_gain(&self) -> f64 {
        (self.b[0] + self.b[1] + self.b[2]) / (1.0 + self.a[0] + self.a[1])
    }

    /// Transposed direct form II state after a long unit step.
    fn step_state(&self) -> [f64; 2] {
        let g = self.dc_gain();
        let z2 = self.b[2] - self.a[1] * g;
        let z1 = self.b[1] - self.a[0] * g + z2;
        [z1, z2]
    }
}

/// Zeros shared by every section of one band type.
#[derive(Debug, Clone, Copy)]
enum Zeros {
    /// `z = -1` (lowpass).
    Nyquist,
    /// `z = 1` (highpass).
    Dc,
    /// `z = ±1` (bandpass).
    Both,
    /// `z = e^{±iθ}` (bandstop).
    Notch(f64),
}

impl Zeros {
    fn pair(self) -> [f64; 3] {
        match self {
            Zeros::Nyquist => [1.0, 2.0, 1.0],
            Zeros::Dc => [1.0, -2.0, 1.0],
            Zeros::Both => [1.0, 0.0, -1.0],
            Zeros::Notch(theta) => [1.0, -2.0 * theta.cos(), 1.0],
        }
    }

    fn single(self) -> [f64; 3] {
        match self {
            Zeros::Dc => [1.0, -1.0, 0.0],
            _ => [1.0, 1.0, 0.0],
        }
    }
}

/// A designed Butterworth filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Butterworth {
    pub sections: Vec<Biquad>,
    n_poles: usize,
}

impl Butterworth {
    /// Design an `order`-th order filter for `band` at `sfreq` Hz.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFilter`] for an order outside `1..=32`, an edge
    /// outside `(0, sfreq/2)` or band edges not in increasing order.
    pub fn design(band: FilterBand, order: usize, sfreq: f64) -> Result<Self> {
        if !(1..=MAX_ORDER).contains(&order) {
            return Err(Error::InvalidFilter(format!("order must be in 1..={MAX_ORDER}, got {order}")));
        }
        band.validate(sfreq)?;
        if let FilterBand::Bandpass(l, h) | FilterBand::Bandstop(l, h) = band {
            if l >= h {
                return Err(Error::InvalidFilter(format!("band edges must differ, got {l} and {h} Hz")));
            }
        }

        let fs2 = 2.0 * sfreq;
        let warp = |f: f64| fs2 * (PI * f / sfreq).tan();
        let prototype: Vec<C64> = (0..order)
            .map(|k| C64::from_polar(1.0, PI * (2 * k + order + 1) as f64 / (2 * order) as f64))
            .collect();

        // Analog poles, digital zeros and the z⁻¹ at which the gain is 1.
        let (poles, zeros, reference): (Vec<C64>, Zeros, C64) = match band {
            FilterBand::Lowpass(f) => {
                let w = warp(f);
                (prototype.iter().map(|&p| p * w).collect(), Zeros::Nyquist, C64::new(1.0, 0.0))
            }
            FilterBand::Highpass(f) => {
                let w = C64::new(warp(f), 0.0);
                (prototype.iter().map(|&p| w / p).collect(), Zeros::Dc, C64::new(-1.0, 0.0))
            }
            FilterBand::Bandpass(l, h) => {
                let (wl, wh) = (warp(l), warp(h));
                let w0 = (wl * wh).sqrt();
                let poles = prototype
                    .iter()
                    .flat_map(|&p| split_pole(p * ((wh - wl) / 2.0), w0))
                    .collect();
                let centre = 2.0 * (w0 / fs2).atan();
                (poles, Zeros::Both, C64::from_polar(1.0, -centre))
            }
            FilterBand::Bandstop(l, h) => {
                let (wl, wh) = (warp(l), warp(h));
                let w0 = (wl * wh).sqrt();
                let half_bw = C64::new((wh - wl) / 2.0, 0.0);
                let poles = prototype.iter().flat_map(|&p| split_pole(half_bw / p, w0)).collect();
                (poles, Zeros::Notch(2.0 * (w0 / fs2).atan()), C64::new(1.0, 0.0))
            }
        };

        let n_poles = poles.len();
        let digital: Vec<C64> = poles
            .iter()
            .map(|&s| (C64::new(fs2, 0.0) + s) / (C64::new(fs2, 0.0) - s))
            .collect();
        let mut sections = group_sections(&digital, zeros);

        let gain = sections.iter().map(|s| s.response(reference)).product::<C64>().norm();
        if !(gain.is_finite() && gain > 0.0) {
            return Err(Error::InvalidFilter(format!("degenerate design for {band:?} at order {order}")));
        }
        for b in sections[0].b.iter_mut() {
            *b /= gain;
        }
        debug!("butterworth: {band:?} order {order} -> {} section(s)", sections.len());
        Ok(Self { sections, n_poles })
    }

    pub fn n_poles(&self) -> usize {
        self.n_poles
    }

    /// Magnitude of the (single-pass) frequency response at `freq` Hz.
    pub fn magnitude(&self, freq: f64, sfreq: f64) -> f64 {
        let z_inv = C64::from_polar(1.0, -2.0 * PI * freq / sfreq);
        self.sections.iter().map(|s| s.response(z_inv)).product::<C64>().norm()
    }

    /// Filter one channel; the output has the length of `x`.
    pub fn apply(&self, x: &[f64], function: FilterFunction) -> Vec<f64> {
        if x.is_empty() {
            return vec![];
        }
        let pad = match function {
            FilterFunction::Lfilter => {
                let mut y = x.to_vec();
                self.run(&mut y, None);
                return y;
            }
            FilterFunction::Filtfilt => 3 * (self.n_poles + 1),
            FilterFunction::Sosfiltfilt => 3 * (2 * self.sections.len() + 1),
        }
        .min(x.len() - 1);

        let mut ext = reflect_limited_pad(x, pad, pad);
        let edge = ext[0];
        self.run(&mut ext, Some(edge));
        ext.reverse();
        let edge = ext[0];
        self.run(&mut ext, Some(edge));
        ext.reverse();
        ext[pad..pad + x.len()].to_vec()
    }

    /// One causal pass through the cascade, in place. With `initial`, every
    /// section starts in the steady state for a constant input of that value.
    fn run(&self, x: &mut [f64], initial: Option<f64>) {
        let mut level = initial;
        for s in &self.sections {
            let [mut z1, mut z2] = match level {
                Some(v) => s.step_state().map(|z| z * v),
                None => [0.0, 0.0],
            };
            for v in x.iter_mut() {
                let input = *v;
                let y = s.b[0] * input + z1;
                z1 = s.b[1] * input - s.a[0] * y + z2;
                z2 = s.b[2] * input - s.a[1] * y;
                *v = y;
            }
            level = level.map(|v| v * s.dc_gain());
        }
    }
}

/// Roots of `s² − 2c·s + w0² = 0`: `c ± √(c² − w0²)`.
fn split_pole(c: C64, w0: f64) -> [C64; 2] {
    let d = (c * c - C64::new(w0 * w0, 0.0)).sqrt();
    [c + d, c - d]
}

/// Pair conjugate poles (and leftover real poles) into biquads.
fn group_sections(poles: &[C64], zeros: Zeros) -> Vec<Biquad> {
    const TOL: f64 = 1e-10;
    let mut complex: Vec<C64> = poles.iter().copied().filter(|p| p.im > TOL).collect();
    let mut real: Vec<f64> = poles.iter().filter(|p| p.im.abs() <= TOL).map(|p| p.re).collect();
    complex.sort_by(|a, b| a.norm().total_cmp(&b.norm()));
    real.sort_by(|a, b| a.abs().total_cmp(&b.abs()));

    let mut sections = Vec::with_capacity(complex.len() + real.len().div_ceil(2));
    let mut rest = real.as_slice();
    while let [r1, r2, tail @ ..] = rest {
        sections.push(Biquad { b: zeros.pair(), a: [-(r1 + r2), r1 * r2] });
        rest = tail;
    }
    if let [r] = rest {
        sections.push(Biquad { b: zeros.single(), a: [-r, 0.0] });
    }
    sections.extend(complex.iter().map(|p| Biquad { b: zeros.pair(), a: [-2.0 * p.re, p.norm_sqr()] }));
    sections
}

/// Filter every channel of `signal` with an `order`-th order Butterworth
/// filter; the result keeps the input's time base, units and annotations.
///
/// # Examples
///
/// ```
/// use ephys::{butterworth_filter, AnalogSignal, FilterBand, FilterFunction};
/// use ndarray::Array2;
///
/// let sig = AnalogSignal::new("lfp", Array2::from_elem((2, 512), 1.0_f32), 256.0).unwrap();
/// let out = butterworth_filter(&sig, FilterBand::Lowpass(30.0), 4, FilterFunction::Filtfilt).unwrap();
/// assert_eq!(out.data.dim(), (2, 512));
/// ```
pub fn butterworth_filter(
    signal: &AnalogSignal,
    band: FilterBand,
    order: usize,
    function: FilterFunction,
) -> Result<AnalogSignal> {
    let filter = Butterworth::design(band, order, signal.sampling_rate)?;
    let mut data = signal.data.clone();
    for mut row in data.rows_mut() {
        let x: Vec<f64> = row.iter().map(|&v| v as f64).collect();
        let y: Vec<f32> = filter.apply(&x, function).into_iter().map(|v| v as f32).collect();
        row.assign(&ArrayView1::from(&y));
    }
    let mut out = signal.with_data(format!("{}_filtered", signal.name), data);
    out.annotations.insert("filter".into(), format!("butterworth order {order} {function}"));
    Ok(out)
}
