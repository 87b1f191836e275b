//! In-memory data model: blocks of segments of analog signals and spike trains.
//!
//! ```text
//! Block
//!   └─ segments: Vec<Segment>
//!        ├─ analog_signals: Vec<AnalogSignal>   [C, T] f32, uniformly sampled
//!        └─ spike_trains:   Vec<SpikeTrain>     sorted spike times (s)
//! ```
//!
//! Every level owns its children by value, so a segment belongs to exactly
//! one block and moving series into a block transfers ownership.
use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Free-form string annotations carried alongside blocks and series.
pub type Annotations = BTreeMap<String, String>;

/// Annotation key naming where a spike train came from (unit, electrode, ...).
pub const SOURCE_ANNOTATION: &str = "source";

// ── AnalogSignal ──────────────────────────────────────────────────────────

/// Multi-channel, uniformly sampled time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogSignal {
    pub name: String,
    /// Samples, shape `[C, T]` (one row per channel).
    pub data: Array2<f32>,
    /// Sampling rate in Hz.
    pub sampling_rate: f64,
    /// Time of the first sample in seconds.
    pub t_start: f64,
    /// Measurement units of `data` (e.g. `"mV"`).
    pub units: String,
    #[serde(default)]
    pub annotations: Annotations,
}

impl AnalogSignal {
    /// Build a signal starting at `t = 0 s` with dimensionless units.
    pub fn new(name: impl Into<String>, data: Array2<f32>, sampling_rate: f64) -> Result<Self> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "sampling rate must be positive and finite, got {sampling_rate}"
            )));
        }
        Ok(Self {
            name: name.into(),
            data,
            sampling_rate,
            t_start: 0.0,
            units: "dimensionless".to_string(),
            annotations: Annotations::new(),
        })
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn with_t_start(mut self, t_start: f64) -> Self {
        self.t_start = t_start;
        self
    }

    #[inline]
    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Seconds between consecutive samples.
    #[inline]
    pub fn sampling_period(&self) -> f64 {
        1.0 / self.sampling_rate
    }

    /// Duration covered by the samples in seconds.
    pub fn duration(&self) -> f64 {
        self.n_samples() as f64 * self.sampling_period()
    }

    /// End time (exclusive) in seconds.
    pub fn t_stop(&self) -> f64 {
        self.t_start + self.duration()
    }

    /// Same metadata, new samples. Used by processing steps that keep the
    /// time base but change values.
    pub fn with_data(&self, name: impl Into<String>, data: Array2<f32>) -> Self {
        Self {
            name: name.into(),
            data,
            sampling_rate: self.sampling_rate,
            t_start: self.t_start,
            units: self.units.clone(),
            annotations: self.annotations.clone(),
        }
    }
}

// ── SpikeTrain ────────────────────────────────────────────────────────────

/// Discrete event times observed within `[t_start, t_stop]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeTrain {
    pub name: String,
    /// Spike times in seconds, ascending.
    pub times: Vec<f64>,
    pub t_start: f64,
    pub t_stop: f64,
    pub units: String,
    #[serde(default)]
    pub annotations: Annotations,
}

impl SpikeTrain {
    /// Build a spike train; `times` is sorted and must lie inside the window.
    pub fn new(name: impl Into<String>, mut times: Vec<f64>, t_start: f64, t_stop: f64) -> Result<Self> {
        if !(t_start.is_finite() && t_stop.is_finite()) || t_start > t_stop {
            return Err(Error::InvalidParameter(format!(
                "spike train window [{t_start}, {t_stop}] is not a valid interval"
            )));
        }
        if let Some(&t) = times.iter().find(|&&t| !(t_start..=t_stop).contains(&t)) {
            return Err(Error::InvalidParameter(format!(
                "spike time {t} lies outside [{t_start}, {t_stop}]"
            )));
        }
        times.sort_by(f64::total_cmp);
        Ok(Self {
            name: name.into(),
            times,
            t_start,
            t_stop,
            units: "s".to_string(),
            annotations: Annotations::new(),
        })
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.annotations.insert(SOURCE_ANNOTATION.to_string(), source.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.annotations.get(SOURCE_ANNOTATION).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.t_stop - self.t_start
    }
}

// ── Segment / Block ───────────────────────────────────────────────────────

/// A grouping of series recorded over a common time span (a trial, a run).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub analog_signals: Vec<AnalogSignal>,
    #[serde(default)]
    pub spike_trains: Vec<SpikeTrain>,
}

impl Segment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(analog_signals: Vec<AnalogSignal>, spike_trains: Vec<SpikeTrain>) -> Self {
        Self { name: None, analog_signals, spike_trains }
    }

    pub fn is_empty(&self) -> bool {
        self.analog_signals.is_empty() && self.spike_trains.is_empty()
    }
}

/// Top-level unit of persisted data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = segments;
        self
    }

    pub fn n_analog_signals(&self) -> usize {
        self.segments.iter().map(|s| s.analog_signals.len()).sum()
    }

    pub fn n_spike_trains(&self) -> usize {
        self.segments.iter().map(|s| s.spike_trains.len()).sum()
    }
}
