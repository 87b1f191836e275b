//! Tunables of the processing steps.
//!
//! Every field has a default matching the pipeline tools, so callers can use
//! struct-update syntax and set only what they change:
//!
//! ```
//! use ephys::RateConfig;
//!
//! let cfg = RateConfig {
//!     trim: true,
//!     ..RateConfig::default()
//! };
//! ```

/// Options for [`crate::rate::instantaneous_rate`] and [`crate::rate::trial_rates`].
#[derive(Debug, Clone, PartialEq)]
pub struct RateConfig {
    /// Start of the output interval in seconds.
    ///
    /// Default: `None` (earliest `t_start` of the input spike trains).
    pub t_start: Option<f64>,

    /// End of the output interval in seconds.
    ///
    /// Default: `None` (latest `t_stop` of the input spike trains).
    pub t_stop: Option<f64>,

    /// Kernel support in units of its standard deviation: the kernel is
    /// evaluated on `[-cutoff·σ, +cutoff·σ]` and zero outside.
    ///
    /// Default: `5.0`.
    pub cutoff: f64,

    /// Keep only the region where the kernel fully overlaps the interval,
    /// dropping `cutoff·σ` seconds at each end.
    ///
    /// Default: `false`.
    pub trim: bool,

    /// Center the kernel on each spike. When `false` the kernel starts at
    /// the spike, so the estimate is shifted forward by the kernel half-width.
    ///
    /// Default: `true`.
    pub center_kernel: bool,

    /// Divide each sample by the kernel mass that falls inside the interval,
    /// compensating the underestimate near the borders.
    ///
    /// Default: `false`.
    pub border_correction: bool,

    /// Average the rates of all spike trains into a single channel.
    ///
    /// Default: `false` (one output channel per spike train).
    pub pool_spike_trains: bool,

    /// Average matching spike trains across trials (segments), see
    /// [`crate::rate::trial_rates`].
    ///
    /// Default: `false` (one output per trial).
    pub pool_trials: bool,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            t_start: None,
            t_stop: None,
            cutoff: 5.0,
            trim: false,
            center_kernel: true,
            border_correction: false,
            pool_spike_trains: false,
            pool_trials: false,
        }
    }
}

/// Options for [`crate::wavelet::wavelet_transform`].
#[derive(Debug, Clone, PartialEq)]
pub struct WaveletConfig {
    /// Size of the mother wavelet in cycles of the center frequency.
    /// Larger values trade time resolution for frequency resolution.
    ///
    /// Default: `6.0`.
    pub n_cycles: f64,

    /// Zero-pad the signal to the next power of two above its length before
    /// the FFT, avoiding wrap-around of the circular convolution.
    ///
    /// Default: `true`.
    pub zero_padding: bool,
}

impl Default for WaveletConfig {
    fn default() -> Self {
        Self { n_cycles: 6.0, zero_padding: true }
    }
}
