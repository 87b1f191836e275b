//! Filtering of analog signals.
//!
//! - [`design`]: Hamming-windowed sinc kernels for highpass, lowpass,
//!   bandpass and bandstop bands with automatic transition bandwidth.
//! - [`apply`]: overlap-add FFT convolution with zero-phase shift and
//!   reflect-limited edge padding.
//! - [`butter`]: Butterworth IIR filters in second-order sections, run
//!   forward only or forward-backward.

pub mod apply;
pub mod butter;
pub mod design;

pub use apply::{apply_fir_zero_phase, filter_signal, FirFilter};
pub use butter::{butterworth_filter, Biquad, Butterworth, FilterFunction};
pub use design::{
    auto_filter_length, design, firwin, hamming, high_trans_bandwidth, low_trans_bandwidth, FilterBand,
};
