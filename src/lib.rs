//! # ephys: data selection for electrophysiology pipelines
//!
//! `ephys` addresses series inside hierarchical recordings and glues the
//! result of a processing step back into a container. Every pipeline tool in
//! `src/bin/` runs the same flow around its own computation:
//!
//! ```text
//! recording.safetensors
//!   │
//!   ├─ io::load_block()          pick one block (by index or name)
//!   ├─ range::parse_range()      "0", "2:5", "0:10:2", "all"  (stop inclusive)
//!   ├─ select()                  segment range × series range → flat Vec
//!   ├─ <processing step>         filter_signal / butterworth_filter / instantaneous_rate / wavelet_amplitude
//!   ├─ assemble()                new | replace | add[:segment]
//!   └─ io::save_data()           new | replace | update
//!        │
//!        └─→ output.safetensors
//! ```
//!
//! ## Data model
//!
//! A [`Block`] owns [`Segment`]s, and each segment owns two independent
//! series lists: [`AnalogSignal`]s (`[C, T]` samples) and [`SpikeTrain`]s
//! (event times). Selection borrows from the block; assembly takes
//! ownership of the produced series.
//!
//! ## Quick start
//!
//! ```
//! use ephys::{assemble, parse_range, select, AnalogSignal, Block, MergeAction, Segment, SeriesRequest};
//! use ndarray::Array2;
//!
//! let sig = |name: &str| AnalogSignal::new(name, Array2::zeros((1, 8)), 1000.0).unwrap();
//! let block = Block::new().with_segments(vec![
//!     Segment::with_series(vec![sig("a0"), sig("a1"), sig("a2")], vec![]),
//!     Segment::with_series(vec![sig("b0"), sig("b1")], vec![]),
//! ]);
//!
//! // First two analog signals of every segment.
//! let segments = parse_range("all").unwrap();
//! let request = SeriesRequest::analog_signals(parse_range("0:1").unwrap());
//! let picked = select(&block, &segments, &request).unwrap();
//! let names: Vec<_> = picked.iter().map(|s| s.name()).collect();
//! assert_eq!(names, ["a0", "a1", "b0", "b1"]);
//!
//! // Hand a derived series to a fresh block.
//! let derived = picked[0].as_analog_signal().unwrap().with_data("a0_copy", Array2::ones((1, 8)));
//! let out = assemble(None, vec![derived], vec![], MergeAction::New).unwrap();
//! assert_eq!(out.segments[0].analog_signals[0].name, "a0_copy");
//! ```

pub mod assemble;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod io;
pub mod model;
pub mod quantity;
pub mod range;
pub mod rate;
pub mod select;
pub mod wavelet;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// model
pub use model::{AnalogSignal, Annotations, Block, Segment, SpikeTrain};

// errors
pub use error::{Error, Result};

// range parser
pub use range::{parse_range, OutOfBounds, ResolvedIndex, Span};

// selector
pub use select::{
    select, select_analog_signals, select_data, select_spike_trains, select_spike_trains_by_segment, SeriesKind, SeriesRef,
    SeriesRequest,
};

// assembler
pub use assemble::{assemble, MergeAction};

// io: block files
pub use io::{load_block, load_blocks, save_data, BlockChoice, Format, Savable, WriteAction};

// config
pub use config::{RateConfig, WaveletConfig};

// processing steps
pub use filter::{butterworth_filter, filter_signal, Butterworth, FilterBand, FilterFunction};
pub use quantity::Quantity;
pub use rate::{instantaneous_rate, trial_rates, Kernel, KernelShape};
pub use wavelet::{wavelet_amplitude, wavelet_transform};
