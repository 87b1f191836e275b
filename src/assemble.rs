//! Build the output [`Block`] of a processing step from freshly computed series.
//!
//! Three merge actions:
//!
//! | action          | existing block | result                                       |
//! |-----------------|----------------|----------------------------------------------|
//! | `new`           | ignored        | fresh block, one segment with the new series |
//! | `replace`       | required       | same block, segments swapped for one new one |
//! | `add[:<seg>]`   | required       | same block, series appended to segment `seg` |
//!
//! Every precondition is checked before the existing block is touched.
//! New series are moved into the block; the caller gives up ownership.
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::error::{Error, Result};
use crate::model::{AnalogSignal, Block, Segment, SpikeTrain};

/// How new series are merged with an existing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergeAction {
    #[default]
    New,
    Replace,
    /// Append to the segment at this index (first segment by default).
    Add { segment: usize },
}

impl MergeAction {
    pub fn name(&self) -> &'static str {
        match self {
            MergeAction::New => "new",
            MergeAction::Replace => "replace",
            MergeAction::Add { .. } => "add",
        }
    }
}

impl FromStr for MergeAction {
    type Err = Error;

    /// Accepts `new`, `replace`, `add` (first segment) and `add:<segment>`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "new" => Ok(MergeAction::New),
            "replace" => Ok(MergeAction::Replace),
            "add" => Ok(MergeAction::Add { segment: 0 }),
            other => other
                .strip_prefix("add:")
                .and_then(|seg| seg.trim().parse().ok())
                .map(|segment| MergeAction::Add { segment })
                .ok_or_else(|| Error::InvalidAction(s.to_string())),
        }
    }
}

impl fmt::Display for MergeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeAction::Add { segment } => write!(f, "add:{segment}"),
            other => f.write_str(other.name()),
        }
    }
}

fn require_input(signals: &[AnalogSignal], spike_trains: &[SpikeTrain]) -> Result<()> {
    if signals.is_empty() && spike_trains.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(())
}

impl Block {
    /// Fresh block holding one segment with the given series, in order.
    pub fn from_series(signals: Vec<AnalogSignal>, spike_trains: Vec<SpikeTrain>) -> Result<Block> {
        require_input(&signals, &spike_trains)?;
        Ok(Block::new().with_segments(vec![Segment::with_series(signals, spike_trains)]))
    }

    /// Drop every segment and replace them with one holding the given series.
    ///
    /// Name and annotations of the block are kept. On error `self` is unchanged.
    pub fn replace_series(&mut self, signals: Vec<AnalogSignal>, spike_trains: Vec<SpikeTrain>) -> Result<()> {
        require_input(&signals, &spike_trains)?;
        self.segments = vec![Segment::with_series(signals, spike_trains)];
        Ok(())
    }

    /// Append the given series to the segment at index `segment`.
    ///
    /// On error `self` is unchanged.
    pub fn append_series(
        &mut self,
        segment: usize,
        signals: Vec<AnalogSignal>,
        spike_trains: Vec<SpikeTrain>,
    ) -> Result<()> {
        require_input(&signals, &spike_trains)?;
        let len = self.segments.len();
        let target = self
            .segments
            .get_mut(segment)
            .ok_or(Error::SegmentOutOfRange { index: segment, len })?;
        target.analog_signals.extend(signals);
        target.spike_trains.extend(spike_trains);
        Ok(())
    }
}

/// Merge new series into a block according to `action`.
///
/// `existing` is ignored by [`MergeAction::New`] and required otherwise.
/// For `replace` and `add` the returned block is `existing`, modified in place.
///
/// # Errors
///
/// * [`Error::EmptyInput`] – both `signals` and `spike_trains` are empty.
/// * [`Error::MissingBlock`] – `replace`/`add` without an existing block.
/// * [`Error::SegmentOutOfRange`] – `add` targets a segment that does not exist.
///
/// # Examples
///
/// ```
/// use ephys::{assemble, AnalogSignal, MergeAction};
/// use ndarray::Array2;
///
/// let sig = AnalogSignal::new("lfp", Array2::zeros((1, 10)), 1000.0).unwrap();
/// let block = assemble(None, vec![sig], vec![], MergeAction::New).unwrap();
/// assert_eq!(block.segments.len(), 1);
/// ```
pub fn assemble(
    existing: Option<Block>,
    signals: Vec<AnalogSignal>,
    spike_trains: Vec<SpikeTrain>,
    action: MergeAction,
) -> Result<Block> {
    require_input(&signals, &spike_trains)?;
    debug!(
        "assemble action={action} signals={} spike_trains={}",
        signals.len(),
        spike_trains.len()
    );

    match action {
        MergeAction::New => Block::from_series(signals, spike_trains),
        MergeAction::Replace => {
            let mut block = existing.ok_or(Error::MissingBlock("replace"))?;
            block.replace_series(signals, spike_trains)?;
            Ok(block)
        }
        MergeAction::Add { segment } => {
            let mut block = existing.ok_or(Error::MissingBlock("add"))?;
            block.append_series(segment, signals, spike_trains)?;
            Ok(block)
        }
    }
}
