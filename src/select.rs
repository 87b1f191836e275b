//! Resolve `(segment range, series range)` addresses inside a [`Block`].
//!
//! Two index steps, each tagged with its own failure:
//!
//! 1. the segment range against `block.segments`
//!    → [`Error::SegmentOutOfRange`]
//! 2. the series range against each selected segment's analog signals or
//!    spike trains → [`Error::SeriesOutOfRange`]
//!
//! Results are always a flat `Vec` in segment order, even for a single
//! segment and a single series. Segments may hold series lists of different
//! lengths, so a single series index can be valid in one segment and not in
//! the next; the first failure aborts the whole selection.
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{AnalogSignal, Block, Segment, SpikeTrain};
use crate::range::{OutOfBounds, ResolvedIndex};

/// Which series list of a segment a selection addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    AnalogSignal,
    SpikeTrain,
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeriesKind::AnalogSignal => "analog signal",
            SeriesKind::SpikeTrain => "spike train",
        })
    }
}

/// A series range addressed at exactly one series kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesRequest {
    pub kind: SeriesKind,
    pub range: ResolvedIndex,
}

impl SeriesRequest {
    pub fn analog_signals(range: impl Into<ResolvedIndex>) -> Self {
        Self { kind: SeriesKind::AnalogSignal, range: range.into() }
    }

    pub fn spike_trains(range: impl Into<ResolvedIndex>) -> Self {
        Self { kind: SeriesKind::SpikeTrain, range: range.into() }
    }

    /// Build a request from two optional ranges, exactly one of which must be set.
    pub fn from_options(
        analog_signal: Option<ResolvedIndex>,
        spike_train: Option<ResolvedIndex>,
    ) -> Result<Self> {
        match (analog_signal, spike_train) {
            (Some(range), None) => Ok(Self::analog_signals(range)),
            (None, Some(range)) => Ok(Self::spike_trains(range)),
            (Some(_), Some(_)) => Err(Error::AmbiguousSelection("both")),
            (None, None) => Err(Error::AmbiguousSelection("neither")),
        }
    }
}

/// Borrowed reference to one selected series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesRef<'a> {
    AnalogSignal(&'a AnalogSignal),
    SpikeTrain(&'a SpikeTrain),
}

impl<'a> SeriesRef<'a> {
    pub fn kind(&self) -> SeriesKind {
        match self {
            SeriesRef::AnalogSignal(_) => SeriesKind::AnalogSignal,
            SeriesRef::SpikeTrain(_) => SeriesKind::SpikeTrain,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            SeriesRef::AnalogSignal(s) => &s.name,
            SeriesRef::SpikeTrain(s) => &s.name,
        }
    }

    pub fn as_analog_signal(&self) -> Option<&'a AnalogSignal> {
        match *self {
            SeriesRef::AnalogSignal(s) => Some(s),
            SeriesRef::SpikeTrain(_) => None,
        }
    }

    pub fn as_spike_train(&self) -> Option<&'a SpikeTrain> {
        match *self {
            SeriesRef::SpikeTrain(s) => Some(s),
            SeriesRef::AnalogSignal(_) => None,
        }
    }
}

/// Select series from `block`.
///
/// # Errors
///
/// * [`Error::SegmentOutOfRange`] – `segments` is a single index past the
///   last segment.
/// * [`Error::SeriesOutOfRange`] – the series index is a single index past
///   the end of the addressed list in one of the selected segments.
///
/// Spans never fail: they saturate at the list length.
///
/// # Examples
///
/// ```
/// use ephys::{select, Block, Segment, SeriesRequest, ResolvedIndex};
///
/// let block = Block::new().with_segments(vec![Segment::new()]);
/// let picked = select(&block, &ResolvedIndex::Single(0), &SeriesRequest::analog_signals(ResolvedIndex::ALL)).unwrap();
/// assert!(picked.is_empty());
/// ```
pub fn select<'a>(
    block: &'a Block,
    segments: &ResolvedIndex,
    request: &SeriesRequest,
) -> Result<Vec<SeriesRef<'a>>> {
    let seg_positions = segments
        .positions(block.segments.len())
        .map_err(|OutOfBounds { index, len }| Error::SegmentOutOfRange { index, len })?;

    debug!(
        "select {} [{}] from segments [{}] -> {} segment(s)",
        request.kind,
        request.range,
        segments,
        seg_positions.len()
    );

    let mut out = Vec::new();
    for seg_idx in seg_positions {
        let segment = &block.segments[seg_idx];
        pick_in_segment(segment, seg_idx, request, &mut out)?;
    }
    Ok(out)
}

fn pick_in_segment<'a>(
    segment: &'a Segment,
    seg_idx: usize,
    request: &SeriesRequest,
    out: &mut Vec<SeriesRef<'a>>,
) -> Result<()> {
    let tag = |OutOfBounds { index, len }| Error::SeriesOutOfRange {
        kind: request.kind,
        segment: seg_idx,
        index,
        len,
    };
    match request.kind {
        SeriesKind::AnalogSignal => out.extend(
            request.range.pick(&segment.analog_signals).map_err(tag)?
                .into_iter()
                .map(SeriesRef::AnalogSignal),
        ),
        SeriesKind::SpikeTrain => out.extend(
            request.range.pick(&segment.spike_trains).map_err(tag)?
                .into_iter()
                .map(SeriesRef::SpikeTrain),
        ),
    }
    Ok(())
}

/// Typed shortcut for [`select`] over analog signals.
pub fn select_analog_signals<'a>(
    block: &'a Block,
    segments: &ResolvedIndex,
    range: &ResolvedIndex,
) -> Result<Vec<&'a AnalogSignal>> {
    let picked = select(block, segments, &SeriesRequest::analog_signals(*range))?;
    Ok(picked.iter().filter_map(SeriesRef::as_analog_signal).collect())
}

/// Typed shortcut for [`select`] over spike trains.
pub fn select_spike_trains<'a>(
    block: &'a Block,
    segments: &ResolvedIndex,
    range: &ResolvedIndex,
) -> Result<Vec<&'a SpikeTrain>> {
    let picked = select(block, segments, &SeriesRequest::spike_trains(*range))?;
    Ok(picked.iter().filter_map(SeriesRef::as_spike_train).collect())
}

/// Spike trains grouped by segment: one `Vec` per selected segment, in
/// segment order, each picked with `range`.
pub fn select_spike_trains_by_segment<'a>(
    block: &'a Block,
    segments: &ResolvedIndex,
    range: &ResolvedIndex,
) -> Result<Vec<Vec<&'a SpikeTrain>>> {
    let seg_positions = segments
        .positions(block.segments.len())
        .map_err(|OutOfBounds { index, len }| Error::SegmentOutOfRange { index, len })?;
    let request = SeriesRequest::spike_trains(*range);
    seg_positions
        .into_iter()
        .map(|seg_idx| {
            let mut picked = Vec::new();
            pick_in_segment(&block.segments[seg_idx], seg_idx, &request, &mut picked)?;
            Ok(picked.iter().filter_map(SeriesRef::as_spike_train).collect())
        })
        .collect()
}

/// Pipeline-style entry point: a segment range plus one optional range per
/// series kind, exactly one of which must be given.
pub fn select_data<'a>(
    block: &'a Block,
    segment: &ResolvedIndex,
    spike_train: Option<ResolvedIndex>,
    analog_signal: Option<ResolvedIndex>,
) -> Result<Vec<SeriesRef<'a>>> {
    let request = SeriesRequest::from_options(analog_signal, spike_train)?;
    select(block, segment, &request)
}
