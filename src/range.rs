//! Range tokens: `3`, `"all"`, `"start:stop"`, `"start:stop:step"`.
//!
//! The user-facing `stop` is **inclusive** (`"0:2"` selects 0, 1 and 2);
//! [`parse_range`] converts it to the exclusive bound used by [`Span`].
//! Empty parts take their natural default (`start` → 0, `stop` → end,
//! `step` → 1).
//!
//! | token      | resolved                          |
//! |------------|-----------------------------------|
//! | `"4"`      | `Single(4)`                       |
//! | `"all"`    | `Span { None, None, None }`       |
//! | `"1:5"`    | `Span { 1, 6, None }`             |
//! | `":3:2"`   | `Span { None, 4, 2 }`             |
//!
//! Resolution against a sequence clamps spans to its length, so an upper
//! bound past the end selects what is there; a single index past the end
//! is an error.
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Half-open span `[start, stop)` with stride, each bound optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Option<usize>,
    /// Exclusive upper bound.
    pub stop: Option<usize>,
    /// Stride, never zero.
    pub step: Option<usize>,
}

impl Span {
    /// The unbounded span (`"all"`).
    pub const ALL: Span = Span { start: None, stop: None, step: None };

    /// Positions selected from a sequence of length `len`, in order.
    pub fn indices(&self, len: usize) -> impl Iterator<Item = usize> {
        let start = self.start.unwrap_or(0).min(len);
        let stop = self.stop.unwrap_or(len).min(len);
        let step = self.step.unwrap_or(1).max(1);
        (start..stop.max(start)).step_by(step)
    }

    /// Number of positions selected from a sequence of length `len`.
    pub fn len_for(&self, len: usize) -> usize {
        self.indices(len).count()
    }
}

/// A parsed range token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvedIndex {
    Single(usize),
    Span(Span),
}

/// A single index past the end of the sequence it was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    pub index: usize,
    pub len: usize,
}

impl ResolvedIndex {
    pub const ALL: ResolvedIndex = ResolvedIndex::Span(Span::ALL);

    /// Resolve against a sequence of length `len`.
    ///
    /// Spans saturate at `len`; only a single index can fail.
    pub fn positions(&self, len: usize) -> std::result::Result<Vec<usize>, OutOfBounds> {
        match *self {
            ResolvedIndex::Single(index) if index < len => Ok(vec![index]),
            ResolvedIndex::Single(index) => Err(OutOfBounds { index, len }),
            ResolvedIndex::Span(span) => Ok(span.indices(len).collect()),
        }
    }

    /// References to the selected items of `items`, in order.
    pub fn pick<'a, T>(&self, items: &'a [T]) -> std::result::Result<Vec<&'a T>, OutOfBounds> {
        Ok(self.positions(items.len())?.into_iter().map(|i| &items[i]).collect())
    }

    pub fn is_single(&self) -> bool {
        matches!(self, ResolvedIndex::Single(_))
    }
}

impl From<usize> for ResolvedIndex {
    fn from(index: usize) -> Self {
        ResolvedIndex::Single(index)
    }
}

impl From<Span> for ResolvedIndex {
    fn from(span: Span) -> Self {
        ResolvedIndex::Span(span)
    }
}

impl FromStr for ResolvedIndex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_range(s)
    }
}

impl fmt::Display for ResolvedIndex {
    /// Renders in token syntax (inclusive stop), so `parse_range(x.to_string()) == x`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedIndex::Single(i) => write!(f, "{i}"),
            ResolvedIndex::Span(Span { start: None, stop: None, step: None }) => f.write_str("all"),
            // An exclusive stop of 0 has no inclusive spelling; write the
            // equivalent empty span.
            ResolvedIndex::Span(Span { stop: Some(0), .. }) => f.write_str("1:0"),
            ResolvedIndex::Span(span) => {
                if let Some(start) = span.start {
                    write!(f, "{start}")?;
                }
                f.write_str(":")?;
                if let Some(stop) = span.stop {
                    write!(f, "{}", stop - 1)?;
                }
                if let Some(step) = span.step {
                    write!(f, ":{step}")?;
                }
                Ok(())
            }
        }
    }
}

/// Parse a range token into a [`ResolvedIndex`].
///
/// # Errors
///
/// [`Error::InvalidRange`] when the token is empty, has more than three
/// `:`-separated parts, contains a part that is not a non-negative integer,
/// has a zero step, or its inclusive stop cannot be made exclusive.
///
/// # Examples
///
/// ```
/// use ephys::range::{parse_range, ResolvedIndex, Span};
///
/// assert_eq!(parse_range("2").unwrap(), ResolvedIndex::Single(2));
/// assert_eq!(
///     parse_range("1:5").unwrap(),
///     ResolvedIndex::Span(Span { start: Some(1), stop: Some(6), step: None }),
/// );
/// assert_eq!(parse_range("all").unwrap(), ResolvedIndex::ALL);
/// ```
pub fn parse_range(token: &str) -> Result<ResolvedIndex> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_range(token, "empty token"));
    }
    if trimmed == "all" {
        return Ok(ResolvedIndex::ALL);
    }
    if !trimmed.contains(':') {
        return parse_part(token, trimmed).map(ResolvedIndex::Single);
    }

    let parts: Vec<&str> = trimmed.split(':').map(str::trim).collect();
    if parts.len() > 3 {
        return Err(Error::invalid_range(
            token,
            format!("expected at most 3 ':'-separated parts, got {}", parts.len()),
        ));
    }

    let optional = |i: usize| -> Result<Option<usize>> {
        match parts.get(i) {
            Some(p) if !p.is_empty() => parse_part(token, p).map(Some),
            _ => Ok(None),
        }
    };

    let start = optional(0)?;
    let stop = match optional(1)? {
        Some(inclusive) => Some(
            inclusive
                .checked_add(1)
                .ok_or_else(|| Error::invalid_range(token, "stop bound too large"))?,
        ),
        None => None,
    };
    let step = optional(2)?;
    if step == Some(0) {
        return Err(Error::invalid_range(token, "step must be at least 1"));
    }

    Ok(ResolvedIndex::Span(Span { start, stop, step }))
}

fn parse_part(token: &str, part: &str) -> Result<usize> {
    part.parse::<usize>().map_err(|_| {
        Error::invalid_range(token, format!("'{part}' is not a non-negative integer"))
    })
}
