//! Block file writer.
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use log::info;

use super::{json, load, safetensors, Format};
use crate::error::Error;
use crate::model::{AnalogSignal, Block, Segment, SpikeTrain};

/// What to do about an existing output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WriteAction {
    /// Create the file; fail if it exists.
    #[default]
    New,
    /// Overwrite the file; fail if it does not exist.
    Replace,
    /// Append the block to those already in the file; fail if it does not exist.
    Update,
}

impl FromStr for WriteAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim() {
            "new" => Ok(WriteAction::New),
            "replace" => Ok(WriteAction::Replace),
            "update" => Ok(WriteAction::Update),
            _ => Err(Error::InvalidWriteAction(s.to_string())),
        }
    }
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriteAction::New => "new",
            WriteAction::Replace => "replace",
            WriteAction::Update => "update",
        })
    }
}

/// Anything that can be written: loose series and segments are wrapped in a
/// fresh block first.
#[derive(Debug, Clone, PartialEq)]
pub enum Savable {
    AnalogSignal(AnalogSignal),
    SpikeTrain(SpikeTrain),
    Segment(Segment),
    Block(Block),
}

impl Savable {
    pub fn into_block(self) -> Block {
        let segment = match self {
            Savable::Block(block) => return block,
            Savable::Segment(segment) => segment,
            Savable::AnalogSignal(sig) => Segment::with_series(vec![sig], vec![]),
            Savable::SpikeTrain(st) => Segment::with_series(vec![], vec![st]),
        };
        Block::new().with_segments(vec![segment])
    }
}

impl From<AnalogSignal> for Savable {
    fn from(v: AnalogSignal) -> Self {
        Savable::AnalogSignal(v)
    }
}

impl From<SpikeTrain> for Savable {
    fn from(v: SpikeTrain) -> Self {
        Savable::SpikeTrain(v)
    }
}

impl From<Segment> for Savable {
    fn from(v: Segment) -> Self {
        Savable::Segment(v)
    }
}

impl From<Block> for Savable {
    fn from(v: Block) -> Self {
        Savable::Block(v)
    }
}

fn encode<W: Write>(format: Format, blocks: &[Block], out: &mut W) -> Result<()> {
    match format {
        Format::Safetensors => safetensors::write_blocks(blocks, out),
        Format::Json => json::write_blocks(blocks, out),
    }
}

/// Write `data` to `path`.
///
/// Without `format`, it is inferred from the extension of `path`.
///
/// # Errors
///
/// Fails before touching the file system if the format cannot be inferred,
/// if `action` is `new` and `path` exists, or if `action` is `replace` /
/// `update` and `path` does not exist.
pub fn save_data(
    data: impl Into<Savable>,
    path: &Path,
    format: Option<Format>,
    action: WriteAction,
) -> Result<()> {
    let format = match format {
        Some(f) => f,
        None => Format::from_extension(path).with_context(|| {
            format!(
                "{}: could not infer output format from file extension and none was provided",
                path.display()
            )
        })?,
    };

    let exists = path.exists();
    match action {
        WriteAction::New if exists => {
            bail!("file {} already exists and action is 'new'", path.display())
        }
        WriteAction::Replace | WriteAction::Update if !exists => {
            bail!("file {} does not exist and action is '{action}'", path.display())
        }
        _ => {}
    }

    let block = data.into().into_block();
    let mut blocks = if action == WriteAction::Update {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        load::decode(format, &bytes)
            .with_context(|| format!("{}: existing file is not a {format} block file", path.display()))?
    } else {
        Vec::with_capacity(1)
    };
    blocks.push(block);

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    encode(format, &blocks, &mut writer)?;
    writer.flush().with_context(|| format!("writing {}", path.display()))?;

    info!("Written {} block(s) as {format} → {}", blocks.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn parse_write_actions() {
        assert_eq!("update".parse::<WriteAction>().unwrap(), WriteAction::Update);
        assert!(matches!("add".parse::<WriteAction>(), Err(Error::InvalidWriteAction(_))));
    }

    #[test]
    fn loose_series_wrapped_in_block() {
        let sig = AnalogSignal::new("a", Array2::zeros((1, 2)), 10.0).unwrap();
        let block = Savable::from(sig.clone()).into_block();
        assert_eq!(block.segments.len(), 1);
        assert_eq!(block.segments[0].analog_signals, vec![sig]);
        assert!(block.segments[0].spike_trains.is_empty());
    }
}
