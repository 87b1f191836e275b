//! Block file reader with format detection and block choice.
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, info};

use super::{json, safetensors, Format};
use crate::model::Block;

/// Which block of a multi-block file to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockChoice {
    Index(usize),
    Name(String),
}

impl BlockChoice {
    /// Choice from the two optional CLI flags; giving both is an error.
    pub fn from_options(index: Option<usize>, name: Option<String>) -> Result<Option<BlockChoice>> {
        match (index, name) {
            (Some(_), Some(_)) => bail!("cannot load by block name and block index simultaneously"),
            (Some(i), None) => Ok(Some(BlockChoice::Index(i))),
            (None, Some(n)) => Ok(Some(BlockChoice::Name(n))),
            (None, None) => Ok(None),
        }
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(bytes)
}

/// Decide the format of an existing file from its extension and content.
pub fn detect_format(path: &Path, bytes: &[u8]) -> Result<Format> {
    match (Format::from_extension(path), Format::sniff(bytes)) {
        (Some(by_ext), Some(by_content)) if by_ext != by_content => bail!(
            "{}: extension suggests {by_ext} but content looks like {by_content}; \
             please specify the input format explicitly",
            path.display()
        ),
        (Some(f), _) | (None, Some(f)) => Ok(f),
        (None, None) => bail!(
            "{}: could not detect the file format; please specify a valid input format",
            path.display()
        ),
    }
}

pub(crate) fn decode(format: Format, bytes: &[u8]) -> Result<Vec<Block>> {
    match format {
        Format::Safetensors => safetensors::read_blocks(bytes),
        Format::Json => json::read_blocks(bytes),
    }
}

/// Load every block stored in `path`.
///
/// With `format = None` the format is detected; with an explicit format the
/// content must parse in it.
pub fn load_blocks(path: &Path, format: Option<Format>) -> Result<Vec<Block>> {
    let bytes = read_bytes(path)?;
    let (format, explicit) = match format {
        Some(f) => (f, true),
        None => (detect_format(path, &bytes)?, false),
    };
    debug!("{}: decoding as {format} ({} bytes)", path.display(), bytes.len());

    let blocks = decode(format, &bytes).with_context(|| {
        if explicit {
            format!(
                "{}: input file and input format ({format}) do not match, \
                 please provide a valid file and the correct input format",
                path.display()
            )
        } else {
            format!("{}: failed to read {format} block file", path.display())
        }
    })?;
    info!("Loaded {} block(s) from {}", blocks.len(), path.display());
    Ok(blocks)
}

/// Load one block from `path`: the chosen one, or the first when `choice` is `None`.
pub fn load_block(path: &Path, format: Option<Format>, choice: Option<&BlockChoice>) -> Result<Block> {
    let mut blocks = load_blocks(path, format)?;
    let n = blocks.len();
    match choice {
        None | Some(BlockChoice::Index(0)) if n > 0 => Ok(blocks.swap_remove(0)),
        None => bail!("{}: file contains no blocks", path.display()),
        Some(BlockChoice::Index(i)) => {
            if *i < n {
                Ok(blocks.swap_remove(*i))
            } else {
                bail!("block index {i} is not valid ({} contains {n} blocks)", path.display())
            }
        }
        Some(BlockChoice::Name(name)) => {
            let pos = blocks
                .iter()
                .position(|b| b.name.as_deref() == Some(name.as_str()))
                .with_context(|| format!("no block named '{name}' in {}", path.display()))?;
            Ok(blocks.swap_remove(pos))
        }
    }
}
