//! JSON encoding of a list of blocks (human-readable, larger on disk).
use std::io::Write;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Block;

const FORMAT_TAG: &str = "ephys";
const VERSION: u32 = 1;

#[derive(Serialize)]
struct FileRef<'a> {
    format: &'static str,
    version: u32,
    blocks: &'a [Block],
}

#[derive(Deserialize)]
struct FileOwned {
    format: String,
    version: u32,
    blocks: Vec<Block>,
}

pub fn write_blocks<W: Write>(blocks: &[Block], out: &mut W) -> Result<()> {
    let file = FileRef { format: FORMAT_TAG, version: VERSION, blocks };
    serde_json::to_writer(&mut *out, &file).context("failed to encode blocks as JSON")?;
    Ok(())
}

pub fn read_blocks(bytes: &[u8]) -> Result<Vec<Block>> {
    let file: FileOwned = serde_json::from_slice(bytes).context("failed to parse JSON block file")?;
    if file.format != FORMAT_TAG {
        bail!("unexpected format tag '{}' (expected '{FORMAT_TAG}')", file.format);
    }
    if file.version > VERSION {
        bail!("unsupported JSON block file version {} (newest supported: {VERSION})", file.version);
    }
    Ok(file.blocks)
}

/// Whether `bytes` look like a JSON object.
pub fn sniff(bytes: &[u8]) -> bool {
    bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{')
}
