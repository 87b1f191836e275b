//! Loading and saving blocks.
//!
//! Two on-disk formats, selected by an explicit [`Format`] tag or inferred
//! from the file extension (and, when loading, from the file content):
//!
//! | format        | extension      | content                                   |
//! |---------------|----------------|-------------------------------------------|
//! | `safetensors` | `.safetensors` | sample tensors + JSON layout in metadata  |
//! | `json`        | `.json`        | whole block list as JSON                  |
//!
//! # Quick start
//! ```no_run
//! use ephys::io::{load_block, save_data, WriteAction};
//! use std::path::Path;
//!
//! let block = load_block(Path::new("in.safetensors"), None, None).unwrap();
//! save_data(block, Path::new("out.json"), None, WriteAction::New).unwrap();
//! ```
pub mod json;
pub mod load;
pub mod safetensors;
pub mod save;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::Error;

pub use load::{load_block, load_blocks, BlockChoice};
pub use save::{save_data, Savable, WriteAction};

/// On-disk format of a block file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Safetensors,
    Json,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::Safetensors, Format::Json];

    pub fn name(&self) -> &'static str {
        match self {
            Format::Safetensors => "safetensors",
            Format::Json => "json",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.name()
    }

    /// Format implied by the extension of `path`, if any.
    pub fn from_extension(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Format::ALL.into_iter().find(|f| f.extension() == ext)
    }

    /// Format implied by the leading bytes of a file, if any.
    pub fn sniff(bytes: &[u8]) -> Option<Format> {
        if safetensors::sniff(bytes) {
            Some(Format::Safetensors)
        } else if json::sniff(bytes) {
            Some(Format::Json)
        } else {
            None
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let lower = s.trim().to_ascii_lowercase();
        Format::ALL
            .into_iter()
            .find(|f| f.name() == lower)
            .ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
