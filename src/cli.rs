//! Shared pieces of the command-line tools.
//!
//! Each tool declares its own `clap` parser and flattens the groups it needs:
//!
//! ```text
//! InputArgs      --input_file --input_format --block_index --block_name
//! SelectionArgs  --segment_index --analog_signal_index --spike_train_index
//! OutputArgs     --output_file --output_format --action --write_action
//! ```
//!
//! Tools run inside workflow engines that may pass extra flags, so parsing
//! goes through [`parse_known_args`], which drops unknown `--flags` (and
//! their values) instead of failing.
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser};
use log::warn;

use crate::assemble::{assemble, MergeAction};
use crate::error::Error;
use crate::io::{load_block, save_data, BlockChoice, Format, WriteAction};
use crate::model::{AnalogSignal, Block, SpikeTrain};
use crate::range::ResolvedIndex;
use crate::select::{SeriesKind, SeriesRequest};

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path of the file with the input data.
    #[arg(long = "input_file")]
    pub input_file: PathBuf,

    /// Format of the input data (safetensors, json); detected when omitted.
    #[arg(long = "input_format")]
    pub input_format: Option<Format>,

    /// Index of the block to process (default: first block).
    #[arg(long = "block_index")]
    pub block_index: Option<usize>,

    /// Name of the block to process.
    #[arg(long = "block_name")]
    pub block_name: Option<String>,
}

impl InputArgs {
    pub fn load(&self) -> Result<Block> {
        let choice = BlockChoice::from_options(self.block_index, self.block_name.clone())?;
        load_block(&self.input_file, self.input_format, choice.as_ref())
    }
}

#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Segment index or range ("0", "0:3", "all"; stop is inclusive).
    #[arg(long = "segment_index", default_value = "0")]
    pub segment_index: ResolvedIndex,

    /// Analog signal index or range within each selected segment.
    #[arg(long = "analog_signal_index")]
    pub analog_signal_index: Option<ResolvedIndex>,

    /// Spike train index or range within each selected segment.
    #[arg(long = "spike_train_index")]
    pub spike_train_index: Option<ResolvedIndex>,
}

impl SelectionArgs {
    /// Exactly one of the two series flags must be given.
    pub fn request(&self) -> crate::Result<SeriesRequest> {
        SeriesRequest::from_options(self.analog_signal_index, self.spike_train_index)
    }

    /// Request for a tool that only processes `kind`: with no series flag
    /// the first series of that kind is selected.
    pub fn request_for(&self, kind: SeriesKind) -> crate::Result<SeriesRequest> {
        if self.analog_signal_index.is_none() && self.spike_train_index.is_none() {
            return Ok(SeriesRequest { kind, range: ResolvedIndex::Single(0) });
        }
        let request = self.request()?;
        if request.kind != kind {
            return Err(Error::InvalidParameter(format!(
                "this tool processes {kind}s, but a {} index was given",
                request.kind
            )));
        }
        Ok(request)
    }
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Path of the file to write.
    #[arg(long = "output_file")]
    pub output_file: PathBuf,

    /// Format of the output data (safetensors, json); inferred from the extension when omitted.
    #[arg(long = "output_format")]
    pub output_format: Option<Format>,

    /// How results merge with the input block: new, replace, add or add:<segment>.
    #[arg(long = "action", default_value = "new")]
    pub action: MergeAction,

    /// What to do about an existing output file: new, replace or update.
    #[arg(long = "write_action", default_value = "new")]
    pub write_action: WriteAction,
}

impl OutputArgs {
    /// Merge the results into `input` per `--action` and write them out.
    pub fn write(&self, input: Block, signals: Vec<AnalogSignal>, spike_trains: Vec<SpikeTrain>) -> Result<()> {
        let block = assemble(Some(input), signals, spike_trains, self.action)?;
        save_data(block, &self.output_file, self.output_format, self.write_action)
    }
}

/// Install the `env_logger` backend (`RUST_LOG` overrides the `info` default).
///
/// Fails if a logger is already installed for this process.
pub fn init_logging() -> std::result::Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init()
}

/// Split `args` into those `T` knows and the unknown `--flags` with their values.
fn split_known<T: Parser>(args: impl IntoIterator<Item = OsString>) -> (Vec<OsString>, Vec<String>) {
    let cmd = T::command();
    let known: HashSet<String> = cmd
        .get_arguments()
        .filter_map(|a| a.get_long().map(str::to_string))
        .chain(["help".to_string(), "version".to_string()])
        .collect();

    let mut iter = args.into_iter();
    let mut kept: Vec<OsString> = iter.next().into_iter().collect();
    let mut ignored = Vec::new();
    let mut skipping_values = false;

    for arg in iter {
        let text = arg.to_string_lossy().into_owned();
        // (flag name, value given inline as `--flag=value`)
        let flag = text
            .strip_prefix("--")
            .filter(|f| !f.is_empty())
            .map(|f| (f.split('=').next().unwrap_or(f).to_string(), f.contains('=')));
        match flag {
            Some((name, _)) if known.contains(&name) => {
                skipping_values = false;
                kept.push(arg);
            }
            Some((_, inline)) => {
                skipping_values = !inline;
                ignored.push(text);
            }
            None if skipping_values => ignored.push(text),
            None => kept.push(arg),
        }
    }
    (kept, ignored)
}

/// Parse `args` (program name first), ignoring unknown `--flags`.
///
/// Returns the parsed arguments and the ignored tokens.
pub fn try_parse_known_args_from<T, I, S>(args: I) -> std::result::Result<(T, Vec<String>), clap::Error>
where
    T: Parser,
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let (kept, ignored) = split_known::<T>(args.into_iter().map(Into::into));
    let parsed = T::try_parse_from(kept)?;
    Ok((parsed, ignored))
}

/// Parse the process arguments, ignoring unknown `--flags`; exits on error
/// like [`Parser::parse`].
pub fn parse_known_args<T: Parser>() -> T {
    match try_parse_known_args_from::<T, _, _>(std::env::args_os()) {
        Ok((parsed, ignored)) => {
            if !ignored.is_empty() {
                warn!("ignoring unknown arguments: {}", ignored.join(" "));
            }
            parsed
        }
        Err(e) => e.exit(),
    }
}
