/// fir_filter: zero-phase FIR filtering of the selected analog signals.
///
/// A highpass frequency alone gives a highpass, a lowpass frequency alone a
/// lowpass. With both, `highpass < lowpass` gives a bandpass and
/// `highpass > lowpass` a bandstop between the two.
///
/// Example:
///   fir_filter --input_file rec.safetensors --analog_signal_index all \
///       --highpass_frequency "300 Hz" --lowpass_frequency "3 kHz" \
///       --output_file rec.safetensors --action add --write_action replace
use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use ephys::cli::{init_logging, parse_known_args, InputArgs, OutputArgs, SelectionArgs};
use ephys::{filter_signal, select_analog_signals, FilterBand, Quantity, SeriesKind};

#[derive(Parser, Debug)]
#[command(name = "fir_filter", about = "Zero-phase FIR filter for analog signals")]
struct Args {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Highpass edge, e.g. "1 Hz".
    #[arg(long = "highpass_frequency")]
    highpass_frequency: Option<Quantity>,

    /// Lowpass edge, e.g. "40 Hz".
    #[arg(long = "lowpass_frequency")]
    lowpass_frequency: Option<Quantity>,

    /// Number of taps (odd); derived from the transition bandwidth when omitted.
    #[arg(long = "filter_length")]
    filter_length: Option<usize>,
}

fn main() -> Result<()> {
    init_logging()?;
    let args: Args = parse_known_args();

    let highpass = args.highpass_frequency.as_ref().map(Quantity::to_hz).transpose()?;
    let lowpass = args.lowpass_frequency.as_ref().map(Quantity::to_hz).transpose()?;
    let band = FilterBand::from_cutoffs(highpass, lowpass)?;

    let block = args.input.load()?;
    let request = args.selection.request_for(SeriesKind::AnalogSignal)?;

    let filtered = {
        let signals = select_analog_signals(&block, &args.selection.segment_index, &request.range)?;
        signals
            .into_iter()
            .map(|s| filter_signal(s, band, args.filter_length).with_context(|| format!("filtering '{}'", s.name)))
            .collect::<Result<Vec<_>>>()?
    };
    info!("Filtered {} analog signal(s) with {band:?}", filtered.len());

    args.output.write(block, filtered, vec![])
}
