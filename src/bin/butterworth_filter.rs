/// butterworth_filter: Butterworth IIR filtering of the selected analog signals.
///
/// Band choice follows fir_filter: a highpass or lowpass frequency alone gives
/// that filter; with both, `highpass < lowpass` is a bandpass and
/// `highpass > lowpass` a bandstop. `lfilter` runs forward only;
/// `filtfilt` and `sosfiltfilt` run forward and backward for zero phase.
///
/// Example:
///   butterworth_filter --input_file rec.safetensors --analog_signal_index all \
///       --highpass_frequency "300 Hz" --lowpass_frequency "3 kHz" \
///       --order 4 --filter_function sosfiltfilt \
///       --output_file rec.safetensors --action add --write_action replace
use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use ephys::cli::{init_logging, parse_known_args, InputArgs, OutputArgs, SelectionArgs};
use ephys::{butterworth_filter, select_analog_signals, FilterBand, FilterFunction, Quantity, SeriesKind};

#[derive(Parser, Debug)]
#[command(name = "butterworth_filter", about = "Butterworth IIR filter for analog signals")]
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

    /// Filter order (per band edge for bandpass and bandstop).
    #[arg(long = "order")]
    order: usize,

    /// lfilter, filtfilt or sosfiltfilt.
    #[arg(long = "filter_function")]
    filter_function: FilterFunction,
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
            .map(|s| {
                butterworth_filter(s, band, args.order, args.filter_function)
                    .with_context(|| format!("filtering '{}'", s.name))
            })
            .collect::<Result<Vec<_>>>()?
    };
    info!(
        "Filtered {} analog signal(s) with order {} {band:?} ({})",
        filtered.len(),
        args.order,
        args.filter_function
    );

    args.output.write(block, filtered, vec![])
}
