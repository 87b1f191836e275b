/// wavelet_transform: Morlet wavelet amplitude of the selected analog
/// signals at one frequency.
///
/// Example:
///   wavelet_transform --input_file lfp.safetensors --analog_signal_index 0 \
///       --frequency "10 Hz" --n_cycles 6 --output_file alpha.safetensors
use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use ephys::cli::{init_logging, parse_known_args, InputArgs, OutputArgs, SelectionArgs};
use ephys::{select_analog_signals, wavelet_amplitude, Quantity, SeriesKind, WaveletConfig};

#[derive(Parser, Debug)]
#[command(name = "wavelet_transform", about = "Morlet wavelet amplitude of analog signals")]
struct Args {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Center frequency of the wavelet, e.g. "10 Hz".
    #[arg(long = "frequency")]
    frequency: Quantity,

    /// Size of the mother wavelet in cycles.
    #[arg(long = "n_cycles", default_value_t = 6.0)]
    n_cycles: f64,

    /// Zero-pad to a power of two before the FFT.
    #[arg(long = "zero_padding", action = clap::ArgAction::Set, default_value_t = true)]
    zero_padding: bool,
}

fn main() -> Result<()> {
    init_logging()?;
    let args: Args = parse_known_args();

    let frequency = args.frequency.to_hz()?;
    let cfg = WaveletConfig { n_cycles: args.n_cycles, zero_padding: args.zero_padding };

    let block = args.input.load()?;
    let request = args.selection.request_for(SeriesKind::AnalogSignal)?;

    let amplitudes = {
        let signals = select_analog_signals(&block, &args.selection.segment_index, &request.range)?;
        signals
            .into_iter()
            .map(|s| wavelet_amplitude(s, frequency, &cfg).with_context(|| format!("transforming '{}'", s.name)))
            .collect::<Result<Vec<_>>>()?
    };
    info!("Computed {} wavelet amplitude signal(s) at {frequency} Hz", amplitudes.len());

    args.output.write(block, amplitudes, vec![])
}
