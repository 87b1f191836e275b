/// select_data: copy a selection of analog signals or spike trains into a
/// new or existing block.
///
/// Example:
///   select_data --input_file rec.safetensors --segment_index all \
///       --spike_train_index 0:3 --output_file units.safetensors
use anyhow::Result;
use clap::Parser;
use log::info;

use ephys::cli::{init_logging, parse_known_args, InputArgs, OutputArgs, SelectionArgs};
use ephys::{select, SeriesRef};

#[derive(Parser, Debug)]
#[command(name = "select_data", about = "Select analog signals or spike trains from a block")]
struct Args {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    init_logging()?;
    let args: Args = parse_known_args();

    let block = args.input.load()?;
    let request = args.selection.request()?;

    let (signals, spike_trains) = {
        let picked = select(&block, &args.selection.segment_index, &request)?;
        let mut signals = Vec::new();
        let mut spike_trains = Vec::new();
        for series in picked {
            match series {
                SeriesRef::AnalogSignal(s) => signals.push(s.clone()),
                SeriesRef::SpikeTrain(s) => spike_trains.push(s.clone()),
            }
        }
        (signals, spike_trains)
    };
    info!(
        "Selected {} analog signal(s), {} spike train(s)",
        signals.len(),
        spike_trains.len()
    );

    args.output.write(block, signals, spike_trains)
}
