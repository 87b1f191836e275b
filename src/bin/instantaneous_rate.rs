/// instantaneous_rate: kernel estimate of the firing rate of the selected
/// spike trains, written as analog signals in Hz.
///
/// Example:
///   instantaneous_rate --input_file units.safetensors --spike_train_index all \
///       --sampling_period "1 ms" --kernel gaussian --sigma "20 ms" \
///       --output_file rates.safetensors
use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use ephys::cli::{init_logging, parse_known_args, InputArgs, OutputArgs, SelectionArgs};
use ephys::{
    instantaneous_rate, select_spike_trains, select_spike_trains_by_segment, trial_rates, Kernel, KernelShape, Quantity,
    RateConfig, SeriesKind,
};

#[derive(Parser, Debug)]
#[command(name = "instantaneous_rate", about = "Instantaneous firing rate of spike trains")]
struct Args {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Time between output samples.
    #[arg(long = "sampling_period", default_value = "1 ms")]
    sampling_period: Quantity,

    /// Kernel shape: gaussian, rectangular or triangular.
    #[arg(long = "kernel", default_value = "gaussian")]
    kernel: KernelShape,

    /// Kernel standard deviation.
    #[arg(long = "sigma", default_value = "50 ms")]
    sigma: Quantity,

    /// Kernel support in standard deviations.
    #[arg(long = "cutoff", default_value_t = 5.0)]
    cutoff: f64,

    /// Start of the output interval (default: earliest spike train start).
    #[arg(long = "t_start")]
    t_start: Option<Quantity>,

    /// End of the output interval (default: latest spike train stop).
    #[arg(long = "t_stop")]
    t_stop: Option<Quantity>,

    /// Drop the border regions where the kernel is truncated.
    #[arg(long = "trim", action = clap::ArgAction::Set, default_value_t = false)]
    trim: bool,

    /// Center the kernel on each spike.
    #[arg(long = "center_kernel", action = clap::ArgAction::Set, default_value_t = true)]
    center_kernel: bool,

    /// Compensate the kernel mass lost at the borders.
    #[arg(long = "border_correction", action = clap::ArgAction::Set, default_value_t = false)]
    border_correction: bool,

    /// Average all selected spike trains into one rate.
    #[arg(long = "pool_spike_trains", action = clap::ArgAction::Set, default_value_t = false)]
    pool_spike_trains: bool,

    /// Average matching spike trains across the selected segments (trials).
    #[arg(long = "pool_trials", action = clap::ArgAction::Set, default_value_t = false)]
    pool_trials: bool,
}

impl Args {
    fn rate_config(&self) -> Result<RateConfig> {
        Ok(RateConfig {
            t_start: self.t_start.as_ref().map(Quantity::to_seconds).transpose()?,
            t_stop: self.t_stop.as_ref().map(Quantity::to_seconds).transpose()?,
            cutoff: self.cutoff,
            trim: self.trim,
            center_kernel: self.center_kernel,
            border_correction: self.border_correction,
            pool_spike_trains: self.pool_spike_trains,
            pool_trials: self.pool_trials,
        })
    }
}

fn main() -> Result<()> {
    init_logging()?;
    let args: Args = parse_known_args();

    let cfg = args.rate_config()?;
    let kernel = Kernel::new(args.kernel, args.sigma.to_seconds()?)?;
    let sampling_period = args.sampling_period.to_seconds()?;

    let block = args.input.load()?;
    let request = args.selection.request_for(SeriesKind::SpikeTrain)?;

    let rates = if cfg.pool_trials {
        let trials = select_spike_trains_by_segment(&block, &args.selection.segment_index, &request.range)?;
        trial_rates(&trials, sampling_period, kernel, &cfg).context("trial-averaged rate")?
    } else {
        let trains = select_spike_trains(&block, &args.selection.segment_index, &request.range)?;
        if cfg.pool_spike_trains {
            vec![instantaneous_rate(&trains, sampling_period, kernel, &cfg).context("pooled rate")?]
        } else {
            trains
                .iter()
                .map(|&st| {
                    instantaneous_rate(&[st], sampling_period, kernel, &cfg)
                        .with_context(|| format!("rate of '{}'", st.name))
                })
                .collect::<Result<Vec<_>>>()?
        }
    };
    info!("Estimated {} rate signal(s) at {} s resolution", rates.len(), sampling_period);

    args.output.write(block, rates, vec![])
}
