use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mimalloc::MiMalloc;
use pi_durations::chart::TickLabels;
use pi_durations::cli::OutputOpts;
use pi_durations::condition::Condition;
use pi_durations::get_terminal_width::get_terminal_width;
use pi_durations::name_filter::NameFilter;
use pi_durations::report::{self, PooledReport};
use pi_durations::stat_file_naming::StatFileNaming;
use pi_durations::utillib::logging::{set_log_level, LogLevelOpt};
use pi_durations::{debug, info};
use strum::IntoEnumIterator;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Pool the per-processor stat files of one benchmark configuration
/// for both conditions (no_pi and pi), weighting each file by its
/// sample counts, and plot the pooled means with standard deviation
/// error bars.
#[derive(clap::Parser, Debug)]
#[clap(version)]
#[clap(next_line_help = true)]
#[clap(term_width = get_terminal_width(4))]
struct Opts {
    #[clap(flatten)]
    log_level: LogLevelOpt,

    /// The threads were pinned to processors (selects the `a` instead
    /// of the `na` files)
    #[clap(short = 'a', long)]
    affinity: bool,

    /// The directory holding the stat files
    #[clap(short = 's', long = "stats_dir", default_value = ".")]
    stats_dir: PathBuf,

    /// File with the names of the functions to plot, one per line
    #[clap(short = 'f', long = "func_file", default_value = "func_names.txt")]
    func_file: PathBuf,

    /// The number of processors, i.e. stat files per condition
    #[clap(short = 'p', long, default_value = "1")]
    processors: NonZeroUsize,

    /// The producer count token in the stat file names
    #[clap(short = 'P', long, default_value = "1")]
    producers: String,

    /// The consumer count token in the stat file names
    #[clap(short = 'C', long, default_value = "1")]
    consumers: String,

    /// The annoyer count token in the stat file names
    #[clap(short = 'A', long, default_value = "1")]
    annoyers: String,

    /// Label the function groups with letters instead of the
    /// function names
    #[clap(long)]
    letters: bool,

    #[clap(flatten)]
    output_opts: OutputOpts,
}

fn log_pooled(report: &PooledReport) {
    for condition in Condition::iter() {
        for record in report.get(condition) {
            info!(
                "{}: {}: mean {} variance {} from {} samples in {} files",
                condition.label(),
                record.name,
                record.mean,
                record.variance,
                record.sample_count,
                record.num_datasets
            );
        }
    }
}

fn main() -> Result<()> {
    let Opts {
        log_level,
        affinity,
        stats_dir,
        func_file,
        processors,
        producers,
        consumers,
        annoyers,
        letters,
        output_opts,
    } = Opts::parse();

    set_log_level(log_level.try_into()?);

    let naming = StatFileNaming {
        stats_dir,
        producers,
        consumers,
        annoyers,
        affinity,
    };
    debug!("stat file naming: {naming:?}");

    let filter = NameFilter::load(&func_file)?;
    let report = report::pooled(&naming, processors, &filter)?;
    log_pooled(&report);

    let mut options = output_opts.chart_options()?;
    if letters {
        options.tick_labels = TickLabels::Letters;
    }
    output_opts.write(&report.comparison, &options)
}
