use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mimalloc::MiMalloc;
use pi_durations::cli::OutputOpts;
use pi_durations::get_terminal_width::get_terminal_width;
use pi_durations::name_filter::NameFilter;
use pi_durations::report;
use pi_durations::utillib::logging::{set_log_level, LogLevelOpt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Plot the mean durations of the selected functions from a stat file
/// measured without priority inheritance next to one measured with it,
/// as a grouped bar chart with standard deviation error bars.
#[derive(clap::Parser, Debug)]
#[clap(version)]
#[clap(next_line_help = true)]
#[clap(term_width = get_terminal_width(4))]
struct Opts {
    #[clap(flatten)]
    log_level: LogLevelOpt,

    /// The stat file for the no_pi condition
    #[clap(short = 'a', long = "file1", default_value = "stat1.dat")]
    file1: PathBuf,

    /// The stat file for the pi condition
    #[clap(short = 'b', long = "file2", default_value = "stat2.dat")]
    file2: PathBuf,

    /// File with the names of the functions to plot, one per line
    #[clap(short = 'f', long = "func_file", default_value = "func_names.txt")]
    func_file: PathBuf,

    #[clap(flatten)]
    output_opts: OutputOpts,
}

fn main() -> Result<()> {
    let Opts {
        log_level,
        file1,
        file2,
        func_file,
        output_opts,
    } = Opts::parse();

    set_log_level(log_level.try_into()?);

    let filter = NameFilter::load(&func_file)?;
    let comparison = report::simple(&file1, &file2, &filter)?;
    let options = output_opts.chart_options()?;
    output_opts.write(&comparison, &options)
}
