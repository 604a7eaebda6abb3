//! Command line options shared by both programs, and the final
//! output step.

use std::{io::stdout, path::PathBuf};

use anyhow::Result;

use crate::{
    chart::{BarChart, ChartOptions},
    config_file::LoadConfigFile,
    info,
    series::Comparison,
};

#[derive(Debug, Clone, clap::Args)]
pub struct OutputOpts {
    /// Chart configuration file (JSON5 or YAML, by extension). By
    /// default, `./.pi-durations.*` is used if it exists.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// The image file to write, `.eps`, `.ps` or `.svg` (default:
    /// from the config, or `durations.eps`)
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Upper limit of the duration axis (default: from the config,
    /// or automatic)
    #[clap(long)]
    pub y_max: Option<f64>,

    /// Print a table with the statistics that are plotted to stdout
    #[clap(long)]
    pub summary: bool,

    /// Print the `--summary` table as TSV
    #[clap(long, requires = "summary")]
    pub tsv: bool,

    /// Also write the plotted statistics as JSON to this path
    #[clap(long)]
    pub json: Option<PathBuf>,
}

impl OutputOpts {
    /// The chart options from the config file with the command line
    /// overrides applied.
    pub fn chart_options(&self) -> Result<ChartOptions> {
        let mut options = ChartOptions::load_config(self.config.as_deref())?;
        if let Some(output) = &self.output {
            options.output = output.clone();
        }
        if let Some(y_max) = self.y_max {
            options.y_max = Some(y_max);
        }
        Ok(options)
    }

    /// Write the chart and the optional outputs. The chart layout is
    /// checked before anything is written.
    pub fn write(&self, comparison: &Comparison, options: &ChartOptions) -> Result<()> {
        let chart = BarChart::new(comparison, options)?;
        if self.summary {
            comparison.write_summary_table(self.tsv, &mut stdout().lock())?;
        }
        if let Some(path) = &self.json {
            comparison.write_json(path)?;
            info!("wrote JSON to {path:?}");
        }
        chart.write_to_file()
    }
}
