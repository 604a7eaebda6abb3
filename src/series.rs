//! Chart-ready series: one (name, mean, variance) point per function,
//! and the pairing of the no_pi and pi series.

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    chart::ChartError,
    condition::Condition,
    io_utils::tempfile_utils::write_file_atomically,
    pooling::PooledRecord,
    stat_file::StatRecord,
    terminal_table::{Align, Column, TerminalTable},
    warn,
};

pub trait Named {
    fn name(&self) -> &str;
}

/// Stable sort by name.
pub fn sort_by_name<T: Named>(items: &mut [T]) {
    items.sort_by(|a, b| a.name().cmp(b.name()));
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub name: String,
    pub mean: f64,
    pub variance: f64,
}

impl SeriesPoint {
    pub fn standard_deviation(&self) -> f64 {
        self.variance.sqrt()
    }
}

impl Named for SeriesPoint {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for StatRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for PooledRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

impl From<StatRecord> for SeriesPoint {
    fn from(value: StatRecord) -> Self {
        let StatRecord {
            name,
            sample_count: _,
            mean,
            variance,
        } = value;
        SeriesPoint {
            name,
            mean,
            variance,
        }
    }
}

impl From<PooledRecord> for SeriesPoint {
    fn from(value: PooledRecord) -> Self {
        let PooledRecord {
            name,
            mean,
            variance,
            sample_count: _,
            num_datasets: _,
        } = value;
        SeriesPoint {
            name,
            mean,
            variance,
        }
    }
}

#[derive(Debug, Serialize)]
struct Measurement {
    mean: f64,
    standard_deviation: f64,
}

#[derive(Debug, Serialize)]
struct ComparisonRow<'t> {
    name: &'t str,
    no_pi: Measurement,
    pi: Measurement,
}

/// The no_pi and pi series, sorted by name, of equal length.
#[derive(Debug, Clone)]
pub struct Comparison {
    no_pi: Vec<SeriesPoint>,
    pi: Vec<SeriesPoint>,
}

impl Comparison {
    pub fn new(mut no_pi: Vec<SeriesPoint>, mut pi: Vec<SeriesPoint>) -> Result<Self, ChartError> {
        if no_pi.len() != pi.len() {
            return Err(ChartError::ShapeMismatch {
                left: no_pi.len(),
                right: pi.len(),
            });
        }
        sort_by_name(&mut no_pi);
        sort_by_name(&mut pi);
        for (a, b) in no_pi.iter().zip(&pi) {
            if a.name != b.name {
                warn!(
                    "function names of the two series do not match up: {:?} vs. {:?}, \
                     labelling with the former",
                    a.name,
                    b.name
                );
            }
        }
        Ok(Comparison { no_pi, pi })
    }

    pub fn len(&self) -> usize {
        self.no_pi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.no_pi.is_empty()
    }

    /// no_pi, pi
    pub fn series(&self) -> (&[SeriesPoint], &[SeriesPoint]) {
        (&self.no_pi, &self.pi)
    }

    pub fn get(&self, condition: Condition) -> &[SeriesPoint] {
        match condition {
            Condition::NoPi => &self.no_pi,
            Condition::Pi => &self.pi,
        }
    }

    fn rows(&self) -> impl Iterator<Item = ComparisonRow<'_>> {
        self.no_pi.iter().zip(&self.pi).map(|(a, b)| ComparisonRow {
            name: &a.name,
            no_pi: Measurement {
                mean: a.mean,
                standard_deviation: a.standard_deviation(),
            },
            pi: Measurement {
                mean: b.mean,
                standard_deviation: b.standard_deviation(),
            },
        })
    }

    /// Print name, mean and standard deviation for both conditions and
    /// the ratio of the means.
    pub fn write_summary_table(&self, tsv_mode: bool, out: &mut impl Write) -> Result<()> {
        let name_width = self
            .no_pi
            .iter()
            .map(|p| p.name.chars().count())
            .max()
            .unwrap_or(0)
            .max(8);
        let mut columns = vec![Column::new("function", name_width, Align::Left)];
        for condition in [Condition::NoPi, Condition::Pi] {
            let label = condition.label();
            columns.push(Column::new(format!("{label} mean"), 12, Align::Right));
            columns.push(Column::new(format!("{label} SD"), 12, Align::Right));
        }
        columns.push(Column::new("pi/no_pi", 9, Align::Right));
        let table = TerminalTable::new(columns, tsv_mode);

        table.write_title_row(out)?;
        for row in self.rows() {
            let ratio = if row.no_pi.mean == 0. {
                "-".to_string()
            } else {
                format!("{:.3}", row.pi.mean / row.no_pi.mean)
            };
            table.write_data_row(
                &[
                    row.name.to_string(),
                    format!("{:.3}", row.no_pi.mean),
                    format!("{:.3}", row.no_pi.standard_deviation),
                    format!("{:.3}", row.pi.mean),
                    format!("{:.3}", row.pi.standard_deviation),
                    ratio,
                ],
                out,
            )?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        let rows: Vec<_> = self.rows().collect();
        Ok(serde_json::to_string_pretty(&rows)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut s = self.to_json()?;
        s.push('\n');
        write_file_atomically(path, s.as_bytes())
            .with_context(|| format!("writing JSON to {path:?}"))
    }
}
