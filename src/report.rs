//! The two report pipelines: comparing two stat files directly, and
//! comparing the pooled statistics of the per-processor stat files of
//! both conditions.

use std::{num::NonZeroUsize, path::Path};

use anyhow::{Context, Result};

use crate::{
    condition::Condition,
    ctx, info,
    name_filter::NameFilter,
    pooling::{pool, PooledRecord},
    series::{sort_by_name, Comparison, SeriesPoint},
    stat_file::Dataset,
    stat_file_naming::StatFileNaming,
};

/// Read `no_pi_path` and `pi_path` and pair up their records.
pub fn simple(no_pi_path: &Path, pi_path: &Path, filter: &NameFilter) -> Result<Comparison> {
    let no_pi = Dataset::read_file(no_pi_path, filter)?;
    let pi = Dataset::read_file(pi_path, filter)?;
    let comparison = Comparison::new(
        no_pi.records.into_iter().map(SeriesPoint::from).collect(),
        pi.records.into_iter().map(SeriesPoint::from).collect(),
    )
    .with_context(|| format!("comparing {no_pi_path:?} with {pi_path:?}"))?;
    Ok(comparison)
}

#[derive(Debug, Clone)]
pub struct PooledReport {
    /// Sorted by name
    pub no_pi: Vec<PooledRecord>,
    /// Sorted by name
    pub pi: Vec<PooledRecord>,
    pub comparison: Comparison,
}

impl PooledReport {
    pub fn get(&self, condition: Condition) -> &[PooledRecord] {
        match condition {
            Condition::NoPi => &self.no_pi,
            Condition::Pi => &self.pi,
        }
    }
}

/// Read the `nproc` stat files for `condition` and pool them.
pub fn pool_condition(
    naming: &StatFileNaming,
    condition: Condition,
    nproc: NonZeroUsize,
    filter: &NameFilter,
) -> Result<Vec<PooledRecord>> {
    let datasets = naming
        .paths(condition, nproc)
        .iter()
        .map(|path| Dataset::read_file(path, filter))
        .collect::<Result<Vec<_>>>()?;
    let mut pooled = pool(&datasets).map_err(ctx!(
        "pooling {} stat files for condition {}",
        datasets.len(),
        condition.label()
    ))?;
    sort_by_name(&mut pooled);
    info!(
        "pooled {} functions from {} files for condition {}",
        pooled.len(),
        datasets.len(),
        condition.label()
    );
    Ok(pooled)
}

pub fn pooled(
    naming: &StatFileNaming,
    nproc: NonZeroUsize,
    filter: &NameFilter,
) -> Result<PooledReport> {
    let no_pi = pool_condition(naming, Condition::NoPi, nproc, filter)?;
    let pi = pool_condition(naming, Condition::Pi, nproc, filter)?;
    let comparison = Comparison::new(
        no_pi.iter().cloned().map(SeriesPoint::from).collect(),
        pi.iter().cloned().map(SeriesPoint::from).collect(),
    )
    .context("comparing the pooled statistics of both conditions")?;
    Ok(PooledReport {
        no_pi,
        pi,
        comparison,
    })
}
