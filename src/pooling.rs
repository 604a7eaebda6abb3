//! Pooling of per-function statistics from several datasets (e.g. one
//! stat file per processor) into one mean and variance per function,
//! weighting each dataset by its sample count:
//!
//! ```text
//! mean     = Σ n_i·mean_i / Σ n_i
//! variance = (Σ n_i·variance_i + Σ n_i·(mean_i − mean)²) / Σ n_i
//! ```
//!
//! Records are correlated by function name, not by their position in
//! the datasets.

use std::collections::HashMap;

use num_traits::Pow;
use serde::Serialize;

use crate::{
    debug,
    stat_file::{Dataset, StatRecord},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PooledRecord {
    pub name: String,
    pub mean: f64,
    pub variance: f64,
    /// Σ n_i
    pub sample_count: u64,
    /// How many of the datasets contained a record for this function
    pub num_datasets: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PoolingError {
    #[error("no datasets given")]
    NoDatasets,
    #[error("total sample count for function {name:?} is 0, cannot pool")]
    ZeroSampleCount { name: String },
    #[error("function {name:?} appears more than once in dataset {dataset}")]
    DuplicateName { name: String, dataset: usize },
    #[error("total sample count for function {name:?} overflows")]
    SampleCountOverflow { name: String },
}

#[derive(Debug, Default)]
struct Accumulator {
    sample_count: u64,
    /// Σ n_i·mean_i
    weighted_mean_sum: f64,
    /// Σ n_i·variance_i + Σ n_i·(mean_i − mean)²
    weighted_variance_sum: f64,
    num_datasets: usize,
}

/// The records of all datasets grouped by function name, names in
/// order of first appearance.
fn group_by_name(
    datasets: &[Dataset],
) -> Result<(Vec<&str>, HashMap<&str, Vec<&StatRecord>>), PoolingError> {
    let mut order: Vec<&str> = Vec::new();
    // name -> (records, index of the last dataset that contributed)
    let mut groups: HashMap<&str, (Vec<&StatRecord>, usize)> = HashMap::new();
    for (dataset_index, dataset) in datasets.iter().enumerate() {
        for record in &dataset.records {
            let name = record.name.as_str();
            match groups.get_mut(name) {
                Some((records, last_dataset)) => {
                    if *last_dataset == dataset_index {
                        return Err(PoolingError::DuplicateName {
                            name: name.into(),
                            dataset: dataset_index,
                        });
                    }
                    records.push(record);
                    *last_dataset = dataset_index;
                }
                None => {
                    order.push(name);
                    groups.insert(name, (vec![record], dataset_index));
                }
            }
        }
    }
    let groups = groups
        .into_iter()
        .map(|(name, (records, _))| (name, records))
        .collect();
    Ok((order, groups))
}

/// Pool the statistics of `datasets`, one `PooledRecord` per function
/// name in order of first appearance (not sorted). A function missing
/// from some of the datasets is pooled over those that have it.
pub fn pool(datasets: &[Dataset]) -> Result<Vec<PooledRecord>, PoolingError> {
    if datasets.is_empty() {
        return Err(PoolingError::NoDatasets);
    }
    let (order, groups) = group_by_name(datasets)?;

    let mut pooled = Vec::with_capacity(order.len());
    for name in order {
        let records = &groups[name];
        let mut acc = Accumulator {
            num_datasets: records.len(),
            ..Default::default()
        };

        // Pass 1: total count and weighted mean
        for record in records {
            acc.sample_count = acc
                .sample_count
                .checked_add(record.sample_count)
                .ok_or_else(|| PoolingError::SampleCountOverflow { name: name.into() })?;
            acc.weighted_mean_sum += record.sample_count as f64 * record.mean;
        }
        if acc.sample_count == 0 {
            return Err(PoolingError::ZeroSampleCount { name: name.into() });
        }
        let total = acc.sample_count as f64;
        let mean = acc.weighted_mean_sum / total;

        // Pass 2: within-group plus between-group variance
        for record in records {
            let n = record.sample_count as f64;
            acc.weighted_variance_sum += n * record.variance + n * (record.mean - mean).pow(2);
        }
        let variance = acc.weighted_variance_sum / total;

        if acc.num_datasets < datasets.len() {
            debug!(
                "function {name:?} present in only {} of {} datasets",
                acc.num_datasets,
                datasets.len()
            );
        }
        debug!("pooled {name:?}: n = {}, mean = {mean}, variance = {variance}", acc.sample_count);

        pooled.push(PooledRecord {
            name: name.into(),
            mean,
            variance,
            sample_count: acc.sample_count,
            num_datasets: acc.num_datasets,
        });
    }
    Ok(pooled)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use super::*;

    fn rec(name: &str, sample_count: u64, mean: f64, variance: f64) -> StatRecord {
        StatRecord {
            name: name.into(),
            sample_count,
            mean,
            variance,
        }
    }

    fn dataset(records: Vec<StatRecord>) -> Dataset {
        Dataset {
            path: PathBuf::from("test.dat"),
            records,
        }
    }

    #[test]
    fn t_single_dataset_is_identity() {
        let ds = [dataset(vec![rec("b", 5, 2.5, 0.7), rec("a", 3, 10., 4.)])];
        let p = pool(&ds).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p[0].name, "b");
        assert_relative_eq!(p[0].mean, 2.5);
        assert_relative_eq!(p[0].variance, 0.7);
        assert_eq!(p[0].sample_count, 5);
        assert_eq!(p[1].name, "a");
        assert_relative_eq!(p[1].mean, 10.);
        assert_relative_eq!(p[1].variance, 4.);
    }

    #[test]
    fn t_two_equal_groups() {
        let (m1, m2, v1, v2) = (3.0, 7.0, 1.5, 0.5);
        let ds = [
            dataset(vec![rec("f", 10, m1, v1)]),
            dataset(vec![rec("f", 10, m2, v2)]),
        ];
        let p = pool(&ds).unwrap();
        assert_relative_eq!(p[0].mean, (m1 + m2) / 2.);
        assert_relative_eq!(p[0].variance, (v1 + v2) / 2. + ((m1 - m2) / 2.).powi(2));
        assert_eq!(p[0].sample_count, 20);
        assert_eq!(p[0].num_datasets, 2);
    }

    #[test]
    fn t_matches_raw_samples() {
        // Population variance of the union equals the pooled variance
        let g1 = [1.0, 2.0, 6.0];
        let g2 = [4.0, 8.0];
        let stats = |xs: &[f64]| {
            let n = xs.len() as f64;
            let m = xs.iter().sum::<f64>() / n;
            let v = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n;
            (m, v)
        };
        let (m1, v1) = stats(&g1[..]);
        let (m2, v2) = stats(&g2[..]);
        let all: Vec<f64> = g1.iter().chain(&g2).copied().collect();
        let (m, v) = stats(&all[..]);
        let ds = [
            dataset(vec![rec("x", 3, m1, v1)]),
            dataset(vec![rec("x", 2, m2, v2)]),
        ];
        let p = pool(&ds).unwrap();
        assert_relative_eq!(p[0].mean, m, epsilon = 1e-12);
        assert_relative_eq!(p[0].variance, v, epsilon = 1e-12);
    }

    #[test]
    fn t_keyed_by_name_not_position() {
        let aligned = [
            dataset(vec![rec("a", 2, 1., 0.1), rec("b", 4, 5., 0.2)]),
            dataset(vec![rec("a", 6, 3., 0.3), rec("b", 1, 9., 0.4)]),
        ];
        let shuffled = [
            dataset(vec![rec("a", 2, 1., 0.1), rec("b", 4, 5., 0.2)]),
            dataset(vec![rec("b", 1, 9., 0.4), rec("a", 6, 3., 0.3)]),
        ];
        assert_eq!(pool(&aligned).unwrap(), pool(&shuffled).unwrap());
    }

    #[test]
    fn t_missing_in_some_datasets() {
        let ds = [
            dataset(vec![rec("a", 2, 1., 0.1)]),
            dataset(vec![rec("b", 4, 5., 0.2), rec("a", 2, 3., 0.1)]),
        ];
        let p = pool(&ds).unwrap();
        let names: Vec<_> = p.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(p[0].num_datasets, 2);
        assert_relative_eq!(p[0].mean, 2.);
        assert_eq!(p[1].num_datasets, 1);
        assert_relative_eq!(p[1].variance, 0.2);
    }

    #[test]
    fn t_errors() {
        assert_eq!(pool(&[]), Err(PoolingError::NoDatasets));
        let ds = [
            dataset(vec![rec("a", 0, 1., 0.1)]),
            dataset(vec![rec("a", 0, 3., 0.1)]),
        ];
        assert_eq!(
            pool(&ds),
            Err(PoolingError::ZeroSampleCount { name: "a".into() })
        );
        let ds = [
            dataset(vec![rec("a", 1, 1., 0.1)]),
            dataset(vec![rec("a", 1, 3., 0.1), rec("a", 1, 3., 0.1)]),
        ];
        assert_eq!(
            pool(&ds),
            Err(PoolingError::DuplicateName {
                name: "a".into(),
                dataset: 1
            })
        );
    }

    proptest! {
        #[test]
        fn p_scaling_counts_is_neutral(
            groups in prop::collection::vec((1u64..1000, -1e3f64..1e3, 0f64..1e3), 1..6),
            factor in 1u64..50,
        ) {
            let ds: Vec<Dataset> = groups
                .iter()
                .map(|(n, m, v)| dataset(vec![rec("f", *n, *m, *v)]))
                .collect();
            let scaled: Vec<Dataset> = groups
                .iter()
                .map(|(n, m, v)| dataset(vec![rec("f", n * factor, *m, *v)]))
                .collect();
            let p = pool(&ds).unwrap();
            let q = pool(&scaled).unwrap();
            prop_assert!((p[0].mean - q[0].mean).abs() <= 1e-9 * (1. + p[0].mean.abs()));
            prop_assert!((p[0].variance - q[0].variance).abs() <= 1e-9 * (1. + p[0].variance));
        }
    }
}
