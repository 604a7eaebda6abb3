//! Parsing of function profiler statistics files.
//!
//! The files look like the per-cpu `trace_stat/function<N>` output of
//! the ftrace function profiler:
//!
//! ```text
//!   Function                               Hit    Time            Avg             s^2
//!   --------                               ---    ----            ---             ---
//!   schedule                              1234    12345.67 us     10.004 us       123.456 us
//! ```
//!
//! The two header lines are skipped. Every other line is split the
//! way a regex split on `\s+` does (including the line terminator,
//! thus a leading blank gives an empty field 0 and the terminator an
//! empty last field), the last field is dropped, then field 1 is the
//! function name, 2 the hit count, 5 the average and 7 the variance.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::{debug, info, name_filter::NameFilter};

const FIELD_NAME: usize = 1;
const FIELD_SAMPLE_COUNT: usize = 2;
const FIELD_MEAN: usize = 5;
const FIELD_VARIANCE: usize = 7;

const HEADER_LINES: usize = 2;

lazy_static! {
    static ref FIELD_SEPARATOR: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Per-function statistics from one line of a stat file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatRecord {
    pub name: String,
    pub sample_count: u64,
    /// Average duration
    pub mean: f64,
    /// Never negative
    pub variance: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("missing header: expected {HEADER_LINES} header lines, got {0}")]
    MissingHeader(usize),
    #[error("line {line}: missing field {field} for function {name:?}")]
    MissingField {
        line: usize,
        field: usize,
        name: String,
    },
    #[error("line {line}: invalid sample count {text:?}: {message}")]
    InvalidSampleCount {
        line: usize,
        text: String,
        message: String,
    },
    #[error("line {line}: invalid mean {text:?}: {message}")]
    InvalidMean {
        line: usize,
        text: String,
        message: String,
    },
    #[error("line {line}: invalid variance {text:?}: {message}")]
    InvalidVariance {
        line: usize,
        text: String,
        message: String,
    },
    #[error("line {line}: value {text:?} is not a finite number")]
    NonFiniteValue { line: usize, text: String },
    #[error("line {line}: variance {text:?} is negative")]
    NegativeVariance { line: usize, text: String },
}

/// The split fields of one line, with the trailing field already
/// removed.
fn split_fields(line_with_terminator: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = FIELD_SEPARATOR.split(line_with_terminator).collect();
    fields.pop();
    fields
}

fn parse_float(
    fields: &[&str],
    field: usize,
    line: usize,
    name: &str,
    invalid: impl FnOnce(String, String) -> ParseError,
) -> Result<f64, ParseError> {
    let text = fields.get(field).ok_or_else(|| ParseError::MissingField {
        line,
        field,
        name: name.into(),
    })?;
    let value: f64 = text
        .parse()
        .map_err(|e: std::num::ParseFloatError| invalid(text.to_string(), e.to_string()))?;
    if !value.is_finite() {
        return Err(ParseError::NonFiniteValue {
            line,
            text: text.to_string(),
        });
    }
    Ok(value)
}

/// Parse the contents of a stat file, keeping the records for
/// function names in `filter`, in file order.
pub fn parse_stat_records(contents: &str, filter: &NameFilter) -> Result<Vec<StatRecord>, ParseError> {
    let mut lines = contents.split_inclusive('\n');
    for i in 0..HEADER_LINES {
        if lines.next().is_none() {
            return Err(ParseError::MissingHeader(i));
        }
    }

    let mut records = Vec::new();
    for (i, l) in lines.enumerate() {
        let line = i + HEADER_LINES + 1;
        let fields = split_fields(l);
        let Some(name) = fields.get(FIELD_NAME) else {
            continue;
        };
        if !filter.contains(name) {
            debug!("line {line}: skipping function {name:?}, not in the allow-list");
            continue;
        }

        let sample_count = {
            let text = fields
                .get(FIELD_SAMPLE_COUNT)
                .ok_or_else(|| ParseError::MissingField {
                    line,
                    field: FIELD_SAMPLE_COUNT,
                    name: name.to_string(),
                })?;
            text.parse::<u64>()
                .map_err(|e| ParseError::InvalidSampleCount {
                    line,
                    text: text.to_string(),
                    message: e.to_string(),
                })?
        };
        let mean = parse_float(&fields, FIELD_MEAN, line, name, |text, message| {
            ParseError::InvalidMean {
                line,
                text,
                message,
            }
        })?;
        let variance = parse_float(&fields, FIELD_VARIANCE, line, name, |text, message| {
            ParseError::InvalidVariance {
                line,
                text,
                message,
            }
        })?;
        if variance < 0. {
            return Err(ParseError::NegativeVariance {
                line,
                text: fields[FIELD_VARIANCE].to_string(),
            });
        }

        records.push(StatRecord {
            name: name.to_string(),
            sample_count,
            mean,
            variance,
        });
    }
    Ok(records)
}

/// The records from one stat file.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub path: PathBuf,
    pub records: Vec<StatRecord>,
}

impl Dataset {
    pub fn read_file(path: &Path, filter: &NameFilter) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading stat file {path:?}"))?;
        let records = parse_stat_records(&contents, filter)
            .with_context(|| format!("parsing stat file {path:?}"))?;
        info!("read {} records from {path:?}", records.len());
        if records.len() < filter.len() {
            let missing = filter
                .names()
                .iter()
                .filter(|name| !records.iter().any(|r| &r.name == *name))
                .join(", ");
            debug!("functions not present in {path:?}: {missing}");
        }
        Ok(Dataset {
            path: path.to_owned(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const HEADER: &str = "  Function      Hit    Time            Avg             s^2\n  \
                          --------      ---    ----            ---             ---\n";

    fn filter(names: &[&str]) -> NameFilter {
        names.iter().collect()
    }

    #[test]
    fn t_example_line() {
        let s = format!("{HEADER}idx foo 10 x x 1.5 x 0.25 junk\n");
        let recs = parse_stat_records(&s, &filter(&["foo", "bar"])).unwrap();
        assert_eq!(
            recs,
            [StatRecord {
                name: "foo".into(),
                sample_count: 10,
                mean: 1.5,
                variance: 0.25
            }]
        );
    }

    #[test]
    fn t_ftrace_format() {
        let s = format!(
            "{HEADER}  schedule            1234    12345.67 us     10.004 us       123.456 us    \n  \
             mutex_lock           20    40.2 us         2.01 us         0.5 us    \n  \
             rt_mutex_lock         2    3.0 us          1.5 us          0.01 us    \n"
        );
        let recs = parse_stat_records(&s, &filter(&["schedule", "rt_mutex_lock"])).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].name, "schedule");
        assert_eq!(recs[0].sample_count, 1234);
        assert_relative_eq!(recs[0].mean, 10.004);
        assert_relative_eq!(recs[0].variance, 123.456);
        assert_eq!(recs[1].name, "rt_mutex_lock");
        assert_relative_eq!(recs[1].variance, 0.01);
    }

    #[test]
    fn t_last_line_without_newline() {
        // The trailing token is dropped, but it's beyond field 7
        let s = format!("{HEADER}  foo 3 x x 2.0 x 4.0 us");
        let recs = parse_stat_records(&s, &filter(&["foo"])).unwrap();
        assert_eq!(recs.len(), 1);
        assert_relative_eq!(recs[0].variance, 4.0);
    }

    #[test]
    fn t_drops_unlisted_and_blank_lines() {
        let s = format!("{HEADER}\n  other 1 x x 1.0 x 1.0 us\n\n  foo 1 x x garbage\n");
        // "foo" line would fail, but it's not in the allow-list
        let recs = parse_stat_records(&s, &filter(&["bar"])).unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn t_malformed_mean() {
        let s = format!("{HEADER}  foo 10 x x NaN_text x 0.25 us\n");
        let e = parse_stat_records(&s, &filter(&["foo"])).unwrap_err();
        assert!(matches!(e, ParseError::InvalidMean { line: 3, .. }), "{e:?}");
    }

    #[test]
    fn t_malformed_count_and_variance() {
        let s = format!("{HEADER}  foo -1 x x 1.0 x 0.25 us\n");
        assert!(matches!(
            parse_stat_records(&s, &filter(&["foo"])),
            Err(ParseError::InvalidSampleCount { .. })
        ));
        let s = format!("{HEADER}  foo 1 x x 1.0 x zero us\n");
        assert!(matches!(
            parse_stat_records(&s, &filter(&["foo"])),
            Err(ParseError::InvalidVariance { .. })
        ));
        let s = format!("{HEADER}  foo 1 x x 1.0 x -0.5 us\n");
        assert!(matches!(
            parse_stat_records(&s, &filter(&["foo"])),
            Err(ParseError::NegativeVariance { .. })
        ));
        let s = format!("{HEADER}  foo 1 x x inf x 0.5 us\n");
        assert!(matches!(
            parse_stat_records(&s, &filter(&["foo"])),
            Err(ParseError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn t_missing_field() {
        let s = format!("{HEADER}  foo 1 x x 1.0\n");
        assert_eq!(
            parse_stat_records(&s, &filter(&["foo"])),
            Err(ParseError::MissingField {
                line: 3,
                field: FIELD_VARIANCE,
                name: "foo".into()
            })
        );
    }

    #[test]
    fn t_missing_header() {
        assert_eq!(
            parse_stat_records("only one line\n", &filter(&["foo"])),
            Err(ParseError::MissingHeader(1))
        );
        assert_eq!(
            parse_stat_records("", &filter(&["foo"])),
            Err(ParseError::MissingHeader(0))
        );
        assert_eq!(parse_stat_records(HEADER, &filter(&["foo"])), Ok(vec![]));
    }
}
