//! The allow-list of function names that should be shown.

use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result};

use crate::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    /// In order of first appearance in the source
    names: Vec<String>,
    set: HashSet<String>,
}

impl NameFilter {
    /// One name per line; surrounding whitespace is removed, empty
    /// lines are ignored, duplicates are kept once.
    pub fn from_str_lines(s: &str) -> Self {
        let mut filter = NameFilter::default();
        for line in s.lines() {
            let name = line.trim();
            if name.is_empty() {
                continue;
            }
            if filter.set.insert(name.to_owned()) {
                filter.names.push(name.to_owned());
            }
        }
        filter
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading function name file {path:?}"))?;
        let filter = Self::from_str_lines(&s);
        if filter.is_empty() {
            warn!("function name file {path:?} contains no names, nothing will be shown");
        } else {
            debug!("loaded {} function names from {path:?}", filter.len());
        }
        Ok(filter)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.set.contains(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for NameFilter {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut filter = NameFilter::default();
        for name in iter {
            let name = name.as_ref().trim();
            if !name.is_empty() && filter.set.insert(name.to_owned()) {
                filter.names.push(name.to_owned());
            }
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_from_str_lines() {
        let f = NameFilter::from_str_lines("foo\n  bar \n\n\t\nfoo\r\nbaz");
        assert_eq!(f.names(), ["foo", "bar", "baz"]);
        assert!(f.contains("bar"));
        assert!(!f.contains(" bar "));
        assert!(!f.contains(""));
        assert_eq!(f.len(), 3);
    }

    #[test]
    fn t_empty() {
        let f = NameFilter::from_str_lines("\n\n");
        assert!(f.is_empty());
        assert!(!f.contains(""));
    }

    #[test]
    fn t_load_missing_file() {
        let e = NameFilter::load(Path::new("/nonexistent/func_names.txt")).unwrap_err();
        assert!(format!("{e:#}").contains("func_names.txt"));
    }
}
