//! File names of the per-processor stat files of one benchmark
//! configuration:
//! `{stats_dir}/stat_{condition}_{producers}prod_{consumers}cons_{annoyers}annoy_{affinity}_f{index}.dat`

use std::{num::NonZeroUsize, path::PathBuf};

use crate::condition::Condition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFileNaming {
    pub stats_dir: PathBuf,
    pub producers: String,
    pub consumers: String,
    pub annoyers: String,
    /// Whether the threads were pinned to processors
    pub affinity: bool,
}

impl StatFileNaming {
    pub fn affinity_token(&self) -> &'static str {
        if self.affinity {
            "a"
        } else {
            "na"
        }
    }

    pub fn file_name(&self, condition: Condition, processor_index: usize) -> String {
        let Self {
            stats_dir: _,
            producers,
            consumers,
            annoyers,
            affinity: _,
        } = self;
        format!(
            "stat_{}_{producers}prod_{consumers}cons_{annoyers}annoy_{}_f{processor_index}.dat",
            condition.file_token(),
            self.affinity_token()
        )
    }

    pub fn path(&self, condition: Condition, processor_index: usize) -> PathBuf {
        self.stats_dir
            .join(self.file_name(condition, processor_index))
    }

    /// The paths for processor indices `0..nproc`
    pub fn paths(&self, condition: Condition, nproc: NonZeroUsize) -> Vec<PathBuf> {
        (0..nproc.get())
            .map(|i| self.path(condition, i))
            .collect()
    }
}
