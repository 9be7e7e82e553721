use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use sparsemr_core::{Dimensions, DuplicatePolicy};

/// Everything a job needs besides its input and output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub dims: Dimensions,
    /// Number of shuffle partitions, and so of reduce tasks and part files.
    pub reducers: usize,
    /// Upper bound on map tasks running at once.
    pub map_workers: usize,
    pub duplicate_policy: DuplicatePolicy,
    /// Log dropped records at `warn` instead of `debug`.
    pub report_malformed: bool,
}

impl JobConfig {
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            reducers: 1,
            map_workers: default_map_workers(),
            duplicate_policy: DuplicatePolicy::default(),
            report_malformed: false,
        }
    }

    pub fn with_reducers(mut self, reducers: usize) -> Self {
        self.reducers = reducers;
        self
    }

    pub fn with_map_workers(mut self, map_workers: usize) -> Self {
        self.map_workers = map_workers;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.reducers >= 1, "reducers must be at least 1, got {}", self.reducers);
        ensure!(self.map_workers >= 1, "map_workers must be at least 1, got {}", self.map_workers);
        Ok(())
    }
}

pub fn default_map_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}
