use std::path::PathBuf;

use sparsemr_core::{Dimensions, DuplicatePolicy, MatmulError};
use structopt::StructOpt;
use tracing::Level;

use crate::config::{default_map_workers, JobConfig};

#[derive(Debug, StructOpt)]
#[structopt(name = "sparsemr", about = "Multiplies two sparse matrices with a local map/shuffle/reduce job")]
pub struct Opt {
    /// Input file or directory of `<A|B> <row> <col> <value>` lines
    #[structopt(parse(from_os_str))]
    pub input: PathBuf,

    /// Output directory, must not exist
    #[structopt(parse(from_os_str))]
    pub output: PathBuf,

    /// Shared dimension: columns of A and rows of B
    #[structopt(allow_hyphen_values = true)]
    pub n: i64,

    /// Rows of A
    #[structopt(allow_hyphen_values = true)]
    pub m: i64,

    /// Columns of B
    #[structopt(allow_hyphen_values = true)]
    pub p: i64,

    /// Number of reduce tasks (and part files)
    #[structopt(long, default_value = "1")]
    pub reducers: usize,

    /// Map tasks allowed to run at once [default: available cores]
    #[structopt(long)]
    pub map_workers: Option<usize>,

    /// How to treat a repeated partial within a group: last-write-wins or reject
    #[structopt(long = "duplicates", default_value = "last-write-wins")]
    pub duplicate_policy: DuplicatePolicy,

    /// Log every dropped input record as a warning
    #[structopt(long)]
    pub report_malformed: bool,

    /// More log output (-v, -vv, -vvv)
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: u8,
}

impl Opt {
    pub fn job_config(&self) -> Result<JobConfig, MatmulError> {
        let dims = Dimensions::new(self.m, self.n, self.p)?;
        Ok(JobConfig {
            dims,
            reducers: self.reducers,
            map_workers: self.map_workers.unwrap_or_else(default_map_workers),
            duplicate_policy: self.duplicate_policy,
            report_malformed: self.report_malformed,
        })
    }

    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
