//! A single-machine execution substrate for the `sparsemr-core` encoder and
//! reducer: input splits, a parallel map phase, a key-partitioned shuffle,
//! a parallel reduce phase and a part-file sink.

pub mod cli;
pub mod config;
pub mod counters;
pub mod input;
pub mod job;
pub mod output;
pub mod shuffle;

pub use config::JobConfig;
pub use counters::JobCounters;
pub use job::{run_in_memory, run_job};
