//! Drives a job through its phases: map, shuffle, reduce, sink.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use sparsemr_core::{encode_record, reduce, OutputEntry, RecordError};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::JobConfig;
use crate::counters::JobCounters;
use crate::input::{discover_splits, Line, Split};
use crate::output;
use crate::shuffle::{MapOutput, Partition, Shuffle};

/// Encodes every line of one split.
///
/// Malformed lines are dropped and counted; they never fail the task.
pub fn map_split(name: &str, lines: &[Line], config: &JobConfig) -> Result<(MapOutput, JobCounters)> {
    let mut out = MapOutput::new(config.reducers);
    let mut counters = JobCounters::default();

    for (line_no, line) in lines.iter().enumerate() {
        counters.records_read += 1;
        let encoded = match line {
            Ok(text) => encode_record(text, config.dims),
            Err(_) => Err(RecordError::InvalidUtf8),
        };
        match encoded {
            Ok(Some(fan_out)) => {
                for (key, partial) in fan_out {
                    out.emit(key, &partial)?;
                    counters.partials_emitted += 1;
                }
            }
            Ok(None) => counters.records_skipped += 1,
            Err(reason) => {
                counters.malformed_records += 1;
                let text = match line {
                    Ok(text) => text.clone(),
                    Err(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                };
                let error = reason.into_malformed(&text);
                if config.report_malformed {
                    warn!(split = name, line = line_no + 1, %error, "dropping record");
                } else {
                    debug!(split = name, line = line_no + 1, %error, "dropping record");
                }
            }
        }
    }

    debug!(split = name, records = counters.records_read, partials = counters.partials_emitted, "map task done");
    Ok((out, counters))
}

/// Reduces every key group of one partition, in key order.
pub fn reduce_partition(partition: &Partition, config: &JobConfig) -> Result<(Vec<OutputEntry>, JobCounters)> {
    let mut entries = Vec::new();
    let mut counters = JobCounters::default();

    for group in partition.groups() {
        let (key, partials) = group?;
        let reduction = reduce(key, partials, &config.dims, config.duplicate_policy);
        counters.groups_reduced += 1;
        counters.duplicate_partials += reduction.duplicates.len() as u64;
        if let Some(entry) = reduction.output {
            entries.push(entry);
        }
    }

    counters.entries_written = entries.len() as u64;
    debug!(partition = partition.index, groups = counters.groups_reduced, entries = entries.len(), "reduce task done");
    Ok((entries, counters))
}

async fn map_phase(splits: Vec<Split>, config: &JobConfig) -> Result<(Shuffle, JobCounters)> {
    let permits = Arc::new(Semaphore::new(config.map_workers));
    let mut tasks = Vec::with_capacity(splits.len());

    for split in splits {
        let permit = permits.clone().acquire_owned().await?;
        let config = config.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let name = split.name();
            let lines = split.read_lines()?;
            map_split(&name, &lines, &config)
        }));
    }

    let mut shuffle = Shuffle::new(config.reducers);
    let mut counters = JobCounters::default();
    // Every map task has finished past this point
    for result in try_join_all(tasks).await.context("Map task panicked")? {
        let (output, task_counters) = result?;
        shuffle.collect(output);
        counters += task_counters;
    }
    Ok((shuffle, counters))
}

async fn reduce_phase(partitions: Vec<Partition>, config: &JobConfig) -> Result<Vec<(usize, Vec<OutputEntry>, JobCounters)>> {
    let tasks = partitions.into_iter().map(|partition| {
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            let (entries, counters) = reduce_partition(&partition, &config)?;
            Ok::<_, anyhow::Error>((partition.index, entries, counters))
        })
    });

    try_join_all(tasks)
        .await
        .context("Reduce task panicked")?
        .into_iter()
        .collect()
}

async fn run_phases(splits: Vec<Split>, config: &JobConfig) -> Result<(Vec<(usize, Vec<OutputEntry>, JobCounters)>, JobCounters)> {
    config.validate()?;
    info!(splits = splits.len(), reducers = config.reducers, "starting map phase");
    let (shuffle, mut counters) = map_phase(splits, config).await?;

    let partitions = shuffle.finish();
    info!(
        partials = counters.partials_emitted,
        malformed = counters.malformed_records,
        "map phase done, starting reduce phase"
    );

    let reduced = reduce_phase(partitions, config).await?;
    for (_, _, task_counters) in &reduced {
        counters += *task_counters;
    }
    info!(groups = counters.groups_reduced, entries = counters.entries_written, "reduce phase done");
    if counters.duplicate_partials > 0 {
        warn!(count = counters.duplicate_partials, "duplicate partials rejected");
    }
    Ok((reduced, counters))
}

/// Runs a job over in-memory input lines. Output is sorted by `(row, col)`.
pub async fn run_in_memory(lines: Vec<String>, config: &JobConfig) -> Result<(Vec<OutputEntry>, JobCounters)> {
    let split = Split::Lines {
        name: "memory".to_string(),
        lines,
    };
    let (reduced, counters) = run_phases(vec![split], config).await?;

    let mut entries: Vec<OutputEntry> = reduced.into_iter().flat_map(|(_, entries, _)| entries).collect();
    entries.sort_by_key(|e| (e.row, e.col));
    Ok((entries, counters))
}

/// Runs a job from `input` (a file or directory) into the `output` directory.
///
/// The output directory is only created once every phase has succeeded, so
/// a failed job leaves nothing behind.
pub async fn run_job(input: &Path, output_dir: &Path, config: &JobConfig) -> Result<JobCounters> {
    config.validate()?;
    output::check_output_dir(output_dir)?;
    let splits = discover_splits(input)?;

    let (reduced, counters) = run_phases(splits, config).await?;
    output::prepare_output_dir(output_dir)?;
    for (index, entries, _) in &reduced {
        let path = output::write_partition(output_dir, *index, entries)?;
        debug!(path = %path.display(), entries = entries.len(), "wrote partition");
    }
    output::write_success(output_dir, config)?;
    info!(output = %output_dir.display(), "job succeeded");
    Ok(counters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparsemr_core::Dimensions;

    fn lines(records: &[&str]) -> Vec<String> {
        records.iter().map(|s| s.to_string()).collect()
    }

    fn read(records: &[&str]) -> Vec<Line> {
        lines(records).into_iter().map(Ok).collect()
    }

    #[test]
    fn map_counts_every_kind_of_line() -> Result<()> {
        let config = JobConfig::new(Dimensions::square(2)?).with_reducers(2);
        let mut input = read(&["A 0 0 1", "", "# note", "A 0 0", "B 3 0 1", "B 1 1 2"]);
        input.push(Err(b"B 0 0 \xff".to_vec()));
        let (out, counters) = map_split("test", &input, &config)?;
        assert_eq!(out.record_count(), 4);
        assert_eq!(
            counters,
            JobCounters {
                records_read: 7,
                records_skipped: 2,
                malformed_records: 3,
                partials_emitted: 4,
                ..Default::default()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn in_memory_job_multiplies() -> Result<()> {
        let input = lines(&[
            "A 0 0 1", "A 0 1 2", "A 1 0 3", "A 1 1 4",
            "B 0 0 5", "B 0 1 6", "B 1 0 7", "B 1 1 8",
        ]);
        let config = JobConfig::new(Dimensions::square(2)?).with_reducers(3);
        let (entries, counters) = run_in_memory(input, &config).await?;
        let cells: Vec<_> = entries.iter().map(|e| (e.row, e.col, e.value)).collect();
        assert_eq!(cells, vec![(0, 0, 19.0), (0, 1, 22.0), (1, 0, 43.0), (1, 1, 50.0)]);
        assert_eq!(counters.partials_emitted, 16);
        assert_eq!(counters.groups_reduced, 4);
        assert_eq!(counters.entries_written, 4);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_config_fails_before_reading_input() -> Result<()> {
        let config = JobConfig::new(Dimensions::square(2)?).with_reducers(0);
        assert!(run_in_memory(lines(&["A 0 0 1"]), &config).await.is_err());
        Ok(())
    }
}
