use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use sparsemr_core::OutputEntry;

use crate::config::JobConfig;

pub const SUCCESS_MARKER: &str = "_SUCCESS";
pub const JOB_FILE: &str = "_job.json";

pub fn part_file_name(index: usize) -> String {
    format!("part-r-{index:05}")
}

pub fn check_output_dir(dir: &Path) -> Result<()> {
    ensure!(!dir.exists(), "Output directory {} already exists", dir.display());
    Ok(())
}

/// Creates the output directory, which must not exist yet.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    check_output_dir(dir)?;
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

pub fn write_partition(dir: &Path, index: usize, entries: &[OutputEntry]) -> Result<PathBuf> {
    let path = dir.join(part_file_name(index));
    let file = fs::File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for entry in entries {
        writeln!(writer, "{entry}")?;
    }
    writer.flush().with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub fn write_success(dir: &Path, config: &JobConfig) -> Result<()> {
    fs::write(dir.join(JOB_FILE), serde_json::to_vec_pretty(config)?)
        .context("Failed to write job file")?;
    fs::write(dir.join(SUCCESS_MARKER), b"").context("Failed to write success marker")
}

/// Reads every part file of a finished job back, in part order.
pub fn read_output(dir: &Path) -> Result<Vec<OutputEntry>> {
    ensure!(
        dir.join(SUCCESS_MARKER).exists(),
        "{} is not the output of a successful job",
        dir.display()
    );
    let mut parts: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    parts.retain(|p| p.file_name().and_then(|n| n.to_str()).map_or(false, |n| n.starts_with("part-r-")));
    parts.sort();

    let mut entries = Vec::new();
    for part in parts {
        let content = fs::read_to_string(&part)?;
        for line in content.lines() {
            let entry: OutputEntry = line
                .parse()
                .with_context(|| format!("Bad line {line:?} in {}", part.display()))?;
            entries.push(entry);
        }
    }
    Ok(entries)
}
