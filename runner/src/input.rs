use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use walkdir::{DirEntry, WalkDir};

/// One input line. Lines that are not valid UTF-8 keep their raw bytes so
/// the map task can count and report them.
pub type Line = std::result::Result<String, Vec<u8>>;

/// One unit of map work.
#[derive(Debug, Clone)]
pub enum Split {
    File(PathBuf),
    Lines { name: String, lines: Vec<String> },
}

impl Split {
    pub fn name(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Lines { name, .. } => name.clone(),
        }
    }

    pub fn read_lines(self) -> Result<Vec<Line>> {
        match self {
            Self::File(path) => {
                let content = std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Ok(split_lines(&content))
            }
            Self::Lines { lines, .. } => Ok(lines.into_iter().map(Ok).collect()),
        }
    }
}

/// Splits on `\n`, dropping a trailing `\r` from each line.
fn split_lines(content: &[u8]) -> Vec<Line> {
    if content.is_empty() {
        return Vec::new();
    }
    let body = content.strip_suffix(b"\n").unwrap_or(content);
    body.split(|b| *b == b'\n')
        .map(|line| {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            String::from_utf8(line.to_vec()).map_err(|e| e.into_bytes())
        })
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map_or(false, |s| s.starts_with('.') || s.starts_with('_'))
}

/// A file is one split; a directory is walked recursively, skipping hidden
/// and `_`-prefixed entries, in file name order.
pub fn discover_splits(input: &Path) -> Result<Vec<Split>> {
    ensure!(input.exists(), "Input path {} does not exist", input.display());
    if input.is_file() {
        return Ok(vec![Split::File(input.to_path_buf())]);
    }

    let mut splits = Vec::new();
    for entry in WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry.with_context(|| format!("Failed to walk {}", input.display()))?;
        if entry.file_type().is_file() {
            splits.push(Split::File(entry.into_path()));
        }
    }
    Ok(splits)
}
