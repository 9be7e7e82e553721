//! Fan-out encoder (map side).
//!
//! Every entry is copied once per output cell it can contribute to: an
//! `A[i][k]` goes to each `C[i][j]` for `j in 0..p`, a `B[k][j]` to each
//! `C[i][j]` for `i in 0..m`. The join then happens on key equality alone.
//!
//! Cost: each input entry produces `p` (for `A`) or `m` (for `B`) records,
//! which is `n` for square jobs. Total shuffle volume is therefore
//! `O(p * |A| + m * |B|)` records for `|A|`, `|B|` non-zero entries. This
//! fan-out factor dominates the cost of the whole job.

use tracing::debug;

use crate::entry::{MatrixEntry, Source, TaggedPartial};
use crate::error::RecordError;
use crate::key::{encode_key, Dimensions, JoinKey};
use crate::record::{is_skippable, parse_record};

/// Lazily yields the `(key, partial)` pairs for one entry.
#[derive(Debug, Clone)]
pub struct FanOut {
    entry: MatrixEntry,
    dims: Dimensions,
    next: u32,
    len: u32,
}

impl Iterator for FanOut {
    type Item = (JoinKey, TaggedPartial);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let target = self.next;
        self.next += 1;

        let entry = &self.entry;
        let (key, other_index) = match entry.matrix {
            Source::A => (encode_key(entry.row, target, &self.dims), entry.col),
            Source::B => (encode_key(target, entry.col, &self.dims), entry.row),
        };
        Some((
            key,
            TaggedPartial {
                source: entry.matrix,
                other_index,
                value: entry.value,
            },
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.len - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for FanOut {}

/// Positions one entry for every dot product it takes part in.
pub fn fan_out(entry: MatrixEntry, dims: Dimensions) -> Result<FanOut, RecordError> {
    dims.check_bounds(&entry)?;
    let len = match entry.matrix {
        Source::A => dims.p(),
        Source::B => dims.m(),
    };
    Ok(FanOut { entry, dims, next: 0, len })
}

/// Parses and encodes one input line.
///
/// `Ok(None)` for blank and comment lines.
pub fn encode_record(line: &str, dims: Dimensions) -> Result<Option<FanOut>, RecordError> {
    if is_skippable(line) {
        return Ok(None);
    }
    let entry = parse_record(line)?;
    fan_out(entry, dims).map(Some)
}

/// Like [`encode_record`] but drops anything malformed.
pub fn encode_or_drop(line: &str, dims: Dimensions) -> impl Iterator<Item = (JoinKey, TaggedPartial)> {
    let fan_out = encode_record(line, dims).unwrap_or_else(|reason| {
        debug!(error = %reason.into_malformed(line), "dropping record");
        None
    });
    fan_out.into_iter().flatten()
}
