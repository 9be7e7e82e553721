//! Join-aggregate reducer (reduce side).

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::entry::{OutputEntry, Source, TaggedPartial};
use crate::error::MatmulError;
use crate::key::{decode_key, Dimensions, JoinKey};

/// What to do when a group holds two partials for the same
/// `(source, other_index)`, which happens under at-least-once delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later partial replaces the earlier one. Re-delivering an
    /// identical partial is a no-op.
    #[default]
    LastWriteWins,
    /// The first partial is kept and every later one is reported.
    Reject,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastWriteWins => write!(f, "last-write-wins"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-write-wins" | "lww" => Ok(Self::LastWriteWins),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown duplicate policy {other:?} (expected last-write-wins or reject)"
            )),
        }
    }
}

/// Result of reducing one key group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reduction {
    /// `None` when the dot product is exactly zero.
    pub output: Option<OutputEntry>,
    /// `DuplicatePartial` diagnostics, only filled under [`DuplicatePolicy::Reject`].
    pub duplicates: Vec<MatmulError>,
}

/// Computes `C[row][col]` for the cell named by `key` from every partial
/// emitted under that key, in any order.
///
/// Products are summed in ascending contraction index, which gives the same
/// result as summing over every `k in 0..n` with absent values taken as
/// zero. Only an exact `0.0` sum is suppressed: cancellation that leaves a
/// tiny residue still produces an entry.
///
/// A key outside the `m x p` output names no cell; its group is dropped.
pub fn reduce<I>(key: JoinKey, partials: I, dims: &Dimensions, policy: DuplicatePolicy) -> Reduction
where
    I: IntoIterator<Item = TaggedPartial>,
{
    let Some((row, col)) = decode_key(key, dims) else {
        warn!(key, key_space = dims.key_space(), "dropping group for key outside output");
        return Reduction::default();
    };

    let mut a: HashMap<u32, f64> = HashMap::new();
    let mut b: HashMap<u32, f64> = HashMap::new();
    let mut duplicates = Vec::new();

    for partial in partials {
        let side = match partial.source {
            Source::A => &mut a,
            Source::B => &mut b,
        };
        match side.entry(partial.other_index) {
            Entry::Vacant(slot) => {
                slot.insert(partial.value);
            }
            Entry::Occupied(mut slot) => match policy {
                DuplicatePolicy::LastWriteWins => {
                    slot.insert(partial.value);
                }
                DuplicatePolicy::Reject => {
                    warn!(
                        key,
                        matrix = %partial.source,
                        index = partial.other_index,
                        kept = *slot.get(),
                        rejected = partial.value,
                        "duplicate partial"
                    );
                    duplicates.push(MatmulError::DuplicatePartial {
                        key,
                        matrix: partial.source,
                        index: partial.other_index,
                    });
                }
            },
        }
    }

    let (small, large) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    let mut shared: Vec<u32> = small
        .keys()
        .copied()
        .filter(|k| *k < dims.n() && large.contains_key(k))
        .collect();
    shared.sort_unstable();

    let sum: f64 = shared.iter().map(|k| a[k] * b[k]).sum();
    trace!(key, terms = shared.len(), sum, "reduced group");

    let output = (sum != 0.0).then_some(OutputEntry { row, col, value: sum });
    Reduction { output, duplicates }
}
