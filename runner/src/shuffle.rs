//! In-process shuffle.
//!
//! Map tasks hand their output to the [`Shuffle`], which only gives up its
//! partitions once it is consumed. The job consumes it after every map task
//! has finished, so a reduce task always sees the complete set of records
//! for each of its keys.

use anyhow::{Context, Result};
use sparsemr_core::{JoinKey, TaggedPartial};

/// A record as it crosses the shuffle: the join key and the encoded partial.
pub type ShuffleRecord = (JoinKey, Vec<u8>);

pub fn partition_for(key: JoinKey, reducers: usize) -> usize {
    (key % reducers as u64) as usize
}

/// Output of one map task, already split by destination partition.
#[derive(Debug)]
pub struct MapOutput {
    partitions: Vec<Vec<ShuffleRecord>>,
}

impl MapOutput {
    pub fn new(reducers: usize) -> Self {
        Self {
            partitions: vec![Vec::new(); reducers],
        }
    }

    pub fn emit(&mut self, key: JoinKey, partial: &TaggedPartial) -> Result<()> {
        let bytes = partial.to_bytes().context("Failed to encode partial")?;
        let reducers = self.partitions.len();
        self.partitions[partition_for(key, reducers)].push((key, bytes));
        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }
}

#[derive(Debug)]
pub struct Shuffle {
    partitions: Vec<Vec<ShuffleRecord>>,
}

impl Shuffle {
    pub fn new(reducers: usize) -> Self {
        Self {
            partitions: vec![Vec::new(); reducers],
        }
    }

    pub fn collect(&mut self, output: MapOutput) {
        for (mine, theirs) in self.partitions.iter_mut().zip(output.partitions) {
            mine.extend(theirs);
        }
    }

    /// Sorts every partition by key. Records of one key keep their arrival order.
    pub fn finish(self) -> Vec<Partition> {
        self.partitions
            .into_iter()
            .enumerate()
            .map(|(index, mut records)| {
                records.sort_by_key(|(key, _)| *key);
                Partition { index, records }
            })
            .collect()
    }
}

/// One reducer's share of the shuffle, sorted by key.
#[derive(Debug)]
pub struct Partition {
    pub index: usize,
    records: Vec<ShuffleRecord>,
}

impl Partition {
    /// Every key in the partition with all of its partials, in key order.
    pub fn groups(&self) -> impl Iterator<Item = Result<(JoinKey, Vec<TaggedPartial>)>> + '_ {
        self.records.chunk_by(|x, y| x.0 == y.0).map(|group| {
            let key = group[0].0;
            let partials = group
                .iter()
                .map(|(_, bytes)| TaggedPartial::from_bytes(bytes))
                .collect::<serde_json::Result<Vec<_>>>()
                .with_context(|| format!("Failed to decode partial for key {key}"))?;
            Ok((key, partials))
        })
    }
}
