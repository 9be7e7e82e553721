use std::fmt;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Per-job tallies. Each task keeps its own and they are summed once the
/// task finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounters {
    pub records_read: u64,
    pub records_skipped: u64,
    pub malformed_records: u64,
    pub partials_emitted: u64,
    pub groups_reduced: u64,
    pub entries_written: u64,
    pub duplicate_partials: u64,
}

impl AddAssign for JobCounters {
    fn add_assign(&mut self, other: Self) {
        self.records_read += other.records_read;
        self.records_skipped += other.records_skipped;
        self.malformed_records += other.malformed_records;
        self.partials_emitted += other.partials_emitted;
        self.groups_reduced += other.groups_reduced;
        self.entries_written += other.entries_written;
        self.duplicate_partials += other.duplicate_partials;
    }
}

impl fmt::Display for JobCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "records read:       {}", self.records_read)?;
        writeln!(f, "records skipped:    {}", self.records_skipped)?;
        writeln!(f, "malformed records:  {}", self.malformed_records)?;
        writeln!(f, "partials emitted:   {}", self.partials_emitted)?;
        writeln!(f, "groups reduced:     {}", self.groups_reduced)?;
        writeln!(f, "entries written:    {}", self.entries_written)?;
        write!(f, "duplicate partials: {}", self.duplicate_partials)
    }
}
