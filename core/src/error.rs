//! Error taxonomy for the multiplication core.

use thiserror::Error;

use crate::entry::Source;
use crate::key::JoinKey;

/// Errors raised by the encoder and reducer.
///
/// Only [`MatmulError::InvalidDimension`] is fatal; the other variants are
/// diagnostics for a single record or group and never abort a job.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatmulError {
    /// A job dimension was zero, negative or too large for the key space.
    #[error("invalid dimension {name} = {value}: must be a positive 32-bit integer")]
    InvalidDimension { name: &'static str, value: i64 },

    /// An input line could not be turned into a matrix entry.
    #[error("malformed record {line:?}: {reason}")]
    MalformedRecord { line: String, reason: RecordError },

    /// The same contraction index arrived twice from one matrix within a group.
    #[error("duplicate partial for key {key}: {matrix}[{index}]")]
    DuplicatePartial {
        key: JoinKey,
        matrix: Source,
        index: u32,
    },
}

/// Why a single input record was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("expected 4 fields, found {0}")]
    FieldCount(usize),

    #[error("unknown matrix tag {0:?}")]
    UnknownMatrix(String),

    #[error("bad index {0:?}")]
    BadIndex(String),

    #[error("bad value {0:?}")]
    BadValue(String),

    #[error("non-finite value {0}")]
    NonFinite(f64),

    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    #[error("{matrix}[{row}][{col}] is outside a {rows}x{cols} matrix")]
    OutOfBounds {
        matrix: Source,
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },
}

impl RecordError {
    /// Attaches the offending line, for reporting a dropped record.
    pub fn into_malformed(self, line: &str) -> MatmulError {
        MatmulError::MalformedRecord {
            line: line.to_string(),
            reason: self,
        }
    }
}

pub type Result<T> = std::result::Result<T, MatmulError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_record_names_line_and_reason() {
        let error = RecordError::FieldCount(3).into_malformed("A 0 1");
        assert_eq!(
            error,
            MatmulError::MalformedRecord {
                line: "A 0 1".into(),
                reason: RecordError::FieldCount(3),
            }
        );
        assert_eq!(error.to_string(), r#"malformed record "A 0 1": expected 4 fields, found 3"#);
    }
}
