use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Which operand of `A x B` a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    A,
    B,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

impl FromStr for Source {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            other => Err(RecordError::UnknownMatrix(other.to_string())),
        }
    }
}

/// One non-zero cell of `A` or `B`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub matrix: Source,
    pub row: u32,
    pub col: u32,
    pub value: f64,
}

/// Renders the entry in the input line format, `<matrix> <row> <col> <value>`.
impl fmt::Display for MatrixEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {:?}", self.matrix, self.row, self.col, self.value)
    }
}

/// A matrix value positioned under a join key, as it travels through the shuffle.
///
/// `other_index` is the contraction index `k` of the value: the column for
/// an `A` entry, the row for a `B` entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaggedPartial {
    pub source: Source,
    pub other_index: u32,
    pub value: f64,
}

impl TaggedPartial {
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// One non-zero cell of `C`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputEntry {
    pub row: u32,
    pub col: u32,
    pub value: f64,
}

/// Renders the entry as an output line, `<row>,<col>\t<value>`.
impl fmt::Display for OutputEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}\t{:?}", self.row, self.col, self.value)
    }
}

impl FromStr for OutputEntry {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cell, value) = s
            .trim()
            .split_once('\t')
            .ok_or(RecordError::FieldCount(1))?;
        let (row, col) = cell
            .split_once(',')
            .ok_or_else(|| RecordError::BadIndex(cell.to_string()))?;
        Ok(Self {
            row: parse_index(row)?,
            col: parse_index(col)?,
            value: value
                .parse()
                .map_err(|_| RecordError::BadValue(value.to_string()))?,
        })
    }
}

pub(crate) fn parse_index(token: &str) -> Result<u32, RecordError> {
    token
        .parse()
        .map_err(|_| RecordError::BadIndex(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_wire_format_is_json() -> anyhow::Result<()> {
        let partial = TaggedPartial { source: Source::B, other_index: 3, value: -1.5 };
        let bytes = partial.to_bytes()?;
        assert_eq!(
            std::str::from_utf8(&bytes)?,
            r#"{"source":"B","other_index":3,"value":-1.5}"#
        );
        assert_eq!(TaggedPartial::from_bytes(&bytes)?, partial);
        Ok(())
    }

    #[test]
    fn output_line_format() -> anyhow::Result<()> {
        let entry = OutputEntry { row: 1, col: 0, value: 43.0 };
        assert_eq!(entry.to_string(), "1,0\t43.0");
        assert_eq!("1,0\t43.0\n".parse::<OutputEntry>()?, entry);
        assert!("1;0\t43.0".parse::<OutputEntry>().is_err());
        Ok(())
    }

    #[test]
    fn unknown_matrix_tag() {
        assert_eq!("C".parse::<Source>(), Err(RecordError::UnknownMatrix("C".into())));
        assert_eq!("a".parse::<Source>(), Err(RecordError::UnknownMatrix("a".into())));
    }
}
