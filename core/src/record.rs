//! Input line parsing.
//!
//! Lines have the form `<A|B> <row> <col> <value>` with whitespace between
//! fields. Blank lines and `#` comments carry no entry and are skipped.

use crate::entry::{parse_index, MatrixEntry};
use crate::error::RecordError;

pub fn is_skippable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

pub fn parse_record(line: &str) -> Result<MatrixEntry, RecordError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [matrix, row, col, value] = fields[..] else {
        return Err(RecordError::FieldCount(fields.len()));
    };

    let matrix = matrix.parse()?;
    let row = parse_index(row)?;
    let col = parse_index(col)?;
    let value: f64 = value
        .parse()
        .map_err(|_| RecordError::BadValue(value.to_string()))?;
    if !value.is_finite() {
        return Err(RecordError::NonFinite(value));
    }

    Ok(MatrixEntry { matrix, row, col, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Source;

    #[test]
    fn parses_well_formed_lines() {
        assert_eq!(
            parse_record("A 0 1 2"),
            Ok(MatrixEntry { matrix: Source::A, row: 0, col: 1, value: 2.0 })
        );
        assert_eq!(
            parse_record("  B\t3   4 -0.25  "),
            Ok(MatrixEntry { matrix: Source::B, row: 3, col: 4, value: -0.25 })
        );
        assert_eq!(parse_record("A 1 1 1e3").map(|e| e.value), Ok(1000.0));
    }

    #[test]
    fn classifies_malformed_lines() {
        assert_eq!(parse_record("A 0 1"), Err(RecordError::FieldCount(3)));
        assert_eq!(parse_record("A 0 1 2 3"), Err(RecordError::FieldCount(5)));
        assert_eq!(parse_record("C 0 1 2"), Err(RecordError::UnknownMatrix("C".into())));
        assert_eq!(parse_record("A -1 1 2"), Err(RecordError::BadIndex("-1".into())));
        assert_eq!(parse_record("A 0 x 2"), Err(RecordError::BadIndex("x".into())));
        assert_eq!(parse_record("A 0 1 two"), Err(RecordError::BadValue("two".into())));
        assert!(matches!(parse_record("B 0 1 NaN"), Err(RecordError::NonFinite(_))));
        assert!(matches!(parse_record("B 0 1 inf"), Err(RecordError::NonFinite(_))));
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert!(is_skippable(""));
        assert!(is_skippable("   \t"));
        assert!(is_skippable("# A 0 0 1"));
        assert!(!is_skippable("A 0 0 1"));
    }

    #[test]
    fn display_round_trips_through_parser() {
        let entry = MatrixEntry { matrix: Source::B, row: 7, col: 2, value: 0.1 };
        assert_eq!(parse_record(&entry.to_string()), Ok(entry));
    }
}
