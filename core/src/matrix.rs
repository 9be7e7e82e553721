use std::collections::HashMap;

use crate::entry::{MatrixEntry, OutputEntry, Source};
use crate::error::RecordError;

/// A sparse operand held in memory, used to produce job input and to check
/// job output against a direct product.
#[derive(Debug, Clone)]
pub struct SparseMatrix {
    pub name: Source,
    pub rows: u32,
    pub cols: u32,
    pub values: Vec<MatrixEntry>,
}

impl SparseMatrix {
    pub fn new(name: Source, rows: u32, cols: u32) -> Self {
        Self {
            name,
            rows,
            cols,
            values: Vec::new(),
        }
    }

    /// Builds a matrix from dense rows, keeping only the non-zero cells.
    ///
    /// The first row sets the column count; a longer row is out of bounds.
    pub fn from_dense(name: Source, dense: &[&[f64]]) -> Result<Self, RecordError> {
        let rows = dense.len() as u32;
        let cols = dense.first().map_or(0, |r| r.len()) as u32;
        let mut matrix = Self::new(name, rows, cols);
        for (r, row) in dense.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    matrix.insert(r as u32, c as u32, v)?;
                }
            }
        }
        Ok(matrix)
    }

    pub fn insert(&mut self, row: u32, col: u32, value: f64) -> Result<(), RecordError> {
        if row >= self.rows || col >= self.cols {
            return Err(RecordError::OutOfBounds {
                matrix: self.name,
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.values.push(MatrixEntry { matrix: self.name, row, col, value });
        Ok(())
    }

    /// Input lines for every stored entry.
    pub fn to_records(&self) -> Vec<String> {
        self.values.iter().map(ToString::to_string).collect()
    }
}

/// Direct single-machine product, sorted by `(row, col)`. `None` if the
/// inner dimensions differ. Entries outside their matrix's bounds are ignored.
pub fn multiply(a: &SparseMatrix, b: &SparseMatrix) -> Option<Vec<OutputEntry>> {
    if a.cols != b.rows {
        return None;
    }

    // Row k of B as col -> value
    let mut b_rows: Vec<HashMap<u32, f64>> = vec![HashMap::new(); b.rows as usize];
    for entry in b.values.iter().filter(|e| e.col < b.cols) {
        if let Some(row) = b_rows.get_mut(entry.row as usize) {
            row.insert(entry.col, entry.value);
        }
    }

    let mut a_rows: Vec<Vec<&MatrixEntry>> = vec![Vec::new(); a.rows as usize];
    for entry in a.values.iter().filter(|e| e.col < a.cols) {
        if let Some(row) = a_rows.get_mut(entry.row as usize) {
            row.push(entry);
        }
    }

    let mut result = Vec::new();
    let mut row_values: HashMap<u32, f64> = HashMap::new();

    for (a_row, entries) in a_rows.iter_mut().enumerate() {
        row_values.clear();
        entries.sort_by_key(|e| e.col);

        for a_entry in entries.iter() {
            for (&b_col, &b_val) in &b_rows[a_entry.col as usize] {
                *row_values.entry(b_col).or_insert(0.0) += a_entry.value * b_val;
            }
        }

        let mut cells: Vec<_> = row_values.drain().filter(|(_, v)| *v != 0.0).collect();
        cells.sort_by_key(|(col, _)| *col);
        result.extend(cells.into_iter().map(|(col, value)| OutputEntry {
            row: a_row as u32,
            col,
            value,
        }));
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_dense_skips_zeros() -> anyhow::Result<()> {
        let m = SparseMatrix::from_dense(Source::A, &[&[1.0, 0.0], &[0.0, 4.0]])?;
        assert_eq!((m.rows, m.cols), (2, 2));
        assert_eq!(m.to_records(), vec!["A 0 0 1.0", "A 1 1 4.0"]);
        Ok(())
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = SparseMatrix::from_dense(Source::B, &[&[1.0], &[2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, RecordError::OutOfBounds { row: 1, col: 1, .. }));
        // a short row is just trailing zeros
        assert!(SparseMatrix::from_dense(Source::B, &[&[1.0, 2.0], &[3.0]]).is_ok());
    }

    #[test]
    fn stray_entries_do_not_panic() -> anyhow::Result<()> {
        let mut a = SparseMatrix::from_dense(Source::A, &[&[1.0, 2.0]])?;
        a.values.push(MatrixEntry { matrix: Source::A, row: 5, col: 0, value: 1.0 });
        a.values.push(MatrixEntry { matrix: Source::A, row: 0, col: 9, value: 1.0 });
        let mut b = SparseMatrix::from_dense(Source::B, &[&[3.0], &[4.0]])?;
        b.values.push(MatrixEntry { matrix: Source::B, row: 7, col: 0, value: 1.0 });
        let c = multiply(&a, &b).unwrap();
        assert_eq!(c, vec![OutputEntry { row: 0, col: 0, value: 11.0 }]);
        Ok(())
    }

    #[test]
    fn insert_checks_bounds() {
        let mut m = SparseMatrix::new(Source::B, 2, 3);
        assert!(m.insert(1, 2, 1.0).is_ok());
        assert!(m.insert(2, 0, 1.0).is_err());
        assert_eq!(m.values.len(), 1);
    }

    #[test]
    fn reference_product() -> anyhow::Result<()> {
        let a = SparseMatrix::from_dense(Source::A, &[&[1.0, 2.0], &[3.0, 4.0]])?;
        let b = SparseMatrix::from_dense(Source::B, &[&[5.0, 6.0], &[7.0, 8.0]])?;
        let c: Vec<_> = multiply(&a, &b)
            .unwrap()
            .into_iter()
            .map(|e| (e.row, e.col, e.value))
            .collect();
        assert_eq!(c, vec![(0, 0, 19.0), (0, 1, 22.0), (1, 0, 43.0), (1, 1, 50.0)]);
        Ok(())
    }

    #[test]
    fn mismatched_inner_dimensions() {
        let a = SparseMatrix::new(Source::A, 2, 3);
        let b = SparseMatrix::new(Source::B, 2, 3);
        assert!(multiply(&a, &b).is_none());
    }
}
