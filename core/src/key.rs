//! Join key encoding.
//!
//! A join key names one cell of `C = A x B`. Keys are laid out row-major with
//! the column count of `B` (`p`) as the stride, so every key in `0..m * p`
//! decodes back to exactly one `(row, col)`.

use serde::{Deserialize, Serialize};

use crate::entry::{MatrixEntry, Source};
use crate::error::{MatmulError, RecordError, Result};

pub type JoinKey = u64;

/// Shapes of a job: `A` is `m x n`, `B` is `n x p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDimensions")]
pub struct Dimensions {
    m: u32,
    n: u32,
    p: u32,
}

#[derive(Deserialize)]
struct RawDimensions {
    m: i64,
    n: i64,
    p: i64,
}

impl TryFrom<RawDimensions> for Dimensions {
    type Error = MatmulError;

    fn try_from(raw: RawDimensions) -> Result<Self> {
        Self::new(raw.m, raw.n, raw.p)
    }
}

impl Dimensions {
    pub fn new(m: i64, n: i64, p: i64) -> Result<Self> {
        // n first: without it there is no key space at all
        let n = positive("n", n)?;
        Ok(Self {
            m: positive("m", m)?,
            n,
            p: positive("p", p)?,
        })
    }

    /// `m == n == p`.
    pub fn square(n: i64) -> Result<Self> {
        Self::new(n, n, n)
    }

    pub fn m(&self) -> u32 {
        self.m
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn p(&self) -> u32 {
        self.p
    }

    /// Number of distinct join keys, one per cell of `C`.
    pub fn key_space(&self) -> u64 {
        u64::from(self.m) * u64::from(self.p)
    }

    /// Shape of the operand `matrix` as `(rows, cols)`.
    pub fn shape_of(&self, matrix: Source) -> (u32, u32) {
        match matrix {
            Source::A => (self.m, self.n),
            Source::B => (self.n, self.p),
        }
    }

    pub fn check_bounds(&self, entry: &MatrixEntry) -> std::result::Result<(), RecordError> {
        let (rows, cols) = self.shape_of(entry.matrix);
        if entry.row < rows && entry.col < cols {
            Ok(())
        } else {
            Err(RecordError::OutOfBounds {
                matrix: entry.matrix,
                row: entry.row,
                col: entry.col,
                rows,
                cols,
            })
        }
    }
}

fn positive(name: &'static str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(MatmulError::InvalidDimension { name, value })
}

pub fn encode_key(row: u32, col: u32, dims: &Dimensions) -> JoinKey {
    u64::from(row) * u64::from(dims.p) + u64::from(col)
}

/// Inverse of [`encode_key`]. `None` for keys outside the `m x p` output.
pub fn decode_key(key: JoinKey, dims: &Dimensions) -> Option<(u32, u32)> {
    if key >= dims.key_space() {
        return None;
    }
    let p = u64::from(dims.p);
    Some(((key / p) as u32, (key % p) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_inverts_encode() -> anyhow::Result<()> {
        for (m, n, p) in [(2, 2, 2), (3, 4, 2), (1, 5, 7), (6, 1, 3)] {
            let dims = Dimensions::new(m, n, p)?;
            let mut seen = std::collections::HashSet::new();
            for i in 0..dims.m() {
                for j in 0..dims.p() {
                    let key = encode_key(i, j, &dims);
                    assert!(key < dims.key_space());
                    assert!(seen.insert(key), "key {key} reused");
                    assert_eq!(decode_key(key, &dims), Some((i, j)));
                }
            }
            assert_eq!(seen.len() as u64, dims.key_space());
        }
        Ok(())
    }

    #[test]
    fn stride_is_column_count_of_b() -> anyhow::Result<()> {
        // n != p: a stride of n would send (0, 2) and (1, 0) to the same key
        let dims = Dimensions::new(2, 2, 3)?;
        assert_eq!(encode_key(0, 2, &dims), 2);
        assert_eq!(encode_key(1, 0, &dims), 3);
        assert_eq!(decode_key(5, &dims), Some((1, 2)));
        assert_eq!(decode_key(6, &dims), None);
        Ok(())
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        assert_eq!(
            Dimensions::new(2, 0, 2),
            Err(MatmulError::InvalidDimension { name: "n", value: 0 })
        );
        assert_eq!(
            Dimensions::new(-1, 2, 2),
            Err(MatmulError::InvalidDimension { name: "m", value: -1 })
        );
        assert_eq!(
            Dimensions::new(2, 2, 1 << 40),
            Err(MatmulError::InvalidDimension { name: "p", value: 1 << 40 })
        );
    }

    #[test]
    fn deserialize_validates() {
        let ok: Dimensions = serde_json::from_str(r#"{"m":2,"n":3,"p":4}"#).unwrap();
        assert_eq!((ok.m(), ok.n(), ok.p()), (2, 3, 4));
        assert!(serde_json::from_str::<Dimensions>(r#"{"m":2,"n":-3,"p":4}"#).is_err());
    }

    #[test]
    fn bounds_follow_operand_shape() -> anyhow::Result<()> {
        let dims = Dimensions::new(2, 3, 4)?;
        let a = MatrixEntry { matrix: Source::A, row: 1, col: 2, value: 1.0 };
        let b = MatrixEntry { matrix: Source::B, row: 2, col: 3, value: 1.0 };
        assert!(dims.check_bounds(&a).is_ok());
        assert!(dims.check_bounds(&b).is_ok());
        assert!(dims.check_bounds(&MatrixEntry { col: 3, ..a }).is_err());
        assert!(dims.check_bounds(&MatrixEntry { row: 3, ..b }).is_err());
        Ok(())
    }
}
