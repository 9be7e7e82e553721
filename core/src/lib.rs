//! Sparse matrix product as a keyed map/shuffle/reduce computation.
//!
//! The map side ([`encoder`]) turns each non-zero entry of `A` or `B` into
//! `(join key, tagged partial)` records, one per output cell the entry can
//! contribute to. Once a shuffle has grouped every record of a key, the
//! reduce side ([`reducer`]) joins the `A` and `B` partials on their
//! contraction index and emits the cell of `C` if it is non-zero.
//!
//! Both sides are pure functions of their input and the job [`Dimensions`];
//! they hold no state between records or groups.

pub mod encoder;
pub mod entry;
pub mod error;
pub mod key;
pub mod matrix;
pub mod record;
pub mod reducer;

pub use encoder::{encode_or_drop, encode_record, fan_out, FanOut};
pub use entry::{MatrixEntry, OutputEntry, Source, TaggedPartial};
pub use error::{MatmulError, RecordError, Result};
pub use key::{decode_key, encode_key, Dimensions, JoinKey};
pub use matrix::{multiply, SparseMatrix};
pub use record::{is_skippable, parse_record};
pub use reducer::{reduce, DuplicatePolicy, Reduction};
