use anyhow::{ensure, Context, Result};
use sparsemr_core::{multiply, Dimensions, SparseMatrix, Source};
use sparsemr_runner::{run_in_memory, JobConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // A is 3x4, B is 4x2
    let a = [(0, 0, 1.0), (0, 2, 2.0), (1, 1, 3.0), (2, 0, 4.0), (2, 3, 5.0)]
        .iter()
        .try_fold(SparseMatrix::new(Source::A, 3, 4), |mut m, &(r, c, v)| {
            m.insert(r, c, v).map(|_| m)
        })?;
    let b = [(0, 0, 1.0), (1, 1, 2.0), (2, 0, 3.0), (3, 1, 4.0)]
        .iter()
        .try_fold(SparseMatrix::new(Source::B, 4, 2), |mut m, &(r, c, v)| {
            m.insert(r, c, v).map(|_| m)
        })?;

    let mut input = a.to_records();
    input.extend(b.to_records());

    let dims = Dimensions::new(a.rows.into(), a.cols.into(), b.cols.into())?;
    let config = JobConfig::new(dims).with_reducers(2);
    let (result, counters) = run_in_memory(input, &config).await?;

    for entry in &result {
        println!("{entry}");
    }
    println!("\n{counters}");

    let expected = multiply(&a, &b).context("Matrix dimensions should be compatible")?;
    ensure!(result == expected, "job output differs from direct product");
    println!("\nMatches direct product!");
    Ok(())
}
