use anyhow::{Context, Result};
use sparsemr_runner::cli::Opt;
use sparsemr_runner::run_job;
use structopt::StructOpt;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::from_args();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(opt.log_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = opt.job_config().context("Invalid job configuration")?;
    let counters = run_job(&opt.input, &opt.output, &config)
        .await
        .with_context(|| format!("Job from {} failed", opt.input.display()))?;

    println!("Wrote {}", opt.output.display());
    println!("{counters}");
    Ok(())
}
