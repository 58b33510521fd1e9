use clap::Parser;
use routeschema::cli::{run_cli, Cli};
use routeschema::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    init_logging(&LogConfig::from_env())?;
    run_cli(Cli::parse())
}
