//! qrs binary entry point

use clap::Parser;
use qrs_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    qrs_cli::init_logging(cli.verbose);

    match cli.command {
        Commands::Detect(args) => qrs_cli::detect::execute(args)?,
        Commands::Simulate(args) => qrs_cli::simulate::execute(args)?,
        Commands::Stream(args) => qrs_cli::stream::execute(args).await?,
    }

    Ok(())
}
