use anyhow::Result;
use clap::Parser;

use heartwatch::cli::{execute, Cli};
use heartwatch::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format)?;
    execute(cli).await
}
