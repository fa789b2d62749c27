//! AmzWP CLI: scripted access to the publishing assistant's configuration,
//! sitemap cache and state.
//!
//! The interactive workflow lives in `amzwp-tui`; both share the same state
//! file under the data directory.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
