//! docsetbuilder CLI — assemble Dash/Zeal docsets from documentation plugins.
//!
//! Runs the plugins configured in `docset.toml`, merges their entries, and
//! writes a validated `.docset` package with its search index and manifest.

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
