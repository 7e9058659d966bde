//! wikiscribe CLI: browse and index a BookStack-style wiki from the terminal.
//!
//! Every subcommand maps to one wiki operation and prints its result as JSON.

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
