//! stylepress CLI: compiles stylesheets the way an editor host would.
//!
//! Options come from global and workspace settings files plus the first-line
//! directive of each source; failures are printed as diagnostics.

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
