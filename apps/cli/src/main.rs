//! Notebase CLI — local knowledge base for Markdown study notes.
//!
//! Splits notes into topic entries, merges near-duplicates across documents,
//! and lets you list, show, search, and export the result.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
