mod cli;
mod config;
mod error;
mod game;
mod importer;
mod loader;
mod registry;
mod toggle;

use anyhow::Result;

fn main() -> Result<()> {
    cli::run()
}
