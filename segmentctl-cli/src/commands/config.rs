//! Inspect the resolved configuration

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

use segmentctl_core::SegmentctlConfig;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the config file location
    Path,
    /// Print the resolved configuration (password redacted)
    Show,
}

pub fn run_config(args: ConfigArgs, path: &Path, config: &SegmentctlConfig) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            let note = if path.exists() { "" } else { " (not found, using defaults)" };
            println!("{}{}", path.display(), note);
        }
        ConfigCommands::Show => print!("{}", config.to_redacted_toml()),
    }
    Ok(())
}
