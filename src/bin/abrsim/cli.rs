use std::path::PathBuf;

use structopt::StructOpt;

use abrsim::utils::prelude::*;

use crate::commands::{self, Cmd};

#[derive(StructOpt)]
#[structopt(name = "abrsim", about = "Evaluate ABR policies against recorded bandwidth traces")]
pub struct Opt {
    /// Set a custom config file
    #[structopt(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Apply a preset section from the config
    #[structopt(short, long, value_name = "NAME")]
    pub preset: Option<String>,

    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Run the full simulation batch
    Run(commands::Run),
    /// Show the merged configuration
    Config(commands::Config),
    /// Summarize existing per-chunk logs by trace family
    Summary(commands::Summary),
}

impl Command {
    pub fn run(self) -> Result<()> {
        match self {
            Command::Run(cmd) => cmd.run(),
            Command::Config(cmd) => cmd.run(),
            Command::Summary(cmd) => cmd.run(),
        }
    }
}
