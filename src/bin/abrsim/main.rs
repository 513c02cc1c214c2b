use structopt::StructOpt;

use abrsim::utils::prelude::*;
use abrsim::utils::{app_config, logging, panic};

mod cli;
mod commands;

fn main() -> Result<()> {
    // panic setup should be done early
    panic::setup();

    let opt = cli::Opt::from_args();

    // initialize configuration: defaults + env, then file and preset overrides
    app_config::setup()?;
    if let Some(path) = &opt.config {
        config_mut().use_file(path)?;
    }
    if let Some(preset) = &opt.preset {
        config_mut().use_preset(preset)?;
    }

    // logging reads its own config section, so it comes after
    let _guard = logging::setup()?;

    trace!("start cli execution");

    opt.cmd.run()
}
