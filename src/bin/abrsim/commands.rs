use structopt::StructOpt;

use abrsim::config::SimConfig;
use abrsim::summary;
use abrsim::utils::prelude::*;

/// Should be implemented by individual subcommand
pub trait Cmd {
    fn run(self) -> Result<()>;
}

/// Run simulation end-to-end
#[derive(StructOpt)]
pub struct Run {}

impl Cmd for Run {
    fn run(self) -> Result<()> {
        abrsim::run_sim()
    }
}

/// Show the configuration
#[derive(StructOpt)]
pub struct Config {}

impl Cmd for Config {
    fn run(self) -> Result<()> {
        let cfg: SimConfig = config().fetch()?;
        println!("{}", serde_yaml::to_string(&cfg).map_err(anyhow::Error::from)?);

        Ok(())
    }
}

/// Report per-family metrics from existing logs
#[derive(StructOpt)]
pub struct Summary {}

impl Cmd for Summary {
    fn run(self) -> Result<()> {
        let cfg: SimConfig = config().fetch()?;
        let summaries = summary::summarize_dir(&cfg.output.dir, cfg.summary)?;

        println!(
            "{:<10} {:<20} {:>7} {:>14} {:>12} {:>10} {:>10} {:>12}",
            "policy", "family", "videos", "bitrate kbps", "rebuffer s", "switches", "delay ms", "qoe"
        );
        for s in summaries {
            println!(
                "{:<10} {:<20} {:>7} {:>14.1} {:>12.2} {:>10.2} {:>10.1} {:>12.1}",
                s.policy,
                s.family,
                s.videos,
                s.mean_bitrate_kbps,
                s.mean_rebuffer_s,
                s.mean_switches,
                s.mean_delay_ms,
                s.mean_qoe
            );
        }

        Ok(())
    }
}
