pub mod abr;
pub mod chunks;
pub mod config;
pub mod output;
pub mod playout;
pub mod run;
pub mod summary;
pub mod trace;
pub mod types;
pub mod utils;

pub use run::run_sim;
