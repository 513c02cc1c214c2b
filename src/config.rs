use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::abr::PolicyConfig;
use crate::chunks::ChunkSizeTable;
use crate::utils::prelude::*;

/// The full simulation config, deserialized from the global AppConfig
#[derive(Debug, Deserialize, Serialize)]
pub struct SimConfig {
    /// seed string for all randomness (cursor restarts, delay jitter)
    pub seed: Option<String>,
    pub traces: TracesConfig,
    pub video: VideoConfig,
    pub player: PlayerConfig,
    pub policies: Vec<PolicyConfig>,
    pub output: OutputConfig,
    pub summary: SummaryConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TracesConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoConfig {
    /// nominal encoding bitrates, kbps, lowest first
    pub ladder_kbps: Vec<f64>,
    pub segment_seconds: f64,
    pub total_segments: usize,
    /// directory of `video_size_<level>` files; synthetic sizes when unset
    #[serde(default)]
    pub sizes_dir: Option<PathBuf>,
}

impl VideoConfig {
    pub fn table(&self) -> Result<ChunkSizeTable> {
        match &self.sizes_dir {
            Some(dir) => ChunkSizeTable::from_files(dir, self.ladder_kbps.len(), self.segment_seconds),
            None => Ok(ChunkSizeTable::synthetic(
                &self.ladder_kbps,
                self.total_segments,
                self.segment_seconds,
            )),
        }
    }
}

/// Player and link model parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// buffer cap; any excess becomes explicit sleep time
    pub buffer_max_seconds: f64,
    /// fixed per-segment overhead, models connection setup
    pub link_rtt_ms: f64,
    /// fraction of raw bandwidth that carries payload
    pub payload_portion: f64,
    /// multiplicative delay jitter bounds; equal bounds disable jitter
    pub noise_low: f64,
    pub noise_high: f64,
    /// per-step cap on trace walk iterations, guards degenerate traces
    pub max_walk_iterations: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            buffer_max_seconds: 60.0,
            link_rtt_ms: 80.0,
            payload_portion: 0.95,
            noise_low: 0.9,
            noise_high: 1.1,
            max_walk_iterations: 100_000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl OutputConfig {
    /// Path of an output file, creating the directory on first use
    pub fn file(&self, name: impl AsRef<Path>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        Ok(self.dir.join(name))
    }
}

/// Weights of the linear QoE score in the summary report
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SummaryConfig {
    pub rebuffer_penalty: f64,
    pub switch_penalty: f64,
}
