use crate::types::Duration;

mod buffer;
mod from_config;
mod throughput;

pub use buffer::BufferThreshold;
pub use from_config::{from_config, PolicyConfig};
pub use throughput::Throughput;

/// What a policy observes after each downloaded segment
#[derive(Debug, Clone)]
pub struct Observation<'a> {
    /// current buffer level
    pub buffer: Duration,
    /// measured throughput of the last segment, kbps
    pub throughput_kbps: f64,
    /// measured delay of the last segment
    pub latency: Duration,
    /// byte sizes of the upcoming segment at every level
    pub next_chunk_bytes: &'a [u64],
}

/// A bitrate decision rule. `decide` absorbs the newest sample and returns
/// the level for the next segment in one call, so there is no separate
/// update step to invoke out of order.
pub trait AbrPolicy {
    fn name(&self) -> &str;

    /// level used at stream start and after `reset`
    fn startup_level(&self) -> usize;

    fn decide(&mut self, obs: &Observation<'_>) -> usize;

    /// drop windowed state at a video boundary
    fn reset(&mut self);
}

impl AbrPolicy for Box<dyn AbrPolicy> {
    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }

    #[inline]
    fn startup_level(&self) -> usize {
        (**self).startup_level()
    }

    #[inline]
    fn decide(&mut self, obs: &Observation<'_>) -> usize {
        (**self).decide(obs)
    }

    #[inline]
    fn reset(&mut self) {
        (**self).reset()
    }
}
