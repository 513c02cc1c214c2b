use parse_display::Display;
use rand::Rng;
use rand_seeder::SipRng;

use crate::chunks::ChunkSizeTable;
use crate::config::PlayerConfig;
use crate::trace::{Trace, TraceStore};
use crate::types::Duration;
use crate::utils::prelude::*;

const MS_IN_S: f64 = 1000.0;

/// Informational playback phase after a step. A stall never blocks the
/// next `step()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PlaybackPhase {
    Playing,
    Stalled,
    VideoDone,
}

/// Everything one `step()` produced, with explicit units
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// wall time spent downloading the segment, RTT and jitter included
    pub delay: Duration,
    /// time the player idled to drain the buffer below its cap
    pub sleep: Duration,
    /// buffer level after this segment was added
    pub buffer: Duration,
    /// playback stall incurred waiting for this segment
    pub rebuffer: Duration,
    /// bytes of the downloaded segment
    pub chunk_bytes: u64,
    /// sizes of the upcoming segment at every level; empty at video end
    pub next_chunk_bytes: Vec<u64>,
    pub video_done: bool,
    pub segments_remaining: usize,
    /// measured download rate, bytes per second
    pub throughput: f64,
}

impl StepOutcome {
    pub fn throughput_kbps(&self) -> f64 {
        self.throughput * 8.0 / 1000.0
    }

    pub fn phase(&self) -> PlaybackPhase {
        if self.video_done {
            PlaybackPhase::VideoDone
        } else if self.rebuffer > Duration::ZERO {
            PlaybackPhase::Stalled
        } else {
            PlaybackPhase::Playing
        }
    }
}

/// The discrete-event playout core. Owns the simulation cursor, the playback
/// buffer and the segment index; one instance drives one pass over a trace
/// collection. One video maps to exactly one trace: the cursor wraps within
/// the current trace mid-video, and only `next_video()` moves to the next one.
pub struct PlayoutSim {
    player: PlayerConfig,
    chunks: ChunkSizeTable,
    traces: TraceStore,
    rng: SipRng,

    trace_idx: usize,
    /// index of the sample closing the current interval, in `1..trace.len()`
    ptr: usize,
    /// fractional time position within the trace, seconds
    last_time: f64,
    /// seconds of downloaded but unplayed video
    buffer: f64,
    /// next segment to download
    segment: usize,

    last_delay: f64,
    last_throughput: f64,
}

impl PlayoutSim {
    pub fn new(player: PlayerConfig, chunks: ChunkSizeTable, traces: TraceStore, rng: SipRng) -> Self {
        assert!(!traces.is_empty(), "need at least one trace");
        let last_time = traces.get(0).samples().first().map(|s| s.time).unwrap_or(0.0);
        Self {
            player,
            chunks,
            traces,
            rng,
            trace_idx: 0,
            ptr: 1,
            last_time,
            buffer: 0.0,
            segment: 0,
            last_delay: 0.0,
            last_throughput: 0.0,
        }
    }

    pub fn trace(&self) -> &Trace {
        self.traces.get(self.trace_idx)
    }

    pub fn trace_index(&self) -> usize {
        self.trace_idx
    }

    pub fn buffer(&self) -> Duration {
        Duration(self.buffer)
    }

    pub fn segment_index(&self) -> usize {
        self.segment
    }

    /// delay of the most recent step, seconds
    pub fn last_delay(&self) -> Duration {
        Duration(self.last_delay)
    }

    /// throughput of the most recent step, bytes per second
    pub fn last_throughput(&self) -> f64 {
        self.last_throughput
    }

    /// Download the next segment at `level` and account for playback.
    pub fn step(&mut self, level: usize) -> Result<StepOutcome> {
        let levels = self.chunks.levels();
        if level >= levels {
            return Err(Error::InvalidBitrate { level, levels });
        }
        let chunk_bytes = match self.chunks.size(level, self.segment) {
            Some(b) => b,
            None => return Err(anyhow::anyhow!("step() called after video end").into()),
        };
        if self.trace().len() < 2 {
            // a single sample spans no interval, nothing can ever arrive
            return Err(Error::TraceExhausted {
                trace: self.trace().name().to_owned(),
            });
        }

        // walk the bandwidth series until the segment is fully delivered
        let mut iters = 0usize;
        let download_s = self.download(chunk_bytes as f64, &mut iters)?;

        // per-segment overhead and bounded jitter
        let mut delay_s = download_s + self.player.link_rtt_ms / MS_IN_S;
        if self.player.noise_high > self.player.noise_low {
            delay_s *= self.rng.gen_range(self.player.noise_low..self.player.noise_high);
        } else {
            delay_s *= self.player.noise_low;
        }

        // buffer and stall accounting
        let rebuffer = (delay_s - self.buffer).max(0.0);
        self.buffer = (self.buffer - delay_s).max(0.0) + self.chunks.segment_seconds();
        let mut sleep_s = 0.0;
        if self.buffer > self.player.buffer_max_seconds {
            // excess becomes explicit idle time; the cursor still advances,
            // the network keeps flowing while the player pauses downloads
            sleep_s = self.buffer - self.player.buffer_max_seconds;
            self.buffer = self.player.buffer_max_seconds;
            self.idle(sleep_s, &mut iters)?;
        }

        self.segment += 1;
        let total = self.chunks.total_segments();
        let video_done = self.segment >= total;
        let throughput = chunk_bytes as f64 / delay_s;
        self.last_delay = delay_s;
        self.last_throughput = throughput;

        debug!(
            trace = %self.trace().name(),
            segment = self.segment - 1,
            level,
            delay = delay_s,
            rebuffer,
            buffer = self.buffer,
            "step"
        );

        Ok(StepOutcome {
            delay: Duration(delay_s),
            sleep: Duration(sleep_s),
            buffer: Duration(self.buffer),
            rebuffer: Duration(rebuffer),
            chunk_bytes,
            next_chunk_bytes: if video_done { Vec::new() } else { self.chunks.sizes_at(self.segment) },
            video_done,
            segments_remaining: total.saturating_sub(self.segment),
            throughput,
        })
    }

    /// Reset for the next video on the next trace. Returns false once the
    /// trace collection is exhausted.
    pub fn next_video(&mut self) -> bool {
        self.segment = 0;
        self.buffer = 0.0;
        self.trace_idx += 1;
        if self.trace_idx >= self.traces.len() {
            return false;
        }
        self.ptr = 1;
        self.last_time = self.traces.get(self.trace_idx).samples()[0].time;
        true
    }

    /// Wall time needed to deliver `target` bytes starting at the cursor.
    /// The interval of satisfaction is only fractionally consumed.
    fn download(&mut self, target: f64, iters: &mut usize) -> Result<f64> {
        let mut elapsed = 0.0;
        let mut received = 0.0;
        loop {
            self.charge_iteration(iters)?;
            let (boundary, bytes_per_sec) = {
                let s = &self.traces.get(self.trace_idx).samples()[self.ptr];
                (s.time, s.bytes_per_sec())
            };
            let interval = boundary - self.last_time;
            let payload = bytes_per_sec * interval * self.player.payload_portion;
            if received + payload > target {
                let fractional = (target - received) / bytes_per_sec / self.player.payload_portion;
                self.last_time += fractional;
                elapsed += fractional;
                return Ok(elapsed);
            }
            received += payload;
            elapsed += interval;
            self.advance_interval(boundary);
        }
    }

    /// Move the cursor through `duration_s` of trace time without
    /// consuming bytes.
    fn idle(&mut self, duration_s: f64, iters: &mut usize) -> Result<()> {
        let mut remaining = duration_s;
        loop {
            self.charge_iteration(iters)?;
            let boundary = self.traces.get(self.trace_idx).samples()[self.ptr].time;
            let avail = boundary - self.last_time;
            if avail > remaining {
                self.last_time += remaining;
                return Ok(());
            }
            remaining -= avail;
            self.advance_interval(boundary);
        }
    }

    fn advance_interval(&mut self, boundary: f64) {
        self.last_time = boundary;
        self.ptr += 1;
        let len = self.traces.get(self.trace_idx).len();
        if self.ptr >= len {
            // the trace loops within one playback; restart at a seeded-random
            // offset so replays do not phase-lock to the segment cadence
            self.ptr = if len > 2 { self.rng.gen_range(1..len) } else { 1 };
            self.last_time = self.traces.get(self.trace_idx).samples()[self.ptr - 1].time;
        }
    }

    fn charge_iteration(&mut self, iters: &mut usize) -> Result<()> {
        *iters += 1;
        if *iters > self.player.max_walk_iterations {
            return Err(Error::TraceExhausted {
                trace: self.trace().name().to_owned(),
            });
        }
        Ok(())
    }
}
