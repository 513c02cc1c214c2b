use std::collections::BTreeMap;
use std::path::Path;

use itertools::Itertools;

use crate::config::SummaryConfig;
use crate::output::ChunkRecord;
use crate::trace::family_of;
use crate::utils::prelude::*;

/// Aggregated playback metrics for one (policy, trace family) pair
#[derive(Debug, Clone, PartialEq)]
pub struct FamilySummary {
    pub policy: String,
    pub family: String,
    /// video playbacks that contributed
    pub videos: usize,
    pub mean_bitrate_kbps: f64,
    /// mean per-video stall total, seconds
    pub mean_rebuffer_s: f64,
    /// mean per-video quality switch count
    pub mean_switches: f64,
    /// mean per-segment download delay, milliseconds
    pub mean_delay_ms: f64,
    /// mean per-video `bitrate − rebuffer_penalty·stalls − switch_penalty·switches`
    pub mean_qoe: f64,
}

/// Per-video accumulator; one video is a run of records on the same trace
/// with a non-decreasing clock.
#[derive(Debug, Default)]
struct VideoStats {
    bitrates: Vec<f64>,
    delays_ms: Vec<f64>,
    rebuffer_s: f64,
    switches: usize,
}

impl VideoStats {
    fn push(&mut self, rec: &ChunkRecord) {
        if let Some(prev) = self.bitrates.last() {
            if (rec.bitrate_kbps - prev).abs() > f64::EPSILON {
                self.switches += 1;
            }
        }
        self.bitrates.push(rec.bitrate_kbps);
        self.delays_ms.push(rec.delay_ms);
        self.rebuffer_s += rec.rebuffer_s;
    }

    fn mean_bitrate(&self) -> f64 {
        mean_of(&self.bitrates)
    }

    fn mean_delay_ms(&self) -> f64 {
        mean_of(&self.delays_ms)
    }
}

fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[derive(Debug, Default)]
struct FamilyAcc {
    bitrates: Vec<f64>,
    delays_ms: Vec<f64>,
    rebuffers: Vec<f64>,
    switches: Vec<usize>,
}

impl FamilyAcc {
    fn push(&mut self, video: &VideoStats) {
        self.bitrates.push(video.mean_bitrate());
        self.delays_ms.push(video.mean_delay_ms());
        self.rebuffers.push(video.rebuffer_s);
        self.switches.push(video.switches);
    }
}

/// Summarize every `log_<policy>.csv` found in the output directory.
pub fn summarize_dir(dir: impl AsRef<Path>, weights: SummaryConfig) -> Result<Vec<FamilySummary>> {
    let dir = dir.as_ref();
    let files = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("log_") && n.ends_with(".csv"))
                .unwrap_or(false)
        })
        .sorted();

    let mut acc: BTreeMap<(String, String), FamilyAcc> = BTreeMap::new();
    let mut any = false;
    for path in files {
        any = true;
        summarize_log(&path, &mut acc)?;
    }
    if !any {
        return Err(anyhow::anyhow!("no log_*.csv files under {}", dir.display()).into());
    }

    Ok(acc
        .into_iter()
        .map(|((policy, family), fam)| {
            let videos = fam.bitrates.len();
            let mean = |v: &[f64]| v.iter().sum::<f64>() / videos as f64;
            let mean_bitrate_kbps = mean(&fam.bitrates);
            let mean_delay_ms = mean(&fam.delays_ms);
            let mean_rebuffer_s = mean(&fam.rebuffers);
            let mean_switches = fam.switches.iter().sum::<usize>() as f64 / videos as f64;
            let mean_qoe = mean_bitrate_kbps
                - weights.rebuffer_penalty * mean_rebuffer_s
                - weights.switch_penalty * mean_switches;
            FamilySummary {
                policy,
                family,
                videos,
                mean_bitrate_kbps,
                mean_rebuffer_s,
                mean_switches,
                mean_delay_ms,
                mean_qoe,
            }
        })
        .collect())
}

fn summarize_log(path: &Path, acc: &mut BTreeMap<(String, String), FamilyAcc>) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut current: Option<(String, String, f64, VideoStats)> = None;
    for record in reader.into_records() {
        let record = record?;
        if record.len() < 9 {
            // blank separator between videos
            continue;
        }
        let rec: ChunkRecord = match record.deserialize(Some(&headers)) {
            Ok(rec) => rec,
            Err(err) => {
                debug!(file = %path.display(), %err, "skipping unreadable record");
                continue;
            }
        };

        // the clock strictly increases within one video (delay > 0),
        // so a non-increasing clock on the same trace is a replay
        let boundary = match &current {
            Some((_, trace, clock, _)) => *trace != rec.trace || rec.time_s <= *clock,
            None => true,
        };
        if boundary {
            flush_video(acc, current.take());
            current = Some((rec.policy.clone(), rec.trace.clone(), rec.time_s, VideoStats::default()));
        }
        if let Some((_, _, clock, video)) = current.as_mut() {
            *clock = rec.time_s;
            video.push(&rec);
        }
    }
    flush_video(acc, current.take());
    Ok(())
}

fn flush_video(acc: &mut BTreeMap<(String, String), FamilyAcc>, video: Option<(String, String, f64, VideoStats)>) {
    if let Some((policy, trace, _, stats)) = video {
        if !stats.bitrates.is_empty() {
            acc.entry((policy, family_of(&trace).to_owned()))
                .or_default()
                .push(&stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::output::ChunkLog;

    fn record(trace: &str, time_s: f64, bitrate: f64, rebuf: f64) -> ChunkRecord {
        ChunkRecord {
            policy: "bb".into(),
            trace: trace.into(),
            time_s,
            bitrate_kbps: bitrate,
            buffer_s: 4.0,
            rebuffer_s: rebuf,
            chunk_bytes: 375_000,
            delay_ms: 1200.0,
            throughput_kbps: 2500.0,
        }
    }

    #[test]
    fn groups_by_family_and_counts_switches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log_bb.csv");
        let mut log = ChunkLog::create(&path).unwrap();
        // video 1: one switch, 2s of stalls
        log.write(&record("bus_1", 4.0, 300.0, 2.0)).unwrap();
        log.write(&record("bus_1", 8.0, 750.0, 0.0)).unwrap();
        log.end_video().unwrap();
        // video 2, same family: steady but slower to download
        log.write(&record("bus_2", 4.0, 750.0, 0.0)).unwrap();
        let mut slow = record("bus_2", 8.0, 750.0, 0.0);
        slow.delay_ms = 1800.0;
        log.write(&slow).unwrap();
        log.flush().unwrap();
        drop(log);

        let weights = SummaryConfig {
            rebuffer_penalty: 4.3,
            switch_penalty: 1.0,
        };
        let summaries = summarize_dir(dir.path(), weights).unwrap();
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];
        assert_eq!((s.policy.as_str(), s.family.as_str()), ("bb", "bus"));
        assert_eq!(s.videos, 2);
        // (525 + 750) / 2
        assert_relative_eq!(s.mean_bitrate_kbps, 637.5);
        assert_relative_eq!(s.mean_rebuffer_s, 1.0);
        assert_relative_eq!(s.mean_switches, 0.5);
        // video means 1200 and 1500, averaged over the family
        assert_relative_eq!(s.mean_delay_ms, 1350.0);
        assert_relative_eq!(s.mean_qoe, 637.5 - 4.3 - 0.5);
    }

    #[test]
    fn detects_video_boundary_without_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log_bb.csv");
        let mut log = ChunkLog::create(&path).unwrap();
        log.write(&record("bus_1", 4.0, 300.0, 0.0)).unwrap();
        // clock restarts on the same trace: a replayed video
        log.write(&record("bus_1", 4.0, 300.0, 0.0)).unwrap();
        log.flush().unwrap();
        drop(log);

        let weights = SummaryConfig {
            rebuffer_penalty: 4.3,
            switch_penalty: 1.0,
        };
        let summaries = summarize_dir(dir.path(), weights).unwrap();
        assert_eq!(summaries[0].videos, 2);
    }

    #[test]
    fn empty_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(summarize_dir(dir.path(), SummaryConfig { rebuffer_penalty: 1.0, switch_penalty: 1.0 }).is_err());
    }
}
