use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use itertools::Itertools;

use crate::utils::prelude::*;

/// bandwidth traces are recorded in megabits per second
pub const BYTES_PER_MEGABIT: f64 = 1_000_000.0 / 8.0;

/// One bandwidth observation. The bandwidth holds on the interval ending at
/// `time`, i.e. the series is piecewise-constant between samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSample {
    /// elapsed time since trace start, seconds
    pub time: f64,
    /// available bandwidth, megabits per second
    pub bandwidth: f64,
}

impl TraceSample {
    pub fn bytes_per_sec(&self) -> f64 {
        self.bandwidth * BYTES_PER_MEGABIT
    }
}

/// An immutable recorded bandwidth series, identified by file name.
#[derive(Debug, Clone)]
pub struct Trace {
    name: String,
    samples: Vec<TraceSample>,
}

impl Trace {
    /// Traces need at least two samples to span a non-empty interval.
    pub fn new(name: impl Into<String>, samples: Vec<TraceSample>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trace family: the name minus a trailing `_<index>` suffix,
    /// used for grouping in reports.
    pub fn family(&self) -> &str {
        family_of(&self.name)
    }

    pub fn samples(&self) -> &[TraceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// `norway_bus_12` belongs to family `norway_bus`; a name without a
/// trailing numeric suffix is its own family.
pub fn family_of(name: &str) -> &str {
    match name.rfind('_') {
        Some(idx) if idx + 1 < name.len() && name[idx + 1..].chars().all(|c| c.is_ascii_digit()) => &name[..idx],
        _ => name,
    }
}

/// An ordered, immutable collection of traces
#[derive(Debug, Clone)]
pub struct TraceStore {
    traces: Vec<Trace>,
}

impl TraceStore {
    /// Load every trace file from a directory. Files are visited in
    /// lexicographic order so runs are reproducible; malformed lines are
    /// skipped; a file yielding fewer than two valid samples is dropped.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| Error::Load {
            dir: dir.into(),
            reason: e.to_string(),
        })?;

        let files = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .sorted();

        let mut traces = Vec::new();
        for path in files {
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_owned(),
                None => continue,
            };
            let samples = read_samples(&path)?;
            if samples.len() < 2 {
                warn!(trace = %name, samples = samples.len(), "dropping trace, too few valid samples");
                continue;
            }
            debug!(trace = %name, samples = samples.len(), "loaded trace");
            traces.push(Trace::new(name, samples));
        }

        if traces.is_empty() {
            return Err(Error::Load {
                dir: dir.into(),
                reason: "no file contained a usable trace".into(),
            });
        }
        info!(dir = %dir.display(), traces = traces.len(), "loaded traces");
        Ok(Self { traces })
    }

    pub fn from_traces(traces: Vec<Trace>) -> Self {
        Self { traces }
    }

    pub fn get(&self, idx: usize) -> &Trace {
        &self.traces[idx]
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trace> {
        self.traces.iter()
    }
}

/// Parse `<elapsed_time> <bandwidth>` lines, skipping anything malformed
/// or non-monotonic in time.
fn read_samples(path: &Path) -> Result<Vec<TraceSample>> {
    let reader = BufReader::new(File::open(path)?);
    let mut samples: Vec<TraceSample> = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let mut cols = line.split_whitespace();
        let parsed = match (cols.next(), cols.next()) {
            (Some(t), Some(bw)) => t.parse::<f64>().ok().zip(bw.parse::<f64>().ok()),
            _ => None,
        };
        let (time, bandwidth) = match parsed {
            Some(v) => v,
            None => {
                debug!(file = %path.display(), %line, "skipping malformed line");
                continue;
            }
        };
        // time must strictly increase for intervals to be well-formed
        if samples.last().map(|s| time <= s.time).unwrap_or(false) || bandwidth < 0.0 {
            debug!(file = %path.display(), %line, "skipping out-of-order sample");
            continue;
        }
        samples.push(TraceSample { time, bandwidth });
    }
    Ok(samples)
}
