use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::prelude::*;

/// One row per downloaded segment, the interface to logging and plotting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub policy: String,
    pub trace: String,
    /// cumulative playback clock within the video, seconds
    pub time_s: f64,
    /// nominal bitrate the segment was fetched at, kbps
    pub bitrate_kbps: f64,
    pub buffer_s: f64,
    pub rebuffer_s: f64,
    pub chunk_bytes: u64,
    pub delay_ms: f64,
    pub throughput_kbps: f64,
}

/// CSV writer for per-chunk records. Videos within one continuous log are
/// separated by a blank record.
pub struct ChunkLog<W: Write> {
    writer: csv::Writer<W>,
    /// records written since the last separator
    pending: bool,
}

impl ChunkLog<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path.as_ref())?;
        Ok(Self { writer, pending: false })
    }
}

impl<W: Write> ChunkLog<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().flexible(true).from_writer(writer),
            pending: false,
        }
    }

    pub fn write(&mut self, record: &ChunkRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.pending = true;
        Ok(())
    }

    /// Blank separator record marking the end of one video playback.
    /// A video that produced no records leaves no separator, so the header
    /// always stays the first row of the file.
    pub fn end_video(&mut self) -> Result<()> {
        if !self.pending {
            return Ok(());
        }
        self.writer.write_record(&[""])?;
        self.pending = false;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(trace: &str, time_s: f64) -> ChunkRecord {
        ChunkRecord {
            policy: "bb".into(),
            trace: trace.into(),
            time_s,
            bitrate_kbps: 750.0,
            buffer_s: 4.0,
            rebuffer_s: 0.0,
            chunk_bytes: 375_000,
            delay_ms: 1200.0,
            throughput_kbps: 2500.0,
        }
    }

    #[test]
    fn writes_header_rows_and_separator() {
        let mut log = ChunkLog::from_writer(Vec::new());
        log.write(&record("a_1", 4.0)).unwrap();
        log.end_video().unwrap();
        log.write(&record("a_2", 4.0)).unwrap();
        log.flush().unwrap();

        let text = String::from_utf8(log.writer.into_inner().unwrap()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("policy,trace,time_s,"));
        assert!(lines[1].starts_with("bb,a_1,4.0,"));
        assert_eq!(lines[2], "\"\"");
        assert!(lines[3].starts_with("bb,a_2,"));
    }

    #[test]
    fn empty_videos_leave_no_separator() {
        let mut log = ChunkLog::from_writer(Vec::new());
        // the first video dies before producing a record
        log.end_video().unwrap();
        log.write(&record("a_2", 4.0)).unwrap();
        log.end_video().unwrap();
        log.end_video().unwrap();
        log.flush().unwrap();

        let text = String::from_utf8(log.writer.into_inner().unwrap()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        // the header must stay on the first line
        assert!(lines[0].starts_with("policy,trace,time_s,"));
        assert!(lines[1].starts_with("bb,a_2,"));
        assert_eq!(lines[2], "\"\"");
        assert_eq!(lines.len(), 3);
    }
}
