use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::anyhow;

use crate::utils::prelude::*;

/// Per-segment byte sizes of a fixed video, one row per bitrate level.
#[derive(Debug, Clone)]
pub struct ChunkSizeTable {
    /// sizes[level][segment], bytes
    sizes: Vec<Vec<u64>>,
    /// playback duration of every segment, seconds
    segment_seconds: f64,
}

impl ChunkSizeTable {
    /// Idealized table derived from the nominal ladder: every segment at
    /// level `b` is exactly `ladder[b] * segment_seconds` worth of bits.
    pub fn synthetic(ladder_kbps: &[f64], total_segments: usize, segment_seconds: f64) -> Self {
        let sizes = ladder_kbps
            .iter()
            .map(|kbps| {
                let bytes = (kbps * 1000.0 / 8.0 * segment_seconds).round() as u64;
                vec![bytes; total_segments]
            })
            .collect();
        Self { sizes, segment_seconds }
    }

    /// Load real encode sizes from `video_size_<level>` files, one byte
    /// count per line. All levels must list the same number of segments.
    pub fn from_files(dir: impl AsRef<Path>, levels: usize, segment_seconds: f64) -> Result<Self> {
        let dir = dir.as_ref();
        let mut sizes = Vec::with_capacity(levels);
        for level in 0..levels {
            let path = dir.join(format!("video_size_{}", level));
            let reader = BufReader::new(File::open(&path)?);
            let row: Vec<u64> = reader
                .lines()
                .collect::<std::io::Result<Vec<_>>>()?
                .iter()
                .filter_map(|line| line.trim().parse().ok())
                .collect();
            if let Some(expected) = sizes.first().map(|r: &Vec<u64>| r.len()) {
                if expected != row.len() {
                    return Err(anyhow!(
                        "{} lists {} segments, expected {}",
                        path.display(),
                        row.len(),
                        expected
                    )
                    .into());
                }
            }
            sizes.push(row);
        }
        if sizes.iter().map(|r| r.len()).next().unwrap_or(0) == 0 {
            return Err(anyhow!("no segment sizes found under {}", dir.display()).into());
        }
        Ok(Self { sizes, segment_seconds })
    }

    pub fn levels(&self) -> usize {
        self.sizes.len()
    }

    pub fn total_segments(&self) -> usize {
        self.sizes.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn segment_seconds(&self) -> f64 {
        self.segment_seconds
    }

    pub fn size(&self, level: usize, segment: usize) -> Option<u64> {
        self.sizes.get(level)?.get(segment).copied()
    }

    /// Sizes of one segment across all levels; empty past the last segment.
    pub fn sizes_at(&self, segment: usize) -> Vec<u64> {
        if segment >= self.total_segments() {
            return Vec::new();
        }
        self.sizes.iter().map(|row| row[segment]).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn synthetic_sizes() {
        let table = ChunkSizeTable::synthetic(&[300.0, 750.0], 5, 4.0);
        assert_eq!(table.levels(), 2);
        assert_eq!(table.total_segments(), 5);
        // 750 kbps over 4s = 375000 bytes
        assert_eq!(table.size(1, 0), Some(375_000));
        assert_eq!(table.size(1, 4), Some(375_000));
        assert_eq!(table.size(2, 0), None);
        assert_eq!(table.size(0, 5), None);
    }

    #[test]
    fn sizes_at_column() {
        let table = ChunkSizeTable::synthetic(&[300.0, 750.0, 1200.0], 3, 4.0);
        assert_eq!(table.sizes_at(0), vec![150_000, 375_000, 600_000]);
        assert!(table.sizes_at(3).is_empty());
    }

    #[test]
    fn from_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        for (level, sizes) in [[100u64, 200], [300, 400]].iter().enumerate() {
            let mut f = File::create(dir.path().join(format!("video_size_{}", level))).unwrap();
            for s in sizes {
                writeln!(f, "{}", s).unwrap();
            }
        }
        let table = ChunkSizeTable::from_files(dir.path(), 2, 4.0).unwrap();
        assert_eq!(table.total_segments(), 2);
        assert_eq!(table.size(1, 1), Some(400));
    }

    #[test]
    fn from_files_rejects_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("video_size_0"), "1\n2\n").unwrap();
        std::fs::write(dir.path().join("video_size_1"), "1\n").unwrap();
        assert!(ChunkSizeTable::from_files(dir.path(), 2, 4.0).is_err());
    }
}
