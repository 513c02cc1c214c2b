use super::{AbrPolicy, Observation};

/// Buffer-threshold rule: lowest level below the low water mark, highest
/// above the high water mark, linear index interpolation in between.
#[derive(Debug)]
pub struct BufferThreshold {
    levels: usize,
    low_water_s: f64,
    high_water_s: f64,
    default_level: usize,
}

impl BufferThreshold {
    pub fn new(levels: usize, low_water_s: f64, high_water_s: f64, default_level: usize) -> Self {
        assert!(levels > 0);
        assert!(high_water_s > low_water_s);
        Self {
            levels,
            low_water_s,
            high_water_s,
            default_level,
        }
    }
}

impl AbrPolicy for BufferThreshold {
    fn name(&self) -> &str {
        "bb"
    }

    fn startup_level(&self) -> usize {
        self.default_level
    }

    fn decide(&mut self, obs: &Observation<'_>) -> usize {
        let top = self.levels - 1;
        let buf = obs.buffer.0;
        if buf < self.low_water_s {
            0
        } else if buf >= self.high_water_s {
            top
        } else {
            let cushion = self.high_water_s - self.low_water_s;
            (top as f64 * (buf - self.low_water_s) / cushion) as usize
        }
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Duration;

    fn obs(buffer: f64) -> Observation<'static> {
        Observation {
            buffer: Duration(buffer),
            throughput_kbps: 0.0,
            latency: Duration::ZERO,
            next_chunk_bytes: &[],
        }
    }

    #[test]
    fn water_mark_boundaries() {
        let mut p = BufferThreshold::new(5, 4.0, 12.0, 1);
        // exactly at the marks
        assert_eq!(p.decide(&obs(4.0)), 0);
        assert_eq!(p.decide(&obs(12.0)), 4);
        // outside
        assert_eq!(p.decide(&obs(0.0)), 0);
        assert_eq!(p.decide(&obs(60.0)), 4);
    }

    #[test]
    fn interpolates_between_marks() {
        let mut p = BufferThreshold::new(5, 4.0, 12.0, 1);
        assert_eq!(p.decide(&obs(8.0)), 2);
        assert_eq!(p.decide(&obs(11.9)), 3);
        // strictly below the top until the high mark is reached
        assert!(p.decide(&obs(11.999)) < 4);
    }
}
