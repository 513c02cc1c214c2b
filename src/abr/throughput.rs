use std::collections::VecDeque;

use super::{AbrPolicy, Observation};

/// Conservative throughput estimation over a sliding window, with a latency
/// penalty. The estimate is `mean - z_thr * stddev`; when the pessimistic
/// latency estimate overshoots the threshold, the throughput estimate is
/// divided by the overshoot ratio. The chosen level is the highest ladder
/// entry the estimate can sustain.
#[derive(Debug)]
pub struct Throughput {
    ladder_kbps: Vec<f64>,
    window: usize,
    z_throughput: f64,
    z_latency: f64,
    latency_threshold_s: f64,
    default_level: usize,

    thr_window: VecDeque<f64>,
    lat_window: VecDeque<f64>,
}

impl Throughput {
    pub fn new(
        ladder_kbps: Vec<f64>,
        window: usize,
        z_throughput: f64,
        z_latency: f64,
        latency_threshold_s: f64,
        default_level: usize,
    ) -> Self {
        assert!(!ladder_kbps.is_empty());
        assert!(window > 0);
        Self {
            ladder_kbps,
            window,
            z_throughput,
            z_latency,
            latency_threshold_s,
            default_level,
            thr_window: VecDeque::new(),
            lat_window: VecDeque::new(),
        }
    }

    fn push(&mut self, throughput_kbps: f64, latency_s: f64) {
        if self.thr_window.len() >= self.window {
            self.thr_window.pop_front();
        }
        if self.lat_window.len() >= self.window {
            self.lat_window.pop_front();
        }
        self.thr_window.push_back(throughput_kbps);
        self.lat_window.push_back(latency_s);
    }

    /// kbps the link can be trusted to sustain
    fn safe_throughput(&self) -> f64 {
        let (thr_mean, thr_std) = mean_std(&self.thr_window);
        let mut safe = (thr_mean - self.z_throughput * thr_std).max(0.0);

        let (lat_mean, lat_std) = mean_std(&self.lat_window);
        let safe_latency = lat_mean + self.z_latency * lat_std;
        if safe_latency > self.latency_threshold_s {
            safe /= safe_latency / self.latency_threshold_s;
        }
        safe
    }
}

impl AbrPolicy for Throughput {
    fn name(&self) -> &str {
        "stallion"
    }

    fn startup_level(&self) -> usize {
        self.default_level
    }

    fn decide(&mut self, obs: &Observation<'_>) -> usize {
        self.push(obs.throughput_kbps, obs.latency.0);
        let safe = self.safe_throughput();
        self.ladder_kbps
            .iter()
            .rposition(|&kbps| kbps <= safe)
            .unwrap_or(0)
    }

    fn reset(&mut self) {
        self.thr_window.clear();
        self.lat_window.clear();
    }
}

/// population mean and standard deviation; (0, 0) on an empty window
fn mean_std(window: &VecDeque<f64>) -> (f64, f64) {
    if window.is_empty() {
        return (0.0, 0.0);
    }
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::types::Duration;

    const LADDER: [f64; 5] = [300.0, 750.0, 1200.0, 1850.0, 2850.0];

    fn policy() -> Throughput {
        Throughput::new(LADDER.to_vec(), 8, 0.1, 1.5, 4.0, 1)
    }

    fn obs(throughput_kbps: f64, latency_s: f64) -> Observation<'static> {
        Observation {
            buffer: Duration::ZERO,
            throughput_kbps,
            latency: Duration(latency_s),
            next_chunk_bytes: &[],
        }
    }

    #[test]
    fn zero_variance_means_no_penalty() {
        let mut p = policy();
        for _ in 0..8 {
            p.decide(&obs(1000.0, 0.5));
        }
        assert_relative_eq!(p.safe_throughput(), 1000.0, max_relative = 1e-12);
        assert_eq!(p.decide(&obs(1000.0, 0.5)), 1);
    }

    #[test]
    fn variance_lowers_the_estimate() {
        let mut p = policy();
        let mut steady = policy();
        for i in 0..8 {
            p.decide(&obs(if i % 2 == 0 { 500.0 } else { 1500.0 }, 0.5));
            steady.decide(&obs(1000.0, 0.5));
        }
        assert!(p.safe_throughput() < steady.safe_throughput());
    }

    #[test]
    fn latency_overshoot_penalizes_throughput() {
        let mut p = policy();
        for _ in 0..8 {
            p.decide(&obs(2000.0, 8.0));
        }
        // 8s latency vs 4s threshold halves the estimate
        assert_relative_eq!(p.safe_throughput(), 1000.0, max_relative = 1e-12);
    }

    #[test]
    fn nothing_affordable_falls_back_to_lowest() {
        let mut p = policy();
        assert_eq!(p.decide(&obs(100.0, 0.5)), 0);
    }

    #[test]
    fn window_is_bounded_and_reset_clears_it() {
        let mut p = policy();
        for _ in 0..20 {
            p.decide(&obs(1000.0, 0.5));
        }
        assert_eq!(p.thr_window.len(), 8);
        p.reset();
        assert!(p.thr_window.is_empty() && p.lat_window.is_empty());
    }
}
