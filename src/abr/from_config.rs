use parse_display::Display;

use super::{AbrPolicy, BufferThreshold, Throughput};
use crate::utils::prelude::*;

pub fn from_config(cfg: &PolicyConfig, ladder_kbps: &[f64]) -> Result<Box<dyn AbrPolicy + 'static>> {
    info!(policy = %cfg, "using");
    let levels = ladder_kbps.len();
    Ok(match *cfg {
        PolicyConfig::BufferThreshold {
            low_water_s,
            high_water_s,
            default_level,
        } => {
            check_level(default_level, levels)?;
            Box::new(BufferThreshold::new(levels, low_water_s, high_water_s, default_level))
        }
        PolicyConfig::Throughput {
            window,
            z_throughput,
            z_latency,
            latency_threshold_s,
            default_level,
        } => {
            check_level(default_level, levels)?;
            Box::new(Throughput::new(
                ladder_kbps.to_vec(),
                window,
                z_throughput,
                z_latency,
                latency_threshold_s,
                default_level,
            ))
        }
    })
}

fn check_level(level: usize, levels: usize) -> Result<()> {
    if level >= levels {
        return Err(Error::InvalidBitrate { level, levels });
    }
    Ok(())
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, Display)]
#[serde(tag = "type")]
pub enum PolicyConfig {
    #[display("BufferThreshold(low={low_water_s}, high={high_water_s})")]
    BufferThreshold {
        low_water_s: f64,
        high_water_s: f64,
        default_level: usize,
    },
    #[display("Throughput(window={window}, z_thr={z_throughput}, z_lat={z_latency})")]
    Throughput {
        window: usize,
        z_throughput: f64,
        z_latency: f64,
        latency_threshold_s: f64,
        default_level: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_default_level() {
        let cfg = PolicyConfig::BufferThreshold {
            low_water_s: 4.0,
            high_water_s: 12.0,
            default_level: 3,
        };
        let err = from_config(&cfg, &[300.0, 750.0]).err().unwrap();
        assert!(matches!(err, Error::InvalidBitrate { level: 3, levels: 2 }));
    }

    #[test]
    fn builds_named_policies() {
        let ladder = [300.0, 750.0, 1200.0];
        let bb = from_config(
            &PolicyConfig::BufferThreshold {
                low_water_s: 4.0,
                high_water_s: 12.0,
                default_level: 1,
            },
            &ladder,
        )
        .unwrap();
        assert_eq!(bb.name(), "bb");
        assert_eq!(bb.startup_level(), 1);

        let stallion = from_config(
            &PolicyConfig::Throughput {
                window: 8,
                z_throughput: 0.1,
                z_latency: 1.5,
                latency_threshold_s: 4.0,
                default_level: 0,
            },
            &ladder,
        )
        .unwrap();
        assert_eq!(stallion.name(), "stallion");
    }
}
