use rand_seeder::{Seeder, SipRng};

use crate::abr::{self, AbrPolicy, Observation};
use crate::config::SimConfig;
use crate::output::{ChunkLog, ChunkRecord};
use crate::playout::PlayoutSim;
use crate::trace::TraceStore;
use crate::types::Time;
use crate::utils::prelude::*;

/// Run every configured policy over the whole trace collection and persist
/// one per-chunk log per policy.
pub fn run_sim() -> Result<()> {
    let _g = info_span!("sim").entered();

    let cfg: SimConfig = config().fetch()?;
    let traces = TraceStore::load(&cfg.traces.dir)?;
    let chunks = cfg.video.table()?;
    let seed = cfg.seed.as_deref().unwrap_or("steady stream");

    for policy_cfg in &cfg.policies {
        let mut policy = abr::from_config(policy_cfg, &cfg.video.ladder_kbps)?;
        let _g = info_span!("run", policy = %policy.name()).entered();

        // each policy replays the identical seeded world for fairness
        let rng: SipRng = Seeder::from(seed).make_rng();
        let sim = PlayoutSim::new(cfg.player.clone(), chunks.clone(), traces.clone(), rng);

        let path = cfg.output.file(format!("log_{}.csv", policy.name()))?;
        let mut log = ChunkLog::create(&path)?;
        run_policy(sim, policy.as_mut(), &cfg, &mut log)?;
        log.flush()?;
        info!(log = %path.display(), "policy finished");
    }

    Ok(())
}

/// One pass of a single policy over all traces.
pub fn run_policy<W: std::io::Write>(
    mut sim: PlayoutSim,
    policy: &mut dyn AbrPolicy,
    cfg: &SimConfig,
    log: &mut ChunkLog<W>,
) -> Result<()> {
    let mut level = policy.startup_level();
    let mut clock = Time::default();

    loop {
        let outcome = match sim.step(level) {
            Ok(outcome) => outcome,
            Err(Error::TraceExhausted { trace }) => {
                // a dead trace is fatal for that trace only, not the batch
                warn!(%trace, "skipping trace, it cannot deliver data");
                log.end_video()?;
                policy.reset();
                level = policy.startup_level();
                clock = Time::default();
                if !sim.next_video() {
                    break;
                }
                continue;
            }
            Err(err) => return Err(err),
        };

        clock += outcome.delay + outcome.sleep;
        log.write(&ChunkRecord {
            policy: policy.name().to_owned(),
            trace: sim.trace().name().to_owned(),
            time_s: clock.0,
            bitrate_kbps: cfg.video.ladder_kbps[level],
            buffer_s: outcome.buffer.0,
            rebuffer_s: outcome.rebuffer.0,
            chunk_bytes: outcome.chunk_bytes,
            delay_ms: outcome.delay.millis(),
            throughput_kbps: outcome.throughput_kbps(),
        })?;

        if outcome.video_done {
            log.end_video()?;
            policy.reset();
            level = policy.startup_level();
            clock = Time::default();
            if !sim.next_video() {
                break;
            }
        } else {
            let obs = Observation {
                buffer: outcome.buffer,
                throughput_kbps: outcome.throughput_kbps(),
                latency: outcome.delay,
                next_chunk_bytes: &outcome.next_chunk_bytes,
            };
            level = policy.decide(&obs);
        }
    }

    Ok(())
}
