use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use cadence_config::CadenceConfig;
use cadence_engine::{Easing, PlaybackManager, Timeline, VerifyOptions};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

mod samples;
use samples::Sample;

fn main() -> Result<()> {
    let config = CadenceConfig::load();
    init_tracing(&config.logging.filter);

    let default_easing: Easing = config
        .engine
        .default_easing
        .parse()
        .with_context(|| format!("invalid default easing `{}`", config.engine.default_easing))?;

    // --sample=<name> wins over a timeline file
    let sample = std::env::args()
        .find_map(|a| a.strip_prefix("--sample=").map(str::to_string));
    let timeline = match sample {
        Some(name) => match Sample::from_name(&name) {
            Some(sample) => sample.build(&default_easing)?,
            None => bail!("unknown sample `{name}` (expected fade, bounce or intro)"),
        },
        None => match config.demo.timeline.as_deref().filter(|p| p.exists()) {
            Some(path) => load_timeline(path, &default_easing)?,
            None => Sample::Intro.build(&default_easing)?,
        },
    };

    if config.engine.verify_on_load {
        let report = timeline.verify(&VerifyOptions {
            strict_properties: config.engine.strict_properties,
        })?;
        tracing::info!(warnings = report.warnings.len(), "timeline verified");
    }

    tracing::info!(
        id = timeline.id().unwrap_or("<anonymous>"),
        duration = timeline.duration(),
        keyframes = timeline.keyframes().len(),
        loop_mode = %timeline.loop_mode(),
        "playing timeline"
    );

    run(Arc::new(timeline), &config)
}

fn run(timeline: Arc<Timeline>, config: &CadenceConfig) -> Result<()> {
    let mut manager = PlaybackManager::new();
    manager.play(timeline, 0);

    let interval = config.playback.frame_interval.max(1);
    for frame in 0..u64::from(config.playback.max_frames) {
        let Some(now) = frame_time(frame, interval) else {
            tracing::warn!(frame, interval, "frame time overflows, stopping");
            break;
        };

        for (id, values) in manager.update_all(now) {
            let values: BTreeMap<_, _> = values.into_iter().collect();
            println!("{}", json!({ "time": now, "playback": id.0, "values": values }));
        }
        for tagged in manager.drain_events() {
            tracing::info!(playback = %tagged.id, event = ?tagged.event, "lifecycle");
        }

        if manager.playing_count() == 0 {
            break;
        }
    }

    let done = manager.prune_completed();
    tracing::info!(completed = done.len(), remaining = manager.len(), "playback finished");
    Ok(())
}

/// Caller time of `frame`, or `None` once it no longer fits in a `u64`.
fn frame_time(frame: u64, interval: u64) -> Option<u64> {
    frame.checked_mul(interval)
}

/// Read a timeline in the loose JSON shape, filling in the configured easing.
fn load_timeline(path: &Path, default_easing: &Easing) -> Result<Timeline> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read timeline {}", path.display()))?;
    let mut value: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse timeline {}", path.display()))?;

    if let (Some(obj), Some(name)) = (value.as_object_mut(), default_easing.name()) {
        obj.entry("easing").or_insert_with(|| Value::from(name));
    }

    Timeline::from_value(&value).with_context(|| format!("invalid timeline {}", path.display()))
}

fn init_tracing(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(filter))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
