//! FORMA Demo Application
//!
//! Plays a workout through a spawned coach session and prints what a host
//! would show: exercise changes, rep counts, coaching text and audio clips.
//!
//! ```text
//! forma-demo [--config FILE] [--workout squat|curl|shallow-squat]
//!            [--exercise NAME|auto] [--reps N] [--chaos clean|mild|harsh]
//!            [--seed N] [--frames FILE.jsonl]
//! ```
//!
//! `--frames` replays recorded frames, one JSON object per line
//! (`{"timestampMs": ..., "landmarks": [...]}`), instead of a synthetic script.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use forma_core::{FormaError, FormaResult, LandmarkFrame};
use forma_feedback::{FeedbackEvent, SilentSynthesizer, TemplateGenerator};
use forma_runtime::{init_tracing, CoachConfig, CoachSession, SessionEvent};
use forma_test::{FrameChaos, FrameChaosConfig, PoseAngles, WorkoutScript};

/// How long to keep listening for feedback after the last frame
const LINGER: Duration = Duration::from_secs(4);

enum Selection {
    Script,
    Auto,
    Named(String),
}

struct Options {
    config: Option<PathBuf>,
    workout: String,
    selection: Selection,
    reps: u32,
    chaos: FrameChaosConfig,
    seed: u64,
    frames: Option<PathBuf>,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> FormaResult<Self> {
        let mut options = Options {
            config: None,
            workout: "squat".to_string(),
            selection: Selection::Script,
            reps: 5,
            chaos: FrameChaosConfig::clean(),
            seed: 1,
            frames: None,
        };

        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| FormaError::InvalidConfig(format!("{} needs a value", flag)))
            };
            match flag.as_str() {
                "--config" => options.config = Some(PathBuf::from(value()?)),
                "--workout" => options.workout = value()?,
                "--exercise" => {
                    let name = value()?;
                    options.selection = if name.eq_ignore_ascii_case("auto") {
                        Selection::Auto
                    } else {
                        Selection::Named(name)
                    };
                }
                "--reps" => options.reps = parse_number(&flag, &value()?)?,
                "--seed" => options.seed = parse_number(&flag, &value()?)?,
                "--chaos" => {
                    options.chaos = match value()?.as_str() {
                        "clean" => FrameChaosConfig::clean(),
                        "mild" => FrameChaosConfig::mild(),
                        "harsh" => FrameChaosConfig::harsh(),
                        other => {
                            return Err(FormaError::InvalidConfig(format!("unknown chaos level '{}'", other)))
                        }
                    }
                }
                "--frames" => options.frames = Some(PathBuf::from(value()?)),
                other => return Err(FormaError::InvalidConfig(format!("unknown flag '{}'", other))),
            }
        }
        Ok(options)
    }

    fn script(&self) -> FormaResult<WorkoutScript> {
        match self.workout.as_str() {
            "squat" => Ok(WorkoutScript::squat(self.reps)),
            "curl" => Ok(WorkoutScript::curl(self.reps)),
            "shallow-squat" => Ok(WorkoutScript::squat(self.reps).with_work(PoseAngles::shallow_squat())),
            other => Err(FormaError::InvalidConfig(format!("unknown workout '{}'", other))),
        }
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> FormaResult<T> {
    value
        .parse()
        .map_err(|_| FormaError::InvalidConfig(format!("{} expects a number, got '{}'", flag, value)))
}

fn read_frames(path: &Path) -> FormaResult<Vec<LandmarkFrame>> {
    let text = std::fs::read_to_string(path)?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .map_err(|e| FormaError::InvalidConfig(format!("{}:{}: {}", path.display(), n + 1, e)))
        })
        .collect()
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::ExerciseChanged { exercise: Some(name) } => println!("[exercise] {}", name),
        SessionEvent::ExerciseChanged { exercise: None } => println!("[exercise] (auto-detect)"),
        SessionEvent::RepCompleted { exercise, count } => println!("[reps] {} x{}", exercise, count),
        SessionEvent::Feedback(FeedbackEvent::Displayed { text, source }) => {
            println!("[coach] {} ({:?})", text, source)
        }
        SessionEvent::Feedback(FeedbackEvent::Audio { text, wav }) => {
            println!("[audio] {} bytes for \"{}\"", wav.len(), text)
        }
        SessionEvent::Feedback(FeedbackEvent::SpeechFailed { reason, .. }) => println!("[audio] failed: {}", reason),
        SessionEvent::Feedback(FeedbackEvent::Requested { positive, forced, .. }) => {
            tracing::debug!(positive, forced, "feedback requested")
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = Options::parse(std::env::args().skip(1))?;
    let mut config = CoachConfig::load(options.config.as_deref())?;
    init_tracing(&config.log)?;

    let script = options.script()?;
    match &options.selection {
        Selection::Named(name) => config.exercise = Some(name.clone()),
        Selection::Auto => config.exercise = None,
        Selection::Script if config.exercise.is_none() => config.exercise = script.exercise.clone(),
        Selection::Script => {}
    }

    let frames = match &options.frames {
        Some(path) => read_frames(path)?,
        None => script.frames(),
    };
    let frames = FrameChaos::with_seed(options.chaos.clone(), options.seed).apply(&frames);

    println!("FORMA demo: {} frames, exercise {:?}", frames.len(), config.exercise);
    println!();

    let session = CoachSession::from_config(
        config,
        Arc::new(TemplateGenerator),
        Arc::new(SilentSynthesizer::default()),
    )?;
    let mut handle = session.spawn(64);

    for frame in frames {
        handle.send_frame(frame).await?;
        tokio::time::sleep(script.frame_interval).await;
        while let Some(event) = handle.try_next_event() {
            print_event(&event);
        }
    }

    let deadline = Instant::now() + LINGER;
    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, handle.next_event()).await {
        print_event(&event);
    }

    println!();
    println!("{}", serde_json::to_string_pretty(&handle.snapshot())?);

    let stats = handle.shutdown().await?;
    println!(
        "frames analyzed {}, dropped {}, stale {}",
        stats.frames_analyzed, stats.frames_dropped, stats.frames_stale
    );
    Ok(())
}
