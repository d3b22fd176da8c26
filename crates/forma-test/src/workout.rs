//! Scripted workouts run end to end through a coach session

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use forma_catalog::builtin::{BICEP_CURL, SQUAT};
use forma_core::{FormaResult, FrameTime, LandmarkFrame};
use forma_feedback::{FeedbackEvent, FeedbackRequest};
use forma_runtime::{CoachConfig, CoachSession, SessionEvent, SessionSnapshot, SessionStats};

use crate::{
    FrameChaos, FrameChaosConfig, FrameChaosStats, PoseAngles, RecordingGenerator,
    RecordingSynthesizer,
};

/// A repeated movement between a rest pose and a work pose
#[derive(Debug, Clone)]
pub struct WorkoutScript {
    /// `None` leaves the session on auto-detect
    pub exercise: Option<String>,
    pub rest: PoseAngles,
    pub work: PoseAngles,
    pub reps: u32,
    /// Frames held at each pose
    pub frames_per_phase: u32,
    /// Interpolated frames between poses
    pub transition_frames: u32,
    pub frame_interval: Duration,
}

impl WorkoutScript {
    /// Standing, down to the bottom, back up
    pub fn squat(reps: u32) -> Self {
        WorkoutScript {
            exercise: Some(SQUAT.to_string()),
            rest: PoseAngles::standing(),
            work: PoseAngles::squat_bottom(),
            reps,
            frames_per_phase: 5,
            transition_frames: 0,
            frame_interval: Duration::from_millis(33),
        }
    }

    /// Arm extended, curled, extended
    pub fn curl(reps: u32) -> Self {
        WorkoutScript {
            exercise: Some(BICEP_CURL.to_string()),
            work: PoseAngles::curl_top(),
            ..Self::squat(reps)
        }
    }

    pub fn auto_detect(mut self) -> Self {
        self.exercise = None;
        self
    }

    pub fn with_work(mut self, work: PoseAngles) -> Self {
        self.work = work;
        self
    }

    pub fn with_phase(mut self, frames_per_phase: u32, transition_frames: u32) -> Self {
        self.frames_per_phase = frames_per_phase;
        self.transition_frames = transition_frames;
        self
    }

    /// Rest, then `reps` times work and back to rest
    pub fn frames(&self) -> Vec<LandmarkFrame> {
        let mut poses = Vec::new();
        let hold = |poses: &mut Vec<PoseAngles>, pose: PoseAngles| {
            poses.extend(std::iter::repeat(pose).take(self.frames_per_phase as usize));
        };
        let blend = |poses: &mut Vec<PoseAngles>, from: PoseAngles, to: PoseAngles| {
            let steps = self.transition_frames + 1;
            poses.extend((1..steps).map(|k| from.lerp(to, k as f32 / steps as f32)));
        };

        hold(&mut poses, self.rest);
        for _ in 0..self.reps {
            blend(&mut poses, self.rest, self.work);
            hold(&mut poses, self.work);
            blend(&mut poses, self.work, self.rest);
            hold(&mut poses, self.rest);
        }

        let mut at = FrameTime::ZERO;
        poses
            .into_iter()
            .map(|pose| {
                let frame = pose.frame(at);
                at = at + self.frame_interval;
                frame
            })
            .collect()
    }
}

/// Outcome of one scripted workout
#[derive(Debug, Clone)]
pub struct WorkoutResult {
    pub reps_performed: u32,
    pub reps_counted: u32,
    pub frames_sent: usize,
    pub stats: SessionStats,
    pub chaos: Option<FrameChaosStats>,
    pub requests: Vec<FeedbackRequest>,
    pub spoken: Vec<String>,
    pub events: Vec<SessionEvent>,
    pub snapshot: SessionSnapshot,
}

impl WorkoutResult {
    /// Every performed rep was counted
    pub fn passed(&self) -> bool {
        self.reps_counted == self.reps_performed
    }

    /// Counts carried by rep events, in order
    pub fn rep_events(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::RepCompleted { count, .. } => Some(*count),
                _ => None,
            })
            .collect()
    }

    /// Texts shown to the user, in order
    pub fn displayed(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Feedback(FeedbackEvent::Displayed { text, .. }) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn audio_clips(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Feedback(FeedbackEvent::Audio { .. })))
            .count()
    }
}

/// Runs a script through a fresh session with recording collaborators
pub struct WorkoutHarness {
    script: WorkoutScript,
    config: CoachConfig,
    chaos: Option<FrameChaos>,
    generator: Arc<RecordingGenerator>,
    synthesizer: Arc<RecordingSynthesizer>,
}

impl WorkoutHarness {
    pub fn new(script: WorkoutScript) -> Self {
        WorkoutHarness {
            script,
            config: CoachConfig::default(),
            chaos: None,
            generator: RecordingGenerator::echo(),
            synthesizer: RecordingSynthesizer::new(),
        }
    }

    pub fn with_config(mut self, config: CoachConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_chaos(mut self, config: FrameChaosConfig, seed: u64) -> Self {
        self.chaos = Some(FrameChaos::with_seed(config, seed));
        self
    }

    pub fn with_generator(mut self, generator: Arc<RecordingGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<RecordingSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Play every frame at the script's pace, then let pending feedback finish
    pub async fn run(&mut self) -> FormaResult<WorkoutResult> {
        let mut config = self.config.clone();
        config.exercise = self.script.exercise.clone();
        let tick_interval = config.tick_interval;

        let mut session = CoachSession::from_config(
            config,
            self.generator.clone(),
            self.synthesizer.clone(),
        )?;

        let mut frames = self.script.frames();
        if let Some(chaos) = &mut self.chaos {
            frames = chaos.apply(&frames);
        }
        let frames_sent = frames.len();

        let mut events = session.drain_events();
        for frame in frames {
            session.queue_frame(frame);
            session.tick(Instant::now());
            events.extend(session.drain_events());
            tokio::time::sleep(self.script.frame_interval).await;
        }

        while session.feedback_pending() {
            tokio::time::sleep(tick_interval).await;
            session.tick(Instant::now());
            events.extend(session.drain_events());
        }
        session.settle().await;
        events.extend(session.drain_events());

        let snapshot = session.snapshot();
        tracing::debug!(
            frames = frames_sent,
            reps = snapshot.reps.rep_count,
            events = events.len(),
            "workout finished"
        );

        Ok(WorkoutResult {
            reps_performed: self.script.reps,
            reps_counted: snapshot.reps.rep_count,
            frames_sent,
            stats: session.stats().clone(),
            chaos: self.chaos.as_ref().map(|c| c.stats().clone()),
            requests: self.generator.calls(),
            spoken: self.synthesizer.texts(),
            events,
            snapshot,
        })
    }
}
