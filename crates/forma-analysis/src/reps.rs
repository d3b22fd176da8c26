//! Stage/rep state machine
//!
//! Tracks the active exercise's current stage and counts a repetition each
//! time the exercise moves along its completion edge (e.g. `down -> up`).
//! Frames without an accepted stage hold the current state.

use serde::Serialize;

use forma_catalog::{ExerciseDefinition, RepCycle};
use forma_core::FrameTime;

/// Current stage of the active exercise
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StageState {
    #[default]
    Unknown,
    Stage(String),
}

impl StageState {
    pub fn name(&self) -> Option<&str> {
        match self {
            StageState::Unknown => None,
            StageState::Stage(name) => Some(name),
        }
    }
}

/// Snapshot of rep-counting state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepCounterState {
    pub exercise_name: Option<String>,
    pub current_stage: StageState,
    /// Non-decreasing until the exercise changes
    pub rep_count: u32,
    pub last_transition: Option<u64>,
}

/// What a single observation did to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// No change
    Held,
    /// New stage seen, waiting for confirmation
    Pending { candidate: String, seen: u32 },
    /// Moved to a new stage
    Entered { from: StageState, to: String },
    /// Moved along the completion edge
    RepCompleted { from: String, to: String, count: u32 },
}

#[derive(Debug, Clone)]
pub struct RepCounter {
    state: RepCounterState,
    rep_cycle: Option<RepCycle>,
    confirm_frames: u32,
    candidate: Option<(String, u32)>,
}

impl RepCounter {
    pub fn new(confirm_frames: u32) -> Self {
        RepCounter {
            state: RepCounterState::default(),
            rep_cycle: None,
            confirm_frames: confirm_frames.max(1),
            candidate: None,
        }
    }

    /// Switch the active exercise.
    ///
    /// Returns true when the state was reset; the same exercise again is a no-op.
    pub fn select(&mut self, exercise: Option<&ExerciseDefinition>) -> bool {
        let name = exercise.map(|e| e.name.as_str());
        if self.state.exercise_name.as_deref() == name {
            return false;
        }

        self.state = RepCounterState {
            exercise_name: name.map(str::to_string),
            ..RepCounterState::default()
        };
        self.rep_cycle = exercise.and_then(|e| e.rep_cycle.clone());
        self.candidate = None;
        true
    }

    /// Feed the accepted stage for a frame (`None` when nothing was accepted)
    pub fn observe(&mut self, stage: Option<&str>, at: FrameTime) -> Transition {
        if self.state.exercise_name.is_none() {
            return Transition::Held;
        }

        let Some(stage) = stage else {
            self.candidate = None;
            return Transition::Held;
        };

        if self.state.current_stage.name() == Some(stage) {
            self.candidate = None;
            return Transition::Held;
        }

        let seen = match &self.candidate {
            Some((name, seen)) if name == stage => seen + 1,
            _ => 1,
        };
        self.candidate = Some((stage.to_string(), seen));

        if seen < self.confirm_frames {
            return Transition::Pending {
                candidate: stage.to_string(),
                seen,
            };
        }

        self.candidate = None;
        let from = std::mem::replace(&mut self.state.current_stage, StageState::Stage(stage.to_string()));
        self.state.last_transition = Some(at.as_millis());

        let completes = match (&self.rep_cycle, from.name()) {
            (Some(cycle), Some(prev)) => cycle.completes(prev, stage),
            _ => false,
        };

        if completes {
            self.state.rep_count = self.state.rep_count.saturating_add(1);
            Transition::RepCompleted {
                from: from.name().unwrap_or_default().to_string(),
                to: stage.to_string(),
                count: self.state.rep_count,
            }
        } else {
            Transition::Entered {
                from,
                to: stage.to_string(),
            }
        }
    }

    pub fn state(&self) -> &RepCounterState {
        &self.state
    }

    pub fn exercise(&self) -> Option<&str> {
        self.state.exercise_name.as_deref()
    }

    pub fn rep_count(&self) -> u32 {
        self.state.rep_count
    }
}
