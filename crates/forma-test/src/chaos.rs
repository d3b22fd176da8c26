//! Frame chaos for pipeline testing
//!
//! Simulates a noisy pose estimator:
//! - Coordinate jitter
//! - Per-joint visibility dropout
//! - Whole-frame occlusion bursts
//! - Out-of-order delivery

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use forma_core::{Joint, LandmarkFrame};

/// Visibility given to a dropped joint
const DROPPED_VISIBILITY: f32 = 0.05;

/// Frame chaos configuration
#[derive(Clone, Debug, PartialEq)]
pub struct FrameChaosConfig {
    /// Max coordinate offset per axis (normalized units)
    pub jitter: f32,
    /// Probability that a joint drops below the visibility threshold
    pub dropout_prob: f64,
    /// Probability that an occlusion burst starts on a frame
    pub occlusion_prob: f64,
    /// Burst length range in frames
    pub occlusion_length: (u32, u32),
    /// Probability that a frame swaps places with the next one
    pub reorder_prob: f64,
}

impl Default for FrameChaosConfig {
    fn default() -> Self {
        Self::mild()
    }
}

impl FrameChaosConfig {
    /// No chaos
    pub fn clean() -> Self {
        FrameChaosConfig {
            jitter: 0.0,
            dropout_prob: 0.0,
            occlusion_prob: 0.0,
            occlusion_length: (0, 0),
            reorder_prob: 0.0,
        }
    }

    /// A decent camera in good light
    pub fn mild() -> Self {
        FrameChaosConfig {
            jitter: 0.004,
            dropout_prob: 0.02,
            occlusion_prob: 0.01,
            occlusion_length: (1, 3),
            reorder_prob: 0.02,
        }
    }

    /// Poor light, partial framing
    pub fn harsh() -> Self {
        FrameChaosConfig {
            jitter: 0.015,
            dropout_prob: 0.1,
            occlusion_prob: 0.05,
            occlusion_length: (3, 10),
            reorder_prob: 0.1,
        }
    }
}

/// Chaos statistics
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameChaosStats {
    pub frames: u64,
    pub joints_dropped: u64,
    pub frames_occluded: u64,
    pub frames_reordered: u64,
}

/// Applies chaos to a frame sequence
pub struct FrameChaos {
    config: FrameChaosConfig,
    rng: StdRng,
    burst_remaining: u32,
    stats: FrameChaosStats,
}

impl FrameChaos {
    pub fn new(config: FrameChaosConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Deterministic chaos
    pub fn with_seed(config: FrameChaosConfig, seed: u64) -> Self {
        FrameChaos {
            config,
            rng: StdRng::seed_from_u64(seed),
            burst_remaining: 0,
            stats: FrameChaosStats::default(),
        }
    }

    /// Distort one frame
    pub fn distort(&mut self, frame: &LandmarkFrame) -> LandmarkFrame {
        self.stats.frames += 1;

        if self.burst_remaining == 0
            && self.config.occlusion_length.1 > 0
            && self.rng.gen_bool(self.config.occlusion_prob)
        {
            let (min, max) = self.config.occlusion_length;
            self.burst_remaining = self.rng.gen_range(min.max(1)..=max.max(min).max(1));
        }
        if self.burst_remaining > 0 {
            self.burst_remaining -= 1;
            self.stats.frames_occluded += 1;
            return LandmarkFrame::new(frame.timestamp);
        }

        let mut out = LandmarkFrame::new(frame.timestamp);
        for (joint, landmark) in frame.iter() {
            let mut landmark = *landmark;
            if self.config.jitter > 0.0 {
                let j = self.config.jitter;
                landmark.x += self.rng.gen_range(-j..=j);
                landmark.y += self.rng.gen_range(-j..=j);
            }
            if self.rng.gen_bool(self.config.dropout_prob) {
                landmark = landmark.with_visibility(DROPPED_VISIBILITY);
                self.stats.joints_dropped += 1;
            }
            out.set(joint, landmark);
        }
        out
    }

    /// Distort a whole sequence, swapping some neighbours
    pub fn apply(&mut self, frames: &[LandmarkFrame]) -> Vec<LandmarkFrame> {
        let mut out: Vec<LandmarkFrame> = frames.iter().map(|f| self.distort(f)).collect();

        let mut i = 0;
        while i + 1 < out.len() {
            if self.rng.gen_bool(self.config.reorder_prob) {
                out.swap(i, i + 1);
                self.stats.frames_reordered += 1;
                i += 2;
            } else {
                i += 1;
            }
        }
        out
    }

    pub fn stats(&self) -> &FrameChaosStats {
        &self.stats
    }

    pub fn config(&self) -> &FrameChaosConfig {
        &self.config
    }
}

/// Drop every landmark of `joints` from the frame
pub fn without_joints(mut frame: LandmarkFrame, joints: &[Joint]) -> LandmarkFrame {
    for joint in joints {
        frame.remove(*joint);
    }
    frame
}
