//! Landmarks - per-joint coordinates as reported by the pose model
//!
//! A `LandmarkFrame` is one snapshot of the body. It lives for a single
//! analysis pass and is dropped afterwards.

use serde::{Deserialize, Serialize};

use crate::{FrameTime, Joint};

/// Default minimum visibility for a landmark to be used
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.5;

/// One tracked joint coordinate (normalized image space, z relative to hips)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Reported visibility; models that omit it are taken as fully visible
    #[inline]
    pub fn visibility_or_full(&self) -> f32 {
        self.visibility.unwrap_or(1.0)
    }

    /// Usable for geometry at the given confidence threshold
    #[inline]
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
            && self.visibility_or_full() >= threshold
    }
}

/// Snapshot of all joints for one captured frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FrameWire", into = "FrameWire")]
pub struct LandmarkFrame {
    /// Capture time
    pub timestamp: FrameTime,
    /// Indexed by `Joint::index()`
    landmarks: Vec<Option<Landmark>>,
}

impl LandmarkFrame {
    /// Empty frame (no joints detected)
    pub fn new(timestamp: FrameTime) -> Self {
        Self {
            timestamp,
            landmarks: vec![None; Joint::COUNT],
        }
    }

    /// Build from a pose model output array in model order.
    /// Entries beyond the known joints are ignored.
    pub fn from_landmarks(timestamp: FrameTime, landmarks: &[Landmark]) -> Self {
        let mut frame = Self::new(timestamp);
        for (slot, landmark) in frame.landmarks.iter_mut().zip(landmarks) {
            *slot = Some(*landmark);
        }
        frame
    }

    /// Builder-style joint assignment
    pub fn with(mut self, joint: Joint, landmark: Landmark) -> Self {
        self.set(joint, landmark);
        self
    }

    /// Set joint landmark
    pub fn set(&mut self, joint: Joint, landmark: Landmark) {
        self.landmarks[joint.index()] = Some(landmark);
    }

    /// Drop a joint from the frame
    pub fn remove(&mut self, joint: Joint) -> Option<Landmark> {
        self.landmarks[joint.index()].take()
    }

    /// Get landmark by joint
    #[inline]
    pub fn get(&self, joint: Joint) -> Option<&Landmark> {
        self.landmarks[joint.index()].as_ref()
    }

    /// Landmark if present and visible at the threshold
    #[inline]
    pub fn visible(&self, joint: Joint, threshold: f32) -> Option<&Landmark> {
        self.get(joint).filter(|l| l.is_visible(threshold))
    }

    /// All three joints, only if every one of them is visible
    pub fn visible_triple(
        &self,
        joints: [Joint; 3],
        threshold: f32,
    ) -> Option<[&Landmark; 3]> {
        Some([
            self.visible(joints[0], threshold)?,
            self.visible(joints[1], threshold)?,
            self.visible(joints[2], threshold)?,
        ])
    }

    /// Present joints in model order
    pub fn iter(&self) -> impl Iterator<Item = (Joint, &Landmark)> {
        Joint::all()
            .iter()
            .zip(self.landmarks.iter())
            .filter_map(|(joint, slot)| slot.as_ref().map(|l| (*joint, l)))
    }

    /// Number of present joints
    pub fn len(&self) -> usize {
        self.landmarks.iter().filter(|l| l.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.iter().all(|l| l.is_none())
    }
}

/// Wire shape: `{"timestampMs": 1234, "landmarks": [{x, y, z, visibility?}, ...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameWire {
    #[serde(default)]
    timestamp_ms: u64,
    landmarks: Vec<Option<Landmark>>,
}

impl From<FrameWire> for LandmarkFrame {
    fn from(wire: FrameWire) -> Self {
        let mut frame = LandmarkFrame::new(FrameTime::from_millis(wire.timestamp_ms));
        for (slot, landmark) in frame.landmarks.iter_mut().zip(wire.landmarks) {
            *slot = landmark;
        }
        frame
    }
}

impl From<LandmarkFrame> for FrameWire {
    fn from(frame: LandmarkFrame) -> Self {
        FrameWire {
            timestamp_ms: frame.timestamp.as_millis(),
            landmarks: frame.landmarks,
        }
    }
}
