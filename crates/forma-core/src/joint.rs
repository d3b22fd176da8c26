//! Joint identifiers for the body skeleton
//!
//! Joints follow the MediaPipe pose landmark topology: 33 landmarks, indexed
//! in the order the pose model emits them.

use std::fmt;
use std::str::FromStr;

use crate::FormaError;

/// Joint identifier for body skeleton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Joint {
    // Face
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,

    // Upper body
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,

    // Lower body
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl Joint {
    /// Number of joints
    pub const COUNT: usize = 33;

    /// All joints in model order
    pub fn all() -> &'static [Joint] {
        &[
            Joint::Nose,
            Joint::LeftEyeInner,
            Joint::LeftEye,
            Joint::LeftEyeOuter,
            Joint::RightEyeInner,
            Joint::RightEye,
            Joint::RightEyeOuter,
            Joint::LeftEar,
            Joint::RightEar,
            Joint::MouthLeft,
            Joint::MouthRight,
            Joint::LeftShoulder,
            Joint::RightShoulder,
            Joint::LeftElbow,
            Joint::RightElbow,
            Joint::LeftWrist,
            Joint::RightWrist,
            Joint::LeftPinky,
            Joint::RightPinky,
            Joint::LeftIndex,
            Joint::RightIndex,
            Joint::LeftThumb,
            Joint::RightThumb,
            Joint::LeftHip,
            Joint::RightHip,
            Joint::LeftKnee,
            Joint::RightKnee,
            Joint::LeftAnkle,
            Joint::RightAnkle,
            Joint::LeftHeel,
            Joint::RightHeel,
            Joint::LeftFootIndex,
            Joint::RightFootIndex,
        ]
    }

    /// Index in the pose model output
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Joint at a model output index
    pub fn from_index(index: usize) -> Option<Joint> {
        Self::all().get(index).copied()
    }

    /// Canonical snake_case name
    pub fn name(self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEyeInner => "left_eye_inner",
            Joint::LeftEye => "left_eye",
            Joint::LeftEyeOuter => "left_eye_outer",
            Joint::RightEyeInner => "right_eye_inner",
            Joint::RightEye => "right_eye",
            Joint::RightEyeOuter => "right_eye_outer",
            Joint::LeftEar => "left_ear",
            Joint::RightEar => "right_ear",
            Joint::MouthLeft => "mouth_left",
            Joint::MouthRight => "mouth_right",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftPinky => "left_pinky",
            Joint::RightPinky => "right_pinky",
            Joint::LeftIndex => "left_index",
            Joint::RightIndex => "right_index",
            Joint::LeftThumb => "left_thumb",
            Joint::RightThumb => "right_thumb",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
            Joint::LeftHeel => "left_heel",
            Joint::RightHeel => "right_heel",
            Joint::LeftFootIndex => "left_foot_index",
            Joint::RightFootIndex => "right_foot_index",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Joint {
    type Err = FormaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Joint::all()
            .iter()
            .copied()
            .find(|j| j.name() == s)
            .ok_or_else(|| FormaError::UnknownJoint(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_count() {
        assert_eq!(Joint::all().len(), Joint::COUNT);
    }

    #[test]
    fn test_indices_match_model_order() {
        for (i, joint) in Joint::all().iter().enumerate() {
            assert_eq!(joint.index(), i);
            assert_eq!(Joint::from_index(i), Some(*joint));
        }
        assert_eq!(Joint::LeftShoulder.index(), 11);
        assert_eq!(Joint::LeftHip.index(), 23);
        assert_eq!(Joint::from_index(Joint::COUNT), None);
    }

    #[test]
    fn test_name_parse() {
        for joint in Joint::all() {
            assert_eq!(joint.name().parse::<Joint>().unwrap(), *joint);
        }
        assert!(matches!(
            "left_kne".parse::<Joint>(),
            Err(FormaError::UnknownJoint(_))
        ));
    }
}
