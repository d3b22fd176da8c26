//! Bundled exercises
//!
//! Rules measure the left side of the body; the camera is expected to see the
//! user side-on.

use forma_core::Joint::*;

use crate::{AngleRule, ExerciseDefinition, Stage};

pub const SQUAT: &str = "SQUAT";
pub const STANDING: &str = "STANDING";
pub const BICEP_CURL: &str = "BICEP_CURL";

/// Registration order is the identifier's tie-break order
pub fn definitions() -> Vec<ExerciseDefinition> {
    vec![squat(), standing(), bicep_curl()]
}

fn squat() -> ExerciseDefinition {
    ExerciseDefinition::new(SQUAT)
        .stage(
            Stage::new("down")
                .rule(AngleRule::new(
                    "knee",
                    [LeftHip, LeftKnee, LeftAnkle],
                    70.0,
                    110.0,
                    "You're not going low enough. Try to break parallel.",
                ))
                .rule(AngleRule::new(
                    "back",
                    [LeftShoulder, LeftHip, LeftKnee],
                    80.0,
                    120.0,
                    "Keep your chest up and back straight.",
                )),
        )
        .stage(
            Stage::new("up")
                .rule(AngleRule::new(
                    "knee",
                    [LeftHip, LeftKnee, LeftAnkle],
                    160.0,
                    190.0,
                    "Stand up all the way to complete the rep.",
                ))
                .rule(AngleRule::new(
                    "back",
                    [LeftShoulder, LeftHip, LeftKnee],
                    160.0,
                    190.0,
                    "Keep your back straight as you stand up.",
                )),
        )
        .reps("down", "up")
}

fn standing() -> ExerciseDefinition {
    ExerciseDefinition::new(STANDING).stage(
        Stage::new("up")
            .rule(AngleRule::new(
                "knee",
                [LeftHip, LeftKnee, LeftAnkle],
                170.0,
                190.0,
                "Your knees are slightly bent.",
            ))
            .rule(AngleRule::new(
                "hip",
                [LeftShoulder, LeftHip, LeftKnee],
                170.0,
                190.0,
                "You are leaning forward slightly.",
            )),
    )
}

fn bicep_curl() -> ExerciseDefinition {
    ExerciseDefinition::new(BICEP_CURL)
        .stage(
            Stage::new("down")
                .rule(AngleRule::new(
                    "elbow",
                    [LeftShoulder, LeftElbow, LeftWrist],
                    150.0,
                    190.0,
                    "Lower the weight until your arm is fully extended.",
                ))
                .rule(AngleRule::new(
                    "upper_arm",
                    [LeftHip, LeftShoulder, LeftElbow],
                    0.0,
                    30.0,
                    "Keep your elbow pinned to your side.",
                )),
        )
        .stage(
            Stage::new("up")
                .rule(AngleRule::new(
                    "elbow",
                    [LeftShoulder, LeftElbow, LeftWrist],
                    20.0,
                    60.0,
                    "Curl the weight all the way up to your shoulder.",
                ))
                .rule(AngleRule::new(
                    "upper_arm",
                    [LeftHip, LeftShoulder, LeftElbow],
                    0.0,
                    35.0,
                    "Don't swing your elbow forward.",
                )),
        )
        .reps("down", "up")
}
