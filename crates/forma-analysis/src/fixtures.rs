//! Side-on poses with exact joint angles

use forma_core::{FrameTime, Joint, Landmark, LandmarkFrame};

const SEGMENT: f64 = 0.2;

/// Point `SEGMENT` away from `vertex`, at `degrees` from the direction of `toward`
fn swing(vertex: (f64, f64), toward: (f64, f64), degrees: f32) -> (f64, f64) {
    let (dx, dy) = (toward.0 - vertex.0, toward.1 - vertex.1);
    let len = (dx * dx + dy * dy).sqrt();
    let (ux, uy) = (dx / len, dy / len);
    let (sin, cos) = (degrees as f64).to_radians().sin_cos();
    (
        vertex.0 + SEGMENT * (ux * cos - uy * sin),
        vertex.1 + SEGMENT * (ux * sin + uy * cos),
    )
}

fn landmark(p: (f64, f64)) -> Landmark {
    Landmark::new(p.0 as f32, p.1 as f32, 0.0).with_visibility(0.99)
}

/// Left-side pose: knee angle, back (shoulder-hip-knee), elbow, upper arm (hip-shoulder-elbow)
pub(crate) fn pose(knee: f32, back: f32, elbow: f32, upper_arm: f32) -> LandmarkFrame {
    pose_at(FrameTime::ZERO, knee, back, elbow, upper_arm)
}

pub(crate) fn pose_at(t: FrameTime, knee: f32, back: f32, elbow: f32, upper_arm: f32) -> LandmarkFrame {
    let hip = (0.5, 0.5);
    let knee_pos = (0.5, 0.5 + SEGMENT);
    let shoulder = swing(hip, knee_pos, back);
    let ankle = swing(knee_pos, hip, knee);
    let elbow_pos = swing(shoulder, hip, upper_arm);
    let wrist = swing(elbow_pos, shoulder, elbow);

    LandmarkFrame::new(t)
        .with(Joint::LeftHip, landmark(hip))
        .with(Joint::LeftKnee, landmark(knee_pos))
        .with(Joint::LeftShoulder, landmark(shoulder))
        .with(Joint::LeftAnkle, landmark(ankle))
        .with(Joint::LeftElbow, landmark(elbow_pos))
        .with(Joint::LeftWrist, landmark(wrist))
}

/// Squat bottom with good form
pub(crate) fn squat_down() -> LandmarkFrame {
    pose(95.0, 100.0, 160.0, 15.0)
}

/// Standing tall
pub(crate) fn standing_up() -> LandmarkFrame {
    pose(178.0, 178.0, 175.0, 10.0)
}

/// Dims one joint below the default visibility threshold
pub(crate) fn occlude(mut frame: LandmarkFrame, joint: Joint) -> LandmarkFrame {
    if let Some(lm) = frame.get(joint).copied() {
        frame.set(joint, lm.with_visibility(0.1));
    }
    frame
}
