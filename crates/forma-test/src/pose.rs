//! Synthetic side-on poses
//!
//! The skeleton is built joint by joint from target angles, so every
//! left-side rule in the built-in catalog measures exactly what was asked for.

use forma_core::{FrameTime, Joint, Landmark, LandmarkFrame};

/// Segment length in normalized image units
const SEGMENT: f64 = 0.2;

/// Hip position; everything hangs off it
const HIP: (f64, f64) = (0.5, 0.5);

/// Target left-side joint angles in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseAngles {
    /// Hip-knee-ankle
    pub knee: f32,
    /// Shoulder-hip-knee
    pub back: f32,
    /// Shoulder-elbow-wrist
    pub elbow: f32,
    /// Hip-shoulder-elbow
    pub upper_arm: f32,
}

impl PoseAngles {
    pub fn new(knee: f32, back: f32, elbow: f32, upper_arm: f32) -> Self {
        PoseAngles {
            knee,
            back,
            elbow,
            upper_arm,
        }
    }

    /// Upright, arms hanging
    pub fn standing() -> Self {
        Self::new(178.0, 178.0, 165.0, 10.0)
    }

    /// Squat bottom below parallel, chest up
    pub fn squat_bottom() -> Self {
        Self::new(95.0, 100.0, 160.0, 15.0)
    }

    /// Squat that stops well above parallel
    pub fn shallow_squat() -> Self {
        Self::new(140.0, 100.0, 160.0, 15.0)
    }

    /// Squat bottom with the torso folded forward
    pub fn leaning_squat() -> Self {
        Self::new(95.0, 65.0, 160.0, 15.0)
    }

    /// Top of a curl, elbow at the side
    pub fn curl_top() -> Self {
        Self::new(178.0, 178.0, 40.0, 15.0)
    }

    /// Top of a curl with the elbow swung forward
    pub fn swinging_curl() -> Self {
        Self::new(178.0, 178.0, 40.0, 50.0)
    }

    /// Linear blend toward `other`; `t` is clamped to [0, 1]
    pub fn lerp(self, other: PoseAngles, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a + (b - a) * t;
        PoseAngles {
            knee: mix(self.knee, other.knee),
            back: mix(self.back, other.back),
            elbow: mix(self.elbow, other.elbow),
            upper_arm: mix(self.upper_arm, other.upper_arm),
        }
    }

    /// Build the frame at `timestamp`, every joint clearly visible
    pub fn frame(self, timestamp: FrameTime) -> LandmarkFrame {
        self.frame_with_visibility(timestamp, 0.99)
    }

    pub fn frame_with_visibility(self, timestamp: FrameTime, visibility: f32) -> LandmarkFrame {
        let knee = (HIP.0, HIP.1 + SEGMENT);
        let shoulder = swing(HIP, knee, self.back);
        let ankle = swing(knee, HIP, self.knee);
        let elbow = swing(shoulder, HIP, self.upper_arm);
        let wrist = swing(elbow, shoulder, self.elbow);

        let at = |p: (f64, f64)| Landmark::new(p.0 as f32, p.1 as f32, 0.0).with_visibility(visibility);

        LandmarkFrame::new(timestamp)
            .with(Joint::LeftHip, at(HIP))
            .with(Joint::LeftKnee, at(knee))
            .with(Joint::LeftAnkle, at(ankle))
            .with(Joint::LeftShoulder, at(shoulder))
            .with(Joint::LeftElbow, at(elbow))
            .with(Joint::LeftWrist, at(wrist))
    }
}

/// Point one segment from `vertex`, rotated `degrees` away from `toward`
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

#[cfg(test)]
mod tests {
    use super::*;
    use forma_analysis::angle_at;
    use proptest::prelude::*;

    fn measure(frame: &LandmarkFrame, joints: [Joint; 3]) -> f32 {
        let [a, b, c] = joints.map(|j| *frame.get(j).unwrap());
        angle_at(&a, &b, &c)
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = PoseAngles::standing();
        let b = PoseAngles::squat_bottom();
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 2.0), b);
    }

    #[test]
    fn test_frame_has_six_joints() {
        let frame = PoseAngles::standing().frame(FrameTime::from_millis(5));
        assert_eq!(frame.len(), 6);
        assert_eq!(frame.timestamp, FrameTime::from_millis(5));
    }

    proptest! {
        #[test]
        fn test_angles_reproduced(
            knee in 30.0f32..179.0,
            back in 30.0f32..179.0,
            elbow in 30.0f32..179.0,
            upper_arm in 5.0f32..90.0,
        ) {
            let frame = PoseAngles::new(knee, back, elbow, upper_arm).frame(FrameTime::ZERO);
            use Joint::*;
            prop_assert!((measure(&frame, [LeftHip, LeftKnee, LeftAnkle]) - knee).abs() < 0.05);
            prop_assert!((measure(&frame, [LeftShoulder, LeftHip, LeftKnee]) - back).abs() < 0.05);
            prop_assert!((measure(&frame, [LeftShoulder, LeftElbow, LeftWrist]) - elbow).abs() < 0.05);
            prop_assert!((measure(&frame, [LeftHip, LeftShoulder, LeftElbow]) - upper_arm).abs() < 0.05);
        }
    }
}
