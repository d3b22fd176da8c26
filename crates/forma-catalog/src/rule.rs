//! Angle rules - a single joint-angle constraint with its corrective cue

use forma_core::Joint;

/// Inclusive angle bounds in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

impl AngleRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, angle: f32) -> bool {
        angle >= self.min && angle <= self.max
    }

    /// Why the bounds cannot be used, if they cannot
    pub(crate) fn defect(&self) -> Option<String> {
        if !self.min.is_finite() || !self.max.is_finite() {
            Some(format!("non-finite bounds [{}, {}]", self.min, self.max))
        } else if self.min > self.max {
            Some(format!("min {} exceeds max {}", self.min, self.max))
        } else {
            None
        }
    }
}

/// Angle measured at `p2` between the segments p2→p1 and p2→p3
#[derive(Debug, Clone, PartialEq)]
pub struct AngleRule {
    /// Unique within its stage
    pub name: String,
    pub p1: Joint,
    /// Vertex of the angle
    pub p2: Joint,
    pub p3: Joint,
    pub angle: AngleRange,
    /// Cue shown when the measured angle falls outside the range
    pub feedback: String,
}

impl AngleRule {
    pub fn new(
        name: impl Into<String>,
        joints: [Joint; 3],
        min: f32,
        max: f32,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            p1: joints[0],
            p2: joints[1],
            p3: joints[2],
            angle: AngleRange::new(min, max),
            feedback: feedback.into(),
        }
    }

    #[inline]
    pub fn joints(&self) -> [Joint; 3] {
        [self.p1, self.p2, self.p3]
    }
}
