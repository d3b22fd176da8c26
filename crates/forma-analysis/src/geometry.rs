//! Joint angle geometry
//!
//! The angle at a joint is the angle between the segments running from the
//! vertex to its two neighbours. Results are always in [0, 180] degrees;
//! anything that cannot be measured yields `DEGENERATE_ANGLE`.

use forma_catalog::AngleRule;
use forma_core::{Landmark, LandmarkFrame};

use crate::AnglePlane;

/// Sentinel for zero-length segments or non-finite input
pub const DEGENERATE_ANGLE: f32 = 0.0;

/// Segments shorter than this are treated as zero-length
const MIN_SEGMENT: f64 = 1e-9;

/// Angle at `b` between (a - b) and (c - b), in degrees, 3D
pub fn angle_at(a: &Landmark, b: &Landmark, c: &Landmark) -> f32 {
    let v1 = [
        a.x as f64 - b.x as f64,
        a.y as f64 - b.y as f64,
        a.z as f64 - b.z as f64,
    ];
    let v2 = [
        c.x as f64 - b.x as f64,
        c.y as f64 - b.y as f64,
        c.z as f64 - b.z as f64,
    ];

    let dot = v1[0] * v2[0] + v1[1] * v2[1] + v1[2] * v2[2];
    let mag1 = (v1[0] * v1[0] + v1[1] * v1[1] + v1[2] * v1[2]).sqrt();
    let mag2 = (v2[0] * v2[0] + v2[1] * v2[1] + v2[2] * v2[2]).sqrt();

    // NaN fails both comparisons
    if !(mag1 > MIN_SEGMENT && mag2 > MIN_SEGMENT) || !dot.is_finite() {
        return DEGENERATE_ANGLE;
    }

    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    finite_or_sentinel(cos_angle.acos().to_degrees())
}

/// Angle at `b` in the image plane, via the atan2 difference of the segments
pub fn planar_angle_at(a: &Landmark, b: &Landmark, c: &Landmark) -> f32 {
    let (ax, ay) = (a.x as f64 - b.x as f64, a.y as f64 - b.y as f64);
    let (cx, cy) = (c.x as f64 - b.x as f64, c.y as f64 - b.y as f64);

    if !((ax * ax + ay * ay).sqrt() > MIN_SEGMENT && (cx * cx + cy * cy).sqrt() > MIN_SEGMENT) {
        return DEGENERATE_ANGLE;
    }

    let mut degrees = (cy.atan2(cx) - ay.atan2(ax)).to_degrees().abs();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }
    finite_or_sentinel(degrees)
}

#[inline]
fn finite_or_sentinel(degrees: f64) -> f32 {
    if degrees.is_finite() {
        degrees.clamp(0.0, 180.0) as f32
    } else {
        DEGENERATE_ANGLE
    }
}

/// Angle for a rule, if all three of its joints are visible
pub fn measure_rule(
    frame: &LandmarkFrame,
    rule: &AngleRule,
    visibility_threshold: f32,
    plane: AnglePlane,
) -> Option<f32> {
    let [a, b, c] = frame.visible_triple(rule.joints(), visibility_threshold)?;
    Some(match plane {
        AnglePlane::Spatial => angle_at(a, b, c),
        AnglePlane::Image => planar_angle_at(a, b, c),
    })
}
