//! Planar geometry over normalized landmark coordinates.
//!
//! All inputs live in the [0,1] image square with `y` growing downwards,
//! so "above" means a smaller `y`.

use crate::data_structures::Landmark;

/// Euclidean distance between two points.
pub fn distance(a: &Landmark, b: &Landmark) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

pub fn midpoint(a: &Landmark, b: &Landmark) -> Landmark {
    Landmark {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
        visibility: a.visibility.min(b.visibility),
    }
}

/// Interior angle at `elbow` in degrees, from the law of cosines over the
/// shoulder-elbow-wrist triangle.
///
/// 180° is a straight arm, 90° a right-angle bend. Returns `None` when either
/// limb segment has collapsed to a point.
pub fn joint_angle(shoulder: &Landmark, elbow: &Landmark, wrist: &Landmark) -> Option<f32> {
    let upper = distance(shoulder, elbow);
    let fore = distance(elbow, wrist);
    let span = distance(shoulder, wrist);

    if upper < 1e-4 || fore < 1e-4 {
        return None;
    }

    let cos_angle = ((upper * upper + fore * fore - span * span) / (2.0 * upper * fore)).clamp(-1.0, 1.0);
    Some(cos_angle.acos().to_degrees())
}

pub fn is_above(a: &Landmark, b: &Landmark) -> bool {
    a.y < b.y
}
