// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Geometry helpers for posture evaluation

use crate::landmark::Landmark;

/// Calculate the angle at vertex `b` between rays `b -> a` and `b -> c`.
///
/// Uses the 3D normalized coordinates of the landmarks. The cosine is clamped
/// to [-1, 1] before `acos` so floating-point drift cannot leave the domain.
///
/// # Arguments
///
/// * `a` - Endpoint of the first ray.
/// * `b` - Vertex.
/// * `c` - Endpoint of the second ray.
///
/// # Returns
///
/// Angle in degrees within [0, 180], or `None` when a ray has zero length
/// (two landmarks coincide) or a coordinate is not finite.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn calculate_angle(a: &Landmark, b: &Landmark, c: &Landmark) -> Option<f32> {
    let [ax, ay, az] = a.xyz().map(f64::from);
    let [bx, by, bz] = b.xyz().map(f64::from);
    let [cx, cy, cz] = c.xyz().map(f64::from);

    let ba = [ax - bx, ay - by, az - bz];
    let bc = [cx - bx, cy - by, cz - bz];

    let dot = ba[0] * bc[0] + ba[1] * bc[1] + ba[2] * bc[2];
    let norm_ba = (ba[0] * ba[0] + ba[1] * ba[1] + ba[2] * ba[2]).sqrt();
    let norm_bc = (bc[0] * bc[0] + bc[1] * bc[1] + bc[2] * bc[2]).sqrt();
    let denom = norm_ba * norm_bc;

    if denom <= 0.0 || !denom.is_finite() || !dot.is_finite() {
        return None;
    }

    let cosine = (dot / denom).clamp(-1.0, 1.0);
    Some(cosine.acos().to_degrees() as f32)
}

/// Convert a landmark's normalized position to integer pixel coordinates.
///
/// # Arguments
///
/// * `landmark` - Landmark with normalized `x`, `y`.
/// * `width` - Image width in pixels.
/// * `height` - Image height in pixels.
///
/// # Returns
///
/// `(floor(x * width), floor(y * height))`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn pixel_coords(landmark: &Landmark, width: u32, height: u32) -> (i32, i32) {
    let px = (landmark.x * width as f32).floor() as i32;
    let py = (landmark.y * height as f32).floor() as i32;
    (px, py)
}

/// Logistic sigmoid, used to turn model logits into probabilities.
#[must_use]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
