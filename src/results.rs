// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Result types for posture evaluation.
//!
//! [`PostureVerdict`] serializes to the wire shape consumed by capture clients:
//!
//! ```json
//! {"is_bad_posture": true, "message": "Knee over toe",
//!  "keypoints": [{"id": 0, "x": 320, "y": 96, "visibility": 0.99}]}
//! ```
//!
//! Processing faults use the distinct [`ErrorVerdict`] shape instead.

use serde::{Deserialize, Serialize};

use crate::landmark::LandmarkSet;
use crate::utils::pixel_coords;

/// Message reported when no ruleset flags bad posture.
pub const GOOD_POSTURE_MESSAGE: &str = "Good Posture";

/// Message carried by [`ErrorVerdict`].
pub const PROCESSING_ERROR_MESSAGE: &str = "Processing error";

/// A landmark in pixel space, for client-side visualization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Landmark index in the pose topology.
    pub id: usize,
    /// X coordinate in pixels.
    pub x: i32,
    /// Y coordinate in pixels.
    pub y: i32,
    /// Visibility score (0.0 - 1.0).
    pub visibility: f32,
}

/// Convert every landmark of a set to a pixel-space [`Keypoint`].
///
/// Landmarks are included regardless of their visibility.
#[must_use]
pub fn keypoints_from_landmarks(landmarks: &LandmarkSet, width: u32, height: u32) -> Vec<Keypoint> {
    landmarks
        .iter()
        .map(|(id, lm)| {
            let (x, y) = pixel_coords(lm, width, height);
            Keypoint {
                id: id.index(),
                x,
                y,
                visibility: lm.visibility,
            }
        })
        .collect()
}

/// Outcome of a single activity ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleVerdict {
    /// Whether at least one rule fired.
    pub is_bad_posture: bool,
    /// Comma-joined descriptions of the rules that fired; empty otherwise.
    pub message: String,
}

impl RuleVerdict {
    /// Verdict of a ruleset that could not evaluate (missing landmarks).
    #[must_use]
    pub fn abstain() -> Self {
        Self::default()
    }

    /// Build a verdict from the descriptions of the rules that fired.
    #[must_use]
    pub fn from_violations(violations: &[String]) -> Self {
        Self {
            is_bad_posture: !violations.is_empty(),
            message: violations.join(", "),
        }
    }

    /// The merged "nothing fired" verdict.
    #[must_use]
    pub fn good() -> Self {
        Self {
            is_bad_posture: false,
            message: GOOD_POSTURE_MESSAGE.to_string(),
        }
    }
}

/// Per-frame posture judgment returned to the caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostureVerdict {
    /// Whether bad posture was detected.
    pub is_bad_posture: bool,
    /// Human-readable reason, `"Good Posture"`, or empty when no body was detected.
    pub message: String,
    /// Pixel-space keypoints of the detected body; empty when no body was detected.
    #[serde(default)]
    pub keypoints: Vec<Keypoint>,
}

impl PostureVerdict {
    /// Verdict for a frame without a detected body.
    #[must_use]
    pub fn no_body() -> Self {
        Self::default()
    }

    /// Attach keypoints to a merged ruleset verdict.
    #[must_use]
    pub fn new(verdict: RuleVerdict, keypoints: Vec<Keypoint>) -> Self {
        Self {
            is_bad_posture: verdict.is_bad_posture,
            message: verdict.message,
            keypoints,
        }
    }

    /// Whether a body was detected in the frame.
    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.keypoints.is_empty()
    }
}

/// Fallback response for frames whose processing failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorVerdict {
    /// Description of the fault.
    pub error: String,
    /// Always `false`.
    pub is_bad_posture: bool,
    /// Always `"Processing error"`.
    pub message: String,
}

impl ErrorVerdict {
    /// Create an error verdict from any displayable fault.
    #[must_use]
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
            is_bad_posture: false,
            message: PROCESSING_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Response for one inbound frame: a verdict or an error verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameFeedback {
    /// Error shape; listed first so deserialization prefers it when `error` is present.
    Error(ErrorVerdict),
    /// Normal verdict, including "no body detected".
    Verdict(PostureVerdict),
}

impl FrameFeedback {
    /// Whether this feedback reports a processing fault.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Whether this feedback flags bad posture.
    #[must_use]
    pub const fn is_bad_posture(&self) -> bool {
        match self {
            Self::Verdict(v) => v.is_bad_posture,
            Self::Error(_) => false,
        }
    }

    /// Message carried by either shape.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Verdict(v) => &v.message,
            Self::Error(e) => &e.message,
        }
    }
}

impl From<PostureVerdict> for FrameFeedback {
    fn from(verdict: PostureVerdict) -> Self {
        Self::Verdict(verdict)
    }
}

impl From<ErrorVerdict> for FrameFeedback {
    fn from(error: ErrorVerdict) -> Self {
        Self::Error(error)
    }
}

/// Timing information for one frame (in milliseconds).
#[derive(Debug, Clone, Default)]
pub struct Speed {
    /// Time spent in the keypoint provider (preprocess + inference + decode).
    pub inference: Option<f64>,
    /// Time spent evaluating rulesets.
    pub evaluation: Option<f64>,
}

impl Speed {
    /// Create a new Speed instance with all timings.
    #[must_use]
    pub const fn new(inference: f64, evaluation: f64) -> Self {
        Self {
            inference: Some(inference),
            evaluation: Some(evaluation),
        }
    }

    /// Get total frame time in milliseconds.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.inference.unwrap_or(0.0) + self.evaluation.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, PoseLandmark};

    #[test]
    fn test_rule_verdict_join() {
        let v = RuleVerdict::from_violations(&[
            "Knee over toe".to_string(),
            "Hunched back (140°)".to_string(),
        ]);
        assert!(v.is_bad_posture);
        assert_eq!(v.message, "Knee over toe, Hunched back (140°)");

        let none = RuleVerdict::from_violations(&[]);
        assert_eq!(none, RuleVerdict::abstain());
    }

    #[test]
    fn test_no_body_json_shape() {
        let json = serde_json::to_value(PostureVerdict::no_body()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"is_bad_posture": false, "message": "", "keypoints": []})
        );
    }

    #[test]
    fn test_error_verdict_json_shape() {
        let feedback = FrameFeedback::from(ErrorVerdict::new("Decode error: bad"));
        let json = serde_json::to_value(&feedback).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": "Decode error: bad",
                "is_bad_posture": false,
                "message": "Processing error"
            })
        );
        assert!(feedback.is_error());
    }

    #[test]
    fn test_feedback_deserializes_both_shapes() {
        let verdict: FrameFeedback =
            serde_json::from_str(r#"{"is_bad_posture": true, "message": "Knee over toe", "keypoints": []}"#)
                .unwrap();
        assert!(verdict.is_bad_posture());
        let error: FrameFeedback = serde_json::from_str(
            r#"{"error": "x", "is_bad_posture": false, "message": "Processing error"}"#,
        )
        .unwrap();
        assert!(error.is_error());
    }

    #[test]
    fn test_keypoints_include_low_visibility() {
        let mut points = [Landmark::new(0.5, 0.5, 0.0, 0.9); PoseLandmark::COUNT];
        points[PoseLandmark::LeftAnkle.index()] = Landmark::new(0.25, 0.75, 0.0, 0.01);
        let set = LandmarkSet::from_array(points);

        let kpts = keypoints_from_landmarks(&set, 640, 480);
        assert_eq!(kpts.len(), PoseLandmark::COUNT);
        let ankle = kpts[PoseLandmark::LeftAnkle.index()];
        assert_eq!((ankle.id, ankle.x, ankle.y), (27, 160, 360));
        assert!((ankle.visibility - 0.01).abs() < f32::EPSILON);
    }

    #[test]
    fn test_speed_total() {
        let speed = Speed::new(12.5, 0.5);
        assert!((speed.total() - 13.0).abs() < 1e-9);
        assert!(Speed::default().total().abs() < f64::EPSILON);
    }
}
