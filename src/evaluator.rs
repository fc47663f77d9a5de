// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Rule-based posture evaluation.
//!
//! The evaluator turns one [`LandmarkSet`] into a [`RuleVerdict`] per
//! [`Activity`] and merges them with a fixed priority. All measurements use
//! the subject's left side, so the camera is expected to face that side.
//!
//! | Activity | Rule | Fires when |
//! |----------|------|------------|
//! | squat | knee over toe | `knee_x_px > ankle_x_px + 20` |
//! | squat | hunched back | angle(hip, shoulder, ear) `< 150°` |
//! | desk | neck bent | angle(shoulder, ear, nose) `< 150°` |
//! | desk | back not straight | angle(hip, shoulder, ear) outside `[160°, 200°]` |

use tracing::debug;

use crate::landmark::{Landmark, LandmarkSet, PoseLandmark};
use crate::results::{PostureVerdict, RuleVerdict, keypoints_from_landmarks};
use crate::task::Activity;
use crate::utils::{calculate_angle, pixel_coords};

/// Threshold constants for the posture rules.
///
/// Fixed once the evaluator is built. The builder methods exist for callers
/// that calibrate for a different camera setup.
///
/// # Example
///
/// ```rust
/// use posture_inference::RuleThresholds;
///
/// let thresholds = RuleThresholds::new()
///     .with_knee_over_toe_px(30)
///     .with_min_visibility(0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RuleThresholds {
    /// Knee may be this many pixels ahead of the ankle before "Knee over toe" fires.
    pub knee_over_toe_px: i32,
    /// Squat back angle (hip, shoulder, ear) below this is "Hunched back".
    pub hunched_back_deg: f32,
    /// Desk neck angle (shoulder, ear, nose) below this is "Neck bent".
    pub neck_bend_deg: f32,
    /// Inclusive range of acceptable desk back angles (hip, shoulder, ear).
    ///
    /// The upper bound exceeds the 180° an angle can reach, so in practice only
    /// the lower bound matters.
    pub back_straight_range: (f32, f32),
    /// When set, required landmarks below this visibility count as absent.
    /// Disabled by default: every emitted landmark is used.
    pub min_visibility: Option<f32>,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            knee_over_toe_px: 20,
            hunched_back_deg: 150.0,
            neck_bend_deg: 150.0,
            back_straight_range: (160.0, 200.0),
            min_visibility: None,
        }
    }
}

impl RuleThresholds {
    /// Create thresholds with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the knee-over-toe pixel tolerance.
    #[must_use]
    pub const fn with_knee_over_toe_px(mut self, px: i32) -> Self {
        self.knee_over_toe_px = px;
        self
    }

    /// Set the hunched-back angle threshold in degrees.
    #[must_use]
    pub const fn with_hunched_back_deg(mut self, deg: f32) -> Self {
        self.hunched_back_deg = deg;
        self
    }

    /// Set the neck-bend angle threshold in degrees.
    #[must_use]
    pub const fn with_neck_bend_deg(mut self, deg: f32) -> Self {
        self.neck_bend_deg = deg;
        self
    }

    /// Set the acceptable back-angle range in degrees (inclusive).
    #[must_use]
    pub const fn with_back_straight_range(mut self, min: f32, max: f32) -> Self {
        self.back_straight_range = (min, max);
        self
    }

    /// Treat required landmarks below `visibility` as absent.
    #[must_use]
    pub const fn with_min_visibility(mut self, visibility: f32) -> Self {
        self.min_visibility = Some(visibility);
        self
    }
}

/// Stateless posture rule engine.
///
/// Evaluating the same landmarks and dimensions always yields the same result.
#[derive(Debug, Clone, Default)]
pub struct PostureEvaluator {
    thresholds: RuleThresholds,
}

impl PostureEvaluator {
    /// Create an evaluator with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an evaluator with custom thresholds.
    #[must_use]
    pub const fn with_thresholds(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    /// Thresholds in use.
    #[must_use]
    pub const fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// Run every ruleset and merge by [`Activity::PRIORITY`].
    ///
    /// # Arguments
    ///
    /// * `landmarks` - Landmarks of the detected body.
    /// * `width` - Image width in pixels.
    /// * `height` - Image height in pixels.
    ///
    /// # Returns
    ///
    /// The first bad verdict in priority order, or `"Good Posture"`.
    #[must_use]
    pub fn evaluate(&self, landmarks: &LandmarkSet, width: u32, height: u32) -> RuleVerdict {
        for activity in Activity::PRIORITY {
            let verdict = self.evaluate_activity(activity, landmarks, width, height);
            if verdict.is_bad_posture {
                debug!(%activity, message = %verdict.message, "bad posture");
                return verdict;
            }
        }
        RuleVerdict::good()
    }

    /// Build the frame verdict for an optional body.
    ///
    /// # Returns
    ///
    /// The empty default verdict when `landmarks` is `None`; otherwise the
    /// merged verdict with every landmark attached as a pixel keypoint.
    #[must_use]
    pub fn frame_verdict(&self, landmarks: Option<&LandmarkSet>, width: u32, height: u32) -> PostureVerdict {
        let Some(landmarks) = landmarks else {
            return PostureVerdict::no_body();
        };

        let keypoints = keypoints_from_landmarks(landmarks, width, height);
        PostureVerdict::new(self.evaluate(landmarks, width, height), keypoints)
    }

    /// Run the ruleset of one activity.
    #[must_use]
    pub fn evaluate_activity(
        &self,
        activity: Activity,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
    ) -> RuleVerdict {
        if !self.has_required(activity, landmarks) {
            debug!(%activity, "ruleset abstained: required landmarks missing");
            return RuleVerdict::abstain();
        }

        match activity {
            Activity::Squat => self.evaluate_squat(landmarks, width, height),
            Activity::Desk => self.evaluate_desk(landmarks),
        }
    }

    /// Squat rules: knee over toe, hunched back.
    fn evaluate_squat(&self, landmarks: &LandmarkSet, width: u32, height: u32) -> RuleVerdict {
        let hip = &landmarks[PoseLandmark::LeftHip];
        let knee = &landmarks[PoseLandmark::LeftKnee];
        let ankle = &landmarks[PoseLandmark::LeftAnkle];
        let shoulder = &landmarks[PoseLandmark::LeftShoulder];
        let ear = &landmarks[PoseLandmark::LeftEar];

        let mut violations = Vec::new();

        let (knee_x, _) = pixel_coords(knee, width, height);
        let (ankle_x, _) = pixel_coords(ankle, width, height);
        if knee_x > ankle_x.saturating_add(self.thresholds.knee_over_toe_px) {
            violations.push("Knee over toe".to_string());
        }

        match calculate_angle(hip, shoulder, ear) {
            Some(back) if back < self.thresholds.hunched_back_deg => {
                violations.push(format!("Hunched back ({}°)", whole_degrees(back)));
            }
            Some(_) => {}
            None => debug!("squat back angle unavailable"),
        }

        RuleVerdict::from_violations(&violations)
    }

    /// Desk rules: neck bend, back not straight.
    fn evaluate_desk(&self, landmarks: &LandmarkSet) -> RuleVerdict {
        let shoulder = &landmarks[PoseLandmark::LeftShoulder];
        let ear = &landmarks[PoseLandmark::LeftEar];
        let nose = &landmarks[PoseLandmark::Nose];
        let hip = &landmarks[PoseLandmark::LeftHip];

        let mut violations = Vec::new();

        match calculate_angle(shoulder, ear, nose) {
            Some(neck) if neck < self.thresholds.neck_bend_deg => {
                violations.push(format!("Neck bent ({}°)", whole_degrees(neck)));
            }
            Some(_) => {}
            None => debug!("desk neck angle unavailable"),
        }

        let (min, max) = self.thresholds.back_straight_range;
        match calculate_angle(hip, shoulder, ear) {
            Some(back) if !(min..=max).contains(&back) => {
                violations.push(format!("Back not straight ({}°)", whole_degrees(back)));
            }
            Some(_) => {}
            None => debug!("desk back angle unavailable"),
        }

        RuleVerdict::from_violations(&violations)
    }

    /// Whether every landmark the activity needs is present and usable.
    #[must_use]
    pub fn has_required(&self, activity: Activity, landmarks: &LandmarkSet) -> bool {
        activity
            .required_landmarks()
            .iter()
            .all(|&id| landmarks.get(id).is_some_and(|lm| self.is_usable(lm)))
    }

    fn is_usable(&self, landmark: &Landmark) -> bool {
        self.thresholds
            .min_visibility
            .is_none_or(|min| landmark.visibility >= min)
    }
}

/// Angle for messages: truncated toward zero, so a reported value never
/// reaches the threshold it failed.
#[allow(clippy::cast_possible_truncation)]
fn whole_degrees(angle: f32) -> i32 {
    angle.trunc() as i32
}
