// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Integration tests for the posture library

use base64::Engine;
use image::{DynamicImage, ImageFormat};
use posture_inference::{
    FrameFeedback, KeypointProvider, Landmark, LandmarkSet, PoseLandmark, PostureDetector,
    PostureError, PostureEvaluator, PostureVerdict, Result, RuleThresholds, calculate_angle,
};

/// Provider replaying a fixed detection for every frame.
struct Scripted(Option<LandmarkSet>);

impl KeypointProvider for Scripted {
    fn detect(&mut self, _image: &DynamicImage) -> Result<Option<LandmarkSet>> {
        Ok(self.0.clone())
    }
}

struct Broken;

impl KeypointProvider for Broken {
    fn detect(&mut self, _image: &DynamicImage) -> Result<Option<LandmarkSet>> {
        Err(PostureError::InferenceError("session lost".to_string()))
    }
}

/// Side view with every measured joint on one vertical line.
fn upright() -> [Landmark; PoseLandmark::COUNT] {
    let mut points = [Landmark::new(0.5, 0.5, 0.0, 0.9); PoseLandmark::COUNT];
    points[PoseLandmark::Nose.index()] = Landmark::new(0.5, 0.10, 0.0, 0.99);
    points[PoseLandmark::LeftEar.index()] = Landmark::new(0.5, 0.15, 0.0, 0.95);
    points[PoseLandmark::LeftShoulder.index()] = Landmark::new(0.5, 0.30, 0.0, 0.99);
    points[PoseLandmark::LeftHip.index()] = Landmark::new(0.5, 0.55, 0.0, 0.99);
    points[PoseLandmark::LeftKnee.index()] = Landmark::new(0.5, 0.75, 0.0, 0.98);
    points[PoseLandmark::LeftAnkle.index()] = Landmark::new(0.5, 0.95, 0.0, 0.97);
    points
}

/// Knee 21 px past the ankle on a 1024 px wide frame.
fn knee_forward(points: &mut [Landmark; PoseLandmark::COUNT]) {
    points[PoseLandmark::LeftKnee.index()].x = 533.0 / 1024.0;
}

/// Nose tipped forward: shoulder-ear-nose angle ~121°.
fn neck_bent(points: &mut [Landmark; PoseLandmark::COUNT]) {
    points[PoseLandmark::Nose.index()] = Landmark::new(0.6, 0.09, 0.0, 0.99);
}

fn detect(points: [Landmark; PoseLandmark::COUNT]) -> PostureVerdict {
    let mut detector = PostureDetector::new(Scripted(Some(LandmarkSet::from_array(points))));
    detector.process_frame(&DynamicImage::new_rgb8(1024, 768)).unwrap()
}

fn png_data_url() -> String {
    let mut bytes = Vec::new();
    DynamicImage::new_rgb8(64, 48)
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[test]
fn test_angle_properties() {
    let a = Landmark::new(0.0, 0.0, 0.0, 1.0);
    let b = Landmark::new(1.0, 1.0, 0.0, 1.0);
    let c = Landmark::new(2.0, 2.0, 0.0, 1.0);
    assert!((calculate_angle(&a, &b, &c).unwrap() - 180.0).abs() < 1e-2);

    let far = Landmark::new(3.0, 0.5, 0.0, 1.0);
    let near = Landmark::new(2.0, 0.5, 0.0, 1.0);
    let origin = Landmark::new(0.0, 0.5, 0.0, 1.0);
    assert!(calculate_angle(&far, &origin, &near).unwrap().abs() < 1e-2);

    let d = Landmark::new(0.3, 0.9, 0.2, 1.0);
    let forward = calculate_angle(&a, &b, &d).unwrap();
    let backward = calculate_angle(&d, &b, &a).unwrap();
    assert!((forward - backward).abs() < 1e-4);
    assert!((0.0..=180.0).contains(&forward));
}

#[test]
fn test_knee_over_toe_only() {
    let mut points = upright();
    knee_forward(&mut points);
    let verdict = detect(points);
    assert!(verdict.is_bad_posture);
    assert_eq!(verdict.message, "Knee over toe");
}

#[test]
fn test_hunched_back_only() {
    let mut points = upright();
    points[PoseLandmark::LeftEar.index()] = Landmark::new(0.6, 0.18, 0.0, 0.95);
    points[PoseLandmark::Nose.index()] = Landmark::new(0.65, 0.12, 0.0, 0.99);
    let verdict = detect(points);
    assert!(verdict.is_bad_posture);
    assert_eq!(verdict.message, "Hunched back (140°)");
}

#[test]
fn test_neck_bent_only() {
    let mut points = upright();
    neck_bent(&mut points);
    let verdict = detect(points);
    assert!(verdict.is_bad_posture);
    assert_eq!(verdict.message, "Neck bent (120°)");
}

#[test]
fn test_squat_verdict_wins_merge() {
    let mut points = upright();
    knee_forward(&mut points);
    neck_bent(&mut points);
    let verdict = detect(points);
    assert!(verdict.is_bad_posture);
    assert_eq!(verdict.message, "Knee over toe");
}

#[test]
fn test_good_posture_carries_all_keypoints() {
    let verdict = detect(upright());
    assert!(!verdict.is_bad_posture);
    assert_eq!(verdict.message, "Good Posture");
    assert_eq!(verdict.keypoints.len(), PoseLandmark::COUNT);
    assert!(verdict.keypoints.iter().enumerate().all(|(i, kp)| kp.id == i));

    let hip = &verdict.keypoints[PoseLandmark::LeftHip.index()];
    assert_eq!((hip.x, hip.y), (512, 422));
}

#[test]
fn test_no_body_verdict() {
    let mut detector = PostureDetector::new(Scripted(None));
    let verdict = detector.process_frame(&DynamicImage::new_rgb8(640, 480)).unwrap();
    assert_eq!(verdict, PostureVerdict::no_body());

    let json = serde_json::to_value(&verdict).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"is_bad_posture": false, "message": "", "keypoints": []})
    );
}

#[test]
fn test_evaluation_is_idempotent() {
    let mut points = upright();
    neck_bent(&mut points);
    let set = LandmarkSet::from_array(points);
    let evaluator = PostureEvaluator::new();

    let first = evaluator.frame_verdict(Some(&set), 640, 480);
    let second = evaluator.frame_verdict(Some(&set), 640, 480);
    assert_eq!(first, second);
}

#[test]
fn test_visibility_gating_from_thresholds() {
    let mut points = upright();
    knee_forward(&mut points);
    points[PoseLandmark::LeftAnkle.index()].visibility = 0.1;
    let set = LandmarkSet::from_array(points);

    let default = PostureEvaluator::new().evaluate(&set, 1024, 768);
    assert_eq!(default.message, "Knee over toe");

    let gated = PostureEvaluator::with_thresholds(RuleThresholds::new().with_min_visibility(0.5));
    assert_eq!(gated.evaluate(&set, 1024, 768).message, "Good Posture");
}

#[test]
fn test_data_url_end_to_end() {
    let mut detector = PostureDetector::new(Scripted(Some(LandmarkSet::from_array(upright()))));
    let feedback = detector.process_data_url(&png_data_url());
    assert!(!feedback.is_error());
    assert_eq!(feedback.message(), "Good Posture");

    match feedback {
        FrameFeedback::Verdict(verdict) => {
            // 64x48 frame: hip at (0.5, 0.55)
            let hip = &verdict.keypoints[PoseLandmark::LeftHip.index()];
            assert_eq!((hip.x, hip.y), (32, 26));
        }
        FrameFeedback::Error(e) => panic!("unexpected error: {}", e.error),
    }
}

#[test]
fn test_error_feedback_shape() {
    let mut detector = PostureDetector::new(Scripted(None));
    let feedback = detector.process_data_url("data:image/png;base64,@@@not-base64@@@");
    assert!(feedback.is_error());

    let json = serde_json::to_value(&feedback).unwrap();
    assert_eq!(json["is_bad_posture"], false);
    assert_eq!(json["message"], "Processing error");
    assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[test]
fn test_provider_fault_is_not_no_body() {
    let mut detector = PostureDetector::new(Broken);
    let feedback = detector.process_data_url(&png_data_url());
    assert!(feedback.is_error());
    assert!(!feedback.is_bad_posture());

    assert!(detector.process_frame(&DynamicImage::new_rgb8(8, 8)).is_err());
}
