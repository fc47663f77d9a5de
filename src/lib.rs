// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Posture Inference Library
//!
//! Real-time posture checks from single camera frames. A pose model finds the
//! body landmarks of one person, and rule sets for squats and desk sitting
//! turn them into a verdict such as `"Knee over toe"` or `"Good Posture"`.
//!
//! ## Features
//!
//! - **ONNX Runtime** - BlazePose-style landmark models via [`PoseModel`]
//! - **Rule-based verdicts** - Geometric squat and desk rules, no training needed
//! - **Pluggable providers** - Any [`KeypointProvider`] can feed the evaluator
//! - **Wire format** - Verdicts serialize to the JSON shape capture clients expect
//! - **Multiple Sources** - Images, directories, glob patterns and video (`video` feature)
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use posture_inference::{PoseModel, PostureDetector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = PoseModel::load("pose_landmark_full.onnx")?;
//!     let mut detector = PostureDetector::new(model);
//!
//!     let frame = image::open("frame.jpg")?;
//!     let verdict = detector.process_frame(&frame)?;
//!
//!     if verdict.is_bad_posture {
//!         println!("Fix it: {}", verdict.message);
//!     }
//!     println!("{}", serde_json::to_string(&verdict)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Evaluating Landmarks Directly
//!
//! The rule engine needs no model; landmarks from any source work:
//!
//! ```
//! use posture_inference::{Landmark, LandmarkSet, PoseLandmark, PostureEvaluator};
//!
//! let mut points = [Landmark::new(0.5, 0.5, 0.0, 1.0); PoseLandmark::COUNT];
//! points[PoseLandmark::Nose.index()] = Landmark::new(0.5, 0.10, 0.0, 1.0);
//! points[PoseLandmark::LeftEar.index()] = Landmark::new(0.5, 0.15, 0.0, 1.0);
//! points[PoseLandmark::LeftShoulder.index()] = Landmark::new(0.5, 0.30, 0.0, 1.0);
//! points[PoseLandmark::LeftHip.index()] = Landmark::new(0.5, 0.55, 0.0, 1.0);
//! points[PoseLandmark::LeftKnee.index()] = Landmark::new(0.5, 0.75, 0.0, 1.0);
//! points[PoseLandmark::LeftAnkle.index()] = Landmark::new(0.5, 0.95, 0.0, 1.0);
//!
//! let verdict = PostureEvaluator::new().evaluate(&LandmarkSet::from_array(points), 640, 480);
//! assert_eq!(verdict.message, "Good Posture");
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Check a single image
//! posture-inference predict --model pose_landmark_full.onnx --source frame.jpg
//!
//! # Check a directory and save annotated frames to runs/posture/predict
//! posture-inference predict -m pose_landmark_full.onnx -s frames/ --save
//!
//! # Evaluate landmarks stored as JSON, no model needed
//! posture-inference evaluate --landmarks pose.json --width 640 --height 480
//! ```
//!
//! ## Rules
//!
//! | Activity | Rule | Fires when |
//! |----------|------|------------|
//! | squat | `Knee over toe` | knee more than 20 px ahead of ankle |
//! | squat | `Hunched back (N°)` | hip-shoulder-ear angle below 150° |
//! | desk | `Neck bent (N°)` | shoulder-ear-nose angle below 150° |
//! | desk | `Back not straight (N°)` | hip-shoulder-ear angle outside 160°-200° |
//!
//! A squat violation wins over a desk violation.
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`detector`] | [`PostureDetector`]: frame in, verdict out |
//! | [`evaluator`] | [`PostureEvaluator`] and [`RuleThresholds`] |
//! | [`landmark`] | [`PoseLandmark`], [`Landmark`], [`LandmarkSet`] |
//! | [`model`] | [`PoseModel`], the ONNX keypoint provider |
//! | [`provider`] | [`KeypointProvider`] trait |
//! | [`results`] | [`PostureVerdict`], [`ErrorVerdict`], [`FrameFeedback`] |
//! | [`inference`] | [`InferenceConfig`] for model settings |
//! | [`io`] | Data URL decoding and result saving |
//! | [`source`] | Input source handling ([`Source`], [`SourceIterator`]) |
//! | [`error`] | Error types ([`PostureError`], [`Result`]) |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `annotate` | Image annotation support (default) |
//! | `video` | Video file support |
//! | `cuda` | NVIDIA CUDA acceleration |
//! | `tensorrt` | NVIDIA `TensorRT` optimization |
//! | `coreml` | Apple `CoreML` (macOS/iOS) |
//! | `openvino` | Intel `OpenVINO` |
//!
//! ## License
//!
//! This project is licensed under [AGPL-3.0](https://ultralytics.com/license).

// Modules
#[cfg(feature = "annotate")]
pub mod annotate;
pub mod detector;
pub mod error;
pub mod evaluator;
pub mod inference;
pub mod io;
pub mod landmark;
pub mod model;
pub mod postprocessing;
pub mod preprocessing;
pub mod provider;
pub mod results;
pub mod source;
pub mod task;
pub mod utils;
pub mod visualizer;

// Re-export main types for convenience
pub use detector::PostureDetector;
pub use error::{PostureError, Result};
pub use evaluator::{PostureEvaluator, RuleThresholds};
pub use inference::InferenceConfig;
pub use io::{decode_data_url, decode_image_bytes};
pub use landmark::{Landmark, LandmarkSet, PoseLandmark};
pub use model::PoseModel;
pub use provider::KeypointProvider;
pub use results::{
    ErrorVerdict, FrameFeedback, GOOD_POSTURE_MESSAGE, Keypoint, PostureVerdict, RuleVerdict,
    Speed,
};
pub use source::{Source, SourceIterator, SourceMeta};
pub use task::Activity;
pub use utils::{calculate_angle, pixel_coords};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "posture-inference");
    }
}
