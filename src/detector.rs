// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame-level posture detection.
//!
//! [`PostureDetector`] couples a [`KeypointProvider`] with a
//! [`PostureEvaluator`]: one frame in, one verdict out, no state carried
//! between frames.

use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::error::Result;
use crate::evaluator::PostureEvaluator;
use crate::io::{decode_data_url, decode_image_bytes};
use crate::landmark::LandmarkSet;
use crate::provider::KeypointProvider;
use crate::results::{ErrorVerdict, FrameFeedback, PostureVerdict, Speed};

/// Posture detector for single frames.
///
/// # Example
///
/// ```no_run
/// use posture_inference::{PoseModel, PostureDetector};
///
/// let model = PoseModel::load("pose_landmark_full.onnx")?;
/// let mut detector = PostureDetector::new(model);
/// let verdict = detector.process_frame(&image::open("frame.jpg")?)?;
/// println!("{}", verdict.message);
/// # Ok::<(), posture_inference::PostureError>(())
/// ```
#[derive(Debug)]
pub struct PostureDetector<P> {
    provider: P,
    evaluator: PostureEvaluator,
}

impl<P: KeypointProvider> PostureDetector<P> {
    /// Create a detector with default rule thresholds.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self::with_evaluator(provider, PostureEvaluator::new())
    }

    /// Create a detector with a custom evaluator.
    #[must_use]
    pub const fn with_evaluator(provider: P, evaluator: PostureEvaluator) -> Self {
        Self { provider, evaluator }
    }

    /// Process one decoded frame.
    ///
    /// # Returns
    ///
    /// The merged verdict with pixel keypoints, or the empty default verdict
    /// when no body is detected.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails.
    pub fn process_frame(&mut self, image: &DynamicImage) -> Result<PostureVerdict> {
        self.process_frame_timed(image).map(|(verdict, _)| verdict)
    }

    /// Process one decoded frame and report per-stage timings.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails.
    pub fn process_frame_timed(&mut self, image: &DynamicImage) -> Result<(PostureVerdict, Speed)> {
        let (width, height) = image.dimensions();

        let start = Instant::now();
        let landmarks = self.provider.detect(image)?;
        let inference_ms = start.elapsed().as_secs_f64() * 1000.0;

        let start = Instant::now();
        let verdict = self.evaluate_landmarks(landmarks.as_ref(), width, height);
        let evaluation_ms = start.elapsed().as_secs_f64() * 1000.0;

        debug!(
            width,
            height,
            inference_ms,
            evaluation_ms,
            bad = verdict.is_bad_posture,
            "processed frame"
        );
        Ok((verdict, Speed::new(inference_ms, evaluation_ms)))
    }

    /// Process an encoded image (JPEG, PNG, ...).
    ///
    /// Never fails: decode and provider faults become an [`ErrorVerdict`].
    pub fn process_encoded(&mut self, bytes: &[u8]) -> FrameFeedback {
        let result = decode_image_bytes(bytes).and_then(|image| self.process_frame(&image));
        into_feedback(result)
    }

    /// Process a frame sent as a data URL (`data:image/jpeg;base64,...`).
    ///
    /// Never fails: decode and provider faults become an [`ErrorVerdict`].
    pub fn process_data_url(&mut self, data_url: &str) -> FrameFeedback {
        let result = decode_data_url(data_url).and_then(|image| self.process_frame(&image));
        into_feedback(result)
    }

    /// Access the keypoint provider.
    pub const fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Consume the detector and return its provider.
    pub fn into_provider(self) -> P {
        self.provider
    }
}

impl<P> PostureDetector<P> {
    /// Build a verdict from already detected landmarks.
    ///
    /// # Arguments
    ///
    /// * `landmarks` - Landmarks of the body, or `None` when no body was detected.
    /// * `width` - Image width in pixels.
    /// * `height` - Image height in pixels.
    #[must_use]
    pub fn evaluate_landmarks(&self, landmarks: Option<&LandmarkSet>, width: u32, height: u32) -> PostureVerdict {
        self.evaluator.frame_verdict(landmarks, width, height)
    }

    /// Access the rule evaluator.
    #[must_use]
    pub const fn evaluator(&self) -> &PostureEvaluator {
        &self.evaluator
    }

    /// Access the keypoint provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

fn into_feedback(result: Result<PostureVerdict>) -> FrameFeedback {
    match result {
        Ok(verdict) => verdict.into(),
        Err(e) => {
            debug!(error = %e, "frame processing failed");
            ErrorVerdict::new(e).into()
        }
    }
}
