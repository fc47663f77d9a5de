// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Inference configuration for the pose landmark model.
//!
//! [`InferenceConfig`] controls how [`crate::PoseModel`] prepares its input and
//! reads its outputs: the presence threshold, input size, tensor layout and
//! ONNX Runtime threading.

/// Default input size of the BlazePose landmark model (height, width).
pub const DEFAULT_IMGSZ: (usize, usize) = (256, 256);

/// Configuration for pose landmark inference.
///
/// Uses a builder pattern for convenient construction.
///
/// # Example
///
/// ```rust
/// use posture_inference::InferenceConfig;
///
/// let config = InferenceConfig::new()
///     .with_confidence(0.6)
///     .with_imgsz(256, 256)
///     .with_threads(2);
/// ```
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Minimum pose-presence score (0.0 to 1.0).
    /// Frames scoring below this report no body.
    pub min_detection_confidence: f32,
    /// Model input size (height, width).
    pub imgsz: (usize, usize),
    /// Whether the model takes NHWC input (`true`) or NCHW (`false`).
    /// BlazePose exports are NHWC.
    pub channels_last: bool,
    /// Number of intra-op threads for ONNX Runtime.
    /// Setting this to `0` allows ONNX Runtime to choose the optimal number.
    pub num_threads: usize,
    /// Name of the landmark output. If `None`, the output with
    /// 5 values per landmark is located by shape.
    pub landmark_output: Option<String>,
    /// Name of the pose-presence output. If `None`, the first single-value
    /// output is used; models without one always report a body.
    pub flag_output: Option<String>,
    /// Whether the pose-presence output is a raw logit that needs a sigmoid.
    /// Stock BlazePose exports emit a probability.
    pub flag_is_logit: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            imgsz: DEFAULT_IMGSZ,
            channels_last: true,
            num_threads: 0,
            landmark_output: None,
            flag_output: None,
            flag_is_logit: false,
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum pose-presence score.
    ///
    /// # Arguments
    ///
    /// * `threshold` - The minimum presence score (0.0 to 1.0).
    ///
    /// # Returns
    ///
    /// * The modified `InferenceConfig`.
    #[must_use]
    pub const fn with_confidence(mut self, threshold: f32) -> Self {
        self.min_detection_confidence = threshold;
        self
    }

    /// Set the model input size.
    ///
    /// # Arguments
    ///
    /// * `height` - The input height.
    /// * `width` - The input width.
    ///
    /// # Returns
    ///
    /// * The modified `InferenceConfig`.
    #[must_use]
    pub const fn with_imgsz(mut self, height: usize, width: usize) -> Self {
        self.imgsz = (height, width);
        self
    }

    /// Select NHWC (`true`) or NCHW (`false`) input layout.
    #[must_use]
    pub const fn with_channels_last(mut self, channels_last: bool) -> Self {
        self.channels_last = channels_last;
        self
    }

    /// Set the number of threads for inference.
    ///
    /// # Arguments
    ///
    /// * `threads` - The number of intra-op threads. Set to `0` for auto-configuration.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Read landmarks from the named output instead of locating it by shape.
    #[must_use]
    pub fn with_landmark_output(mut self, name: impl Into<String>) -> Self {
        self.landmark_output = Some(name.into());
        self
    }

    /// Read the pose-presence score from the named output.
    #[must_use]
    pub fn with_flag_output(mut self, name: impl Into<String>) -> Self {
        self.flag_output = Some(name.into());
        self
    }

    /// Treat the pose-presence output as a logit.
    #[must_use]
    pub const fn with_flag_logit(mut self, is_logit: bool) -> Self {
        self.flag_is_logit = is_logit;
        self
    }
}
