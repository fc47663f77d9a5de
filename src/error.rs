// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the posture library.

use std::fmt;

/// Result type alias for posture operations.
pub type Result<T> = std::result::Result<T, PostureError>;

/// Main error type for the posture library.
///
/// "No body detected" and "ruleset abstained" are not errors; they are regular
/// outcomes of [`crate::PostureDetector::process_frame`].
#[derive(Debug)]
pub enum PostureError {
    /// Error loading the ONNX pose model.
    ModelLoadError(String),
    /// Error during model inference.
    InferenceError(String),
    /// Error processing images.
    ImageError(String),
    /// Frame payload could not be decoded (bad data URL, bad base64, bad image bytes).
    DecodeError(String),
    /// Invalid configuration provided.
    ConfigError(String),
    /// Landmark data does not match the pose topology.
    LandmarkError(String),
    /// Wrapped `std::io::Error`.
    Io(std::io::Error),
    /// Video processing error.
    VideoError(String),
    /// Feature not enabled.
    FeatureNotEnabled(String),
}

impl fmt::Display for PostureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoadError(msg) => write!(f, "Model load error: {msg}"),
            Self::InferenceError(msg) => write!(f, "Inference error: {msg}"),
            Self::ImageError(msg) => write!(f, "Image error: {msg}"),
            Self::DecodeError(msg) => write!(f, "Decode error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::LandmarkError(msg) => write!(f, "Landmark error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::VideoError(msg) => write!(f, "Video error: {msg}"),
            Self::FeatureNotEnabled(msg) => write!(f, "Feature not enabled: {msg}"),
        }
    }
}

impl std::error::Error for PostureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PostureError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for PostureError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageError(err.to_string())
    }
}

impl From<ort::Error> for PostureError {
    fn from(err: ort::Error) -> Self {
        Self::InferenceError(err.to_string())
    }
}

impl From<base64::DecodeError> for PostureError {
    fn from(err: base64::DecodeError) -> Self {
        Self::DecodeError(err.to_string())
    }
}

impl From<serde_json::Error> for PostureError {
    fn from(err: serde_json::Error) -> Self {
        Self::LandmarkError(err.to_string())
    }
}
