// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Post-processing for pose landmark model outputs.
//!
//! A BlazePose landmark model emits a landmark tensor with 5 values per point
//! (x, y, z, visibility logit, presence logit) in input pixels, and a single
//! pose-presence score. This module turns those raw outputs into an
//! optional [`LandmarkSet`] in normalized original-image coordinates.

use ndarray::ArrayView2;
use tracing::{debug, warn};

use crate::error::{PostureError, Result};
use crate::inference::InferenceConfig;
use crate::landmark::{Landmark, LandmarkSet, PoseLandmark};
use crate::preprocessing::PreprocessResult;
use crate::utils::sigmoid;

/// Values per landmark in the landmark output.
pub const LANDMARK_DIM: usize = 5;

/// One raw model output, copied out of the runtime.
#[derive(Debug, Clone)]
pub struct ModelOutput {
    /// Output name as declared by the model.
    pub name: String,
    /// Tensor shape.
    pub shape: Vec<usize>,
    /// Flattened tensor data.
    pub data: Vec<f32>,
}

impl ModelOutput {
    /// Create a new output.
    #[must_use]
    pub fn new(name: impl Into<String>, shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            shape,
            data,
        }
    }

    fn is_landmark_tensor(&self) -> bool {
        self.data.len() >= PoseLandmark::COUNT * LANDMARK_DIM && self.data.len() % LANDMARK_DIM == 0
    }
}

/// Decode raw model outputs into the landmarks of at most one body.
///
/// # Arguments
///
/// * `outputs` - All outputs of one inference run.
/// * `preprocess` - Letterbox information of the frame.
/// * `config` - Inference configuration (presence threshold, output names).
///
/// # Returns
///
/// `Ok(None)` when the presence score is below the threshold.
///
/// # Errors
///
/// Returns [`PostureError::InferenceError`] if no landmark output can be found
/// or a named output is missing.
pub fn postprocess(
    outputs: &[ModelOutput],
    preprocess: &PreprocessResult,
    config: &InferenceConfig,
) -> Result<Option<LandmarkSet>> {
    if let Some(score) = presence_score(outputs, config)?
        && score < config.min_detection_confidence
    {
        debug!(score, threshold = config.min_detection_confidence, "no body detected");
        return Ok(None);
    }

    let output = find_landmark_output(outputs, config)?;
    let rows = output.data.len() / LANDMARK_DIM;
    let view = ArrayView2::from_shape((rows, LANDMARK_DIM), &output.data[..rows * LANDMARK_DIM])
        .map_err(|e| PostureError::InferenceError(format!("Bad landmark tensor: {e}")))?;

    let depth_scale = preprocess.content_width().max(f32::EPSILON);
    let landmarks: Vec<Landmark> = view
        .rows()
        .into_iter()
        .take(PoseLandmark::COUNT)
        .map(|row| {
            let (x, y) = preprocess.to_normalized(row[0], row[1]);
            Landmark::new(x, y, row[2] / depth_scale, sigmoid(row[3]))
        })
        .collect();

    LandmarkSet::new(landmarks).map(Some)
}

/// Read the pose-presence score, if the model has one.
///
/// The raw value goes through a sigmoid only when the config marks it as a logit.
fn presence_score(outputs: &[ModelOutput], config: &InferenceConfig) -> Result<Option<f32>> {
    let output = match &config.flag_output {
        Some(name) => Some(find_named(outputs, name)?),
        None => outputs.iter().find(|o| o.data.len() == 1),
    };

    Ok(output
        .and_then(|o| o.data.first().copied())
        .map(|raw| if config.flag_is_logit { sigmoid(raw) } else { raw }))
}

fn find_landmark_output<'a>(
    outputs: &'a [ModelOutput],
    config: &InferenceConfig,
) -> Result<&'a ModelOutput> {
    if let Some(name) = &config.landmark_output {
        let output = find_named(outputs, name)?;
        if !output.is_landmark_tensor() {
            warn!(name = %output.name, shape = ?output.shape, "landmark output has unexpected shape");
            return Err(PostureError::InferenceError(format!(
                "Output '{name}' has {} values, expected a multiple of {LANDMARK_DIM} with at least {} landmarks",
                output.data.len(),
                PoseLandmark::COUNT
            )));
        }
        return Ok(output);
    }

    outputs.iter().find(|o| o.is_landmark_tensor()).ok_or_else(|| {
        let shapes: Vec<_> = outputs.iter().map(|o| (&o.name, &o.shape)).collect();
        warn!(?shapes, "no landmark output found");
        PostureError::InferenceError(format!(
            "No output with {LANDMARK_DIM} values per landmark among {} outputs",
            outputs.len()
        ))
    })
}

fn find_named<'a>(outputs: &'a [ModelOutput], name: &str) -> Result<&'a ModelOutput> {
    outputs
        .iter()
        .find(|o| o.name == name)
        .ok_or_else(|| PostureError::InferenceError(format!("Output '{name}' not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::preprocess_image;
    use image::DynamicImage;

    /// Landmark tensor with 39 points (33 body + 6 auxiliary) placed at the
    /// input center, visibility logit 2.0.
    fn landmark_output(name: &str) -> ModelOutput {
        let mut data = Vec::with_capacity(39 * LANDMARK_DIM);
        for i in 0..39 {
            #[allow(clippy::cast_precision_loss)]
            let z = i as f32;
            data.extend_from_slice(&[128.0, 128.0, z, 2.0, 3.0]);
        }
        ModelOutput::new(name, vec![1, 195], data)
    }

    fn letterbox_640x480() -> PreprocessResult {
        preprocess_image(&DynamicImage::new_rgb8(640, 480), (256, 256), true)
    }

    #[test]
    fn test_decode_maps_back_to_image() {
        let outputs = vec![landmark_output("Identity"), ModelOutput::new("Identity_1", vec![1, 1], vec![0.9])];
        let set = postprocess(&outputs, &letterbox_640x480(), &InferenceConfig::default())
            .unwrap()
            .unwrap();

        assert!(set.is_complete());
        let nose = set[PoseLandmark::Nose];
        assert!((nose.x - 0.5).abs() < 1e-4);
        assert!((nose.y - 0.5).abs() < 1e-4);
        assert!((nose.visibility - sigmoid(2.0)).abs() < 1e-6);
        // z is scaled by the content width (256 px).
        let last = set[PoseLandmark::RightFootIndex];
        assert!((last.z - 32.0 / 256.0).abs() < 1e-6);
    }

    #[test]
    fn test_low_presence_is_no_body() {
        let outputs = vec![ModelOutput::new("flag", vec![1, 1], vec![0.2]), landmark_output("ld")];
        let result = postprocess(&outputs, &letterbox_640x480(), &InferenceConfig::default()).unwrap();
        assert!(result.is_none());

        let logits = vec![ModelOutput::new("flag", vec![1], vec![-3.0]), landmark_output("ld")];
        let config = InferenceConfig::new().with_flag_logit(true);
        let result = postprocess(&logits, &letterbox_640x480(), &config).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_flag_logit_switch() {
        // 0.4 is below the threshold as a probability, sigmoid(0.4) ~ 0.60 is above it.
        let outputs = vec![ModelOutput::new("flag", vec![1, 1], vec![0.4]), landmark_output("ld")];

        let probability = InferenceConfig::default();
        assert!(postprocess(&outputs, &letterbox_640x480(), &probability).unwrap().is_none());

        let logit = InferenceConfig::new().with_flag_logit(true);
        assert!(postprocess(&outputs, &letterbox_640x480(), &logit).unwrap().is_some());
    }

    #[test]
    fn test_missing_flag_output_assumes_body() {
        let outputs = vec![landmark_output("ld")];
        let result = postprocess(&outputs, &letterbox_640x480(), &InferenceConfig::default()).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn test_named_outputs() {
        let outputs = vec![ModelOutput::new("seg", vec![1, 4], vec![0.0; 4]), landmark_output("ld_3d")];
        let config = InferenceConfig::new().with_landmark_output("ld_3d");
        assert!(postprocess(&outputs, &letterbox_640x480(), &config).unwrap().is_some());

        let wrong = InferenceConfig::new().with_landmark_output("seg");
        assert!(matches!(
            postprocess(&outputs, &letterbox_640x480(), &wrong),
            Err(PostureError::InferenceError(_))
        ));

        let missing = InferenceConfig::new().with_flag_output("nope");
        assert!(postprocess(&outputs, &letterbox_640x480(), &missing).is_err());
    }

    #[test]
    fn test_no_landmark_output_is_error() {
        let outputs = vec![ModelOutput::new("flag", vec![1], vec![0.9])];
        assert!(postprocess(&outputs, &letterbox_640x480(), &InferenceConfig::default()).is_err());
    }
}
