// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose landmark model loading and inference.
//!
//! This module provides [`PoseModel`], a [`KeypointProvider`] backed by a
//! BlazePose-style landmark ONNX model.

use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use ort::execution_providers::ExecutionProviderDispatch;
#[cfg(feature = "coreml")]
use ort::execution_providers::CoreMLExecutionProvider;
#[cfg(feature = "cuda")]
use ort::execution_providers::CUDAExecutionProvider;
#[cfg(feature = "openvino")]
use ort::execution_providers::OpenVINOExecutionProvider;
#[cfg(feature = "tensorrt")]
use ort::execution_providers::TensorRTExecutionProvider;
use ort::session::Session;
use ort::value::TensorRef;
use tracing::debug;

use crate::error::{PostureError, Result};
use crate::inference::InferenceConfig;
use crate::landmark::LandmarkSet;
use crate::postprocessing::{ModelOutput, postprocess};
use crate::preprocessing::preprocess_image;
use crate::provider::KeypointProvider;

/// Pose landmark model.
///
/// Wraps an ONNX Runtime session and decodes its outputs into a
/// [`LandmarkSet`]. Holds mutable session state, so one frame is processed at a
/// time.
///
/// # Example
///
/// ```no_run
/// use posture_inference::{KeypointProvider, PoseModel};
///
/// let mut model = PoseModel::load("pose_landmark_full.onnx")?;
/// let image = image::open("frame.jpg")?;
/// let landmarks = model.detect(&image)?;
/// println!("body detected: {}", landmarks.is_some());
/// # Ok::<(), posture_inference::PostureError>(())
/// ```
pub struct PoseModel {
    /// ONNX Runtime session.
    session: Session,
    /// Input tensor name.
    input_name: String,
    /// Output tensor names.
    output_names: Vec<String>,
    /// Inference configuration.
    config: InferenceConfig,
    /// Whether model has been warmed up.
    warmed_up: bool,
}

impl PoseModel {
    /// Load a pose landmark model from an ONNX file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the ONNX model file.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist or can't be loaded.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, InferenceConfig::default())
    }

    /// Load a pose landmark model with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the ONNX model file.
    /// * `config` - Custom inference configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist, can't be loaded, or the
    /// configuration is invalid.
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: InferenceConfig) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PostureError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }
        if config.imgsz.0 == 0 || config.imgsz.1 == 0 {
            return Err(PostureError::ConfigError(format!(
                "Input size must be non-zero, got {:?}",
                config.imgsz
            )));
        }

        let mut builder = Session::builder().map_err(|e| {
            PostureError::ModelLoadError(format!("Failed to create session builder: {e}"))
        })?;

        let (names, providers): (Vec<_>, Vec<_>) = execution_providers().into_iter().unzip();
        if !providers.is_empty() {
            debug!(providers = ?names, "registering execution providers");
            builder = builder.with_execution_providers(providers).map_err(|e| {
                PostureError::ModelLoadError(format!("Failed to register execution providers: {e}"))
            })?;
        }

        let session = builder
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| PostureError::ModelLoadError(format!("Failed to set optimization level: {e}")))?
            .with_intra_threads(config.num_threads)
            .map_err(|e| PostureError::ModelLoadError(format!("Failed to set intra-thread count: {e}")))?
            .commit_from_file(path)
            .map_err(|e| PostureError::ModelLoadError(format!("Failed to load model: {e}")))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| PostureError::ModelLoadError("Model declares no inputs".to_string()))?;

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        if output_names.is_empty() {
            return Err(PostureError::ModelLoadError("Model declares no outputs".to_string()));
        }

        debug!(path = %path.display(), input = %input_name, outputs = ?output_names, "loaded pose model");

        Ok(Self {
            session,
            input_name,
            output_names,
            config,
            warmed_up: false,
        })
    }

    /// Warm up the model by running inference with a dummy input.
    ///
    /// Called automatically on the first detection.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    pub fn warmup(&mut self) -> Result<()> {
        if self.warmed_up {
            return Ok(());
        }

        let (h, w) = self.config.imgsz;
        let shape = if self.config.channels_last {
            (1, h, w, 3)
        } else {
            (1, 3, h, w)
        };
        let dummy_input = ndarray::Array4::<f32>::zeros(shape);
        let _ = self.run_inference(&dummy_input)?;

        self.warmed_up = true;
        Ok(())
    }

    /// Run the ONNX model and copy out every output as `f32`.
    fn run_inference(&mut self, input: &ndarray::Array4<f32>) -> Result<Vec<ModelOutput>> {
        let input_contiguous = input.as_standard_layout();
        let input_tensor = TensorRef::from_array_view(&input_contiguous).map_err(|e| {
            PostureError::InferenceError(format!("Failed to create input tensor: {e}"))
        })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];
        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| PostureError::InferenceError(format!("Inference failed: {e}")))?;

        let mut extracted = Vec::with_capacity(self.output_names.len());
        for name in &self.output_names {
            let output = outputs
                .get(name.as_str())
                .ok_or_else(|| PostureError::InferenceError(format!("Output '{name}' not found")))?;
            let (shape, data) = output.try_extract_tensor::<f32>().map_err(|e| {
                PostureError::InferenceError(format!("Failed to extract output '{name}': {e}"))
            })?;
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let shape: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
            extracted.push(ModelOutput::new(name.clone(), shape, data.to_vec()));
        }

        Ok(extracted)
    }

    /// Get the inference configuration.
    #[must_use]
    pub const fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Get the model's input size (height, width).
    #[must_use]
    pub const fn imgsz(&self) -> (usize, usize) {
        self.config.imgsz
    }

    /// Get the model's output names.
    #[must_use]
    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }
}

/// Execution providers compiled into this build, in registration order.
///
/// ONNX Runtime falls back to the next provider, then to CPU, when one is
/// unavailable at runtime.
fn execution_providers() -> Vec<(&'static str, ExecutionProviderDispatch)> {
    #[allow(unused_mut)]
    let mut providers = Vec::new();
    #[cfg(feature = "tensorrt")]
    providers.push(("TensorRT", TensorRTExecutionProvider::default().build()));
    #[cfg(feature = "cuda")]
    providers.push(("CUDA", CUDAExecutionProvider::default().build()));
    #[cfg(feature = "openvino")]
    providers.push(("OpenVINO", OpenVINOExecutionProvider::default().build()));
    #[cfg(feature = "coreml")]
    providers.push(("CoreML", CoreMLExecutionProvider::default().build()));
    providers
}

impl KeypointProvider for PoseModel {
    fn detect(&mut self, image: &DynamicImage) -> Result<Option<LandmarkSet>> {
        if !self.warmed_up {
            self.warmup()?;
        }

        let start = Instant::now();
        let preprocess = preprocess_image(image, self.config.imgsz, self.config.channels_last);
        let preprocess_ms = start.elapsed().as_secs_f64() * 1000.0;

        let start = Instant::now();
        let outputs = self.run_inference(&preprocess.tensor)?;
        let inference_ms = start.elapsed().as_secs_f64() * 1000.0;

        let start = Instant::now();
        let landmarks = postprocess(&outputs, &preprocess, &self.config)?;
        let postprocess_ms = start.elapsed().as_secs_f64() * 1000.0;

        debug!(
            preprocess_ms,
            inference_ms,
            postprocess_ms,
            body = landmarks.is_some(),
            "pose model detection"
        );
        Ok(landmarks)
    }
}

impl std::fmt::Debug for PoseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoseModel")
            .field("input", &self.input_name)
            .field("outputs", &self.output_names)
            .field("imgsz", &self.config.imgsz)
            .field("channels_last", &self.config.channels_last)
            .finish()
    }
}
