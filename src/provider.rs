// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Keypoint provider abstraction.

use image::DynamicImage;

use crate::error::Result;
use crate::landmark::LandmarkSet;

/// Source of body landmarks for a frame.
///
/// Implementations hold mutable inference state, so one instance serves one
/// frame at a time. Callers sharing a provider across tasks must serialize
/// access (e.g. behind a mutex).
pub trait KeypointProvider {
    /// Detect the landmarks of at most one body in an RGB image.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no body is present.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn detect(&mut self, image: &DynamicImage) -> Result<Option<LandmarkSet>>;
}

impl<P: KeypointProvider + ?Sized> KeypointProvider for Box<P> {
    fn detect(&mut self, image: &DynamicImage) -> Result<Option<LandmarkSet>> {
        (**self).detect(image)
    }
}
