// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame transport decoding and result saving.
//!
//! Capture clients send frames as data URLs (`data:image/jpeg;base64,...`).
//! [`decode_data_url`] and [`decode_image_bytes`] turn them into RGB images;
//! [`SaveResults`] writes annotated frames to disk.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use tracing::debug;

use crate::error::{PostureError, Result};
use crate::source::SourceMeta;

/// Decode a data URL (or bare base64 payload) into an RGB image.
///
/// Everything up to the first comma is treated as the header and ignored; a
/// payload without a comma is decoded as plain base64.
///
/// # Errors
///
/// Returns [`PostureError::DecodeError`] if the payload is not valid base64 or
/// does not hold a supported image.
pub fn decode_data_url(data_url: &str) -> Result<DynamicImage> {
    let payload = data_url
        .split_once(',')
        .map_or(data_url, |(_, payload)| payload)
        .trim();

    if payload.is_empty() {
        return Err(PostureError::DecodeError("empty image payload".to_string()));
    }

    let bytes = STANDARD.decode(payload)?;
    decode_image_bytes(&bytes)
}

/// Decode encoded image bytes (JPEG, PNG, ...) into an RGB image.
///
/// # Errors
///
/// Returns [`PostureError::DecodeError`] if the bytes are not a supported image.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes).map_err(|e| {
        debug!(len = bytes.len(), error = %e, "image decode failed");
        PostureError::DecodeError(format!("invalid image data: {e}"))
    })?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

/// Saves annotated frames into a run directory.
///
/// Still images keep their file name; video frames are written as
/// `{stem}_{frame}.jpg`.
#[derive(Debug)]
pub struct SaveResults {
    save_dir: PathBuf,
}

impl SaveResults {
    /// Create a saver writing into `save_dir`.
    #[must_use]
    pub const fn new(save_dir: PathBuf) -> Self {
        Self { save_dir }
    }

    /// Directory frames are written to.
    #[must_use]
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Save an annotated frame.
    ///
    /// # Arguments
    ///
    /// * `is_video` - Whether the frame comes from a video source.
    /// * `meta` - Source metadata (path, frame index).
    /// * `annotated` - The annotated image to save.
    ///
    /// # Returns
    ///
    /// Path of the written file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the image cannot be written.
    pub fn save(&self, is_video: bool, meta: &SourceMeta, annotated: &DynamicImage) -> Result<PathBuf> {
        let path = Path::new(&meta.name);
        let filename = if is_video {
            format!(
                "{}_{}.jpg",
                path.file_stem().unwrap_or_default().to_string_lossy(),
                meta.index
            )
        } else {
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            if name.is_empty() {
                format!("frame_{}.jpg", meta.index)
            } else {
                name.to_string()
            }
        };

        std::fs::create_dir_all(&self.save_dir)?;
        let save_path = self.save_dir.join(filename);
        annotated.save(&save_path)?;
        Ok(save_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_data_url() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes()));
        let img = decode_data_url(&url).unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
        assert_eq!(img.to_rgb8().get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_decode_bare_base64() {
        let img = decode_data_url(&STANDARD.encode(png_bytes())).unwrap();
        assert_eq!(img.width(), 4);
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(decode_data_url("data:image/png;base64,"), Err(PostureError::DecodeError(_))));
        assert!(matches!(decode_data_url("data:image/png;base64,@@@"), Err(PostureError::DecodeError(_))));
        let not_image = format!("data:image/png;base64,{}", STANDARD.encode(b"hello"));
        assert!(matches!(decode_data_url(&not_image), Err(PostureError::DecodeError(_))));
    }

    #[test]
    fn test_save_results_names() {
        let dir = std::env::temp_dir().join(format!("posture_save_{}", std::process::id()));
        let saver = SaveResults::new(dir.clone());
        let img = DynamicImage::new_rgb8(8, 8);

        let image_meta = SourceMeta::still(0, 1, "inputs/person.png");
        let saved = saver.save(false, &image_meta, &img).unwrap();
        assert_eq!(saved, dir.join("person.png"));

        let video_meta = SourceMeta {
            index: 7,
            total: None,
            name: "clip.mp4".to_string(),
            fps: Some(30.0),
        };
        let saved = saver.save(true, &video_meta, &img).unwrap();
        assert_eq!(saved, dir.join("clip_7.jpg"));
        assert!(saved.exists());

        let saved = saver.save(false, &SourceMeta::default(), &img).unwrap();
        assert_eq!(saved, dir.join("frame_0.jpg"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
