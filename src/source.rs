// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame sources for offline posture checks.
//!
//! A [`Source`] names where frames come from; a [`SourceIterator`] yields them
//! one at a time as RGB images with [`SourceMeta`].

use std::path::{Path, PathBuf};
use std::vec;

use image::DynamicImage;

use crate::error::{PostureError, Result};

const STILL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tiff", "tif"];
const CLIP_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm", "m4v", "mpeg", "mpg"];

/// Where frames come from.
#[derive(Debug, Clone)]
pub enum Source {
    /// One image file.
    Image(PathBuf),
    /// A frame already in memory.
    Frame(DynamicImage),
    /// Explicit list of image files, processed in order.
    Files(Vec<PathBuf>),
    /// Every image in a folder, sorted by path.
    Folder(PathBuf),
    /// Single-star pattern such as `frames/*.jpg`.
    Pattern(String),
    /// Video file, decoded with the `video` feature.
    Video(PathBuf),
}

impl Source {
    /// Whether frames come from a video file.
    #[must_use]
    pub const fn is_video(&self) -> bool {
        matches!(self, Self::Video(_))
    }
}

impl From<&str> for Source {
    /// Classify a CLI-style source string: patterns contain `*`, existing
    /// folders are scanned, video extensions are decoded as clips, and
    /// anything else is read as one image.
    fn from(spec: &str) -> Self {
        if spec.contains('*') {
            return Self::Pattern(spec.to_string());
        }

        let path = Path::new(spec);
        if path.is_dir() {
            Self::Folder(path.to_path_buf())
        } else if matches_extension(path, CLIP_EXTENSIONS) {
            Self::Video(path.to_path_buf())
        } else {
            Self::Image(path.to_path_buf())
        }
    }
}

impl From<String> for Source {
    fn from(spec: String) -> Self {
        spec.as_str().into()
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        path.to_string_lossy().as_ref().into()
    }
}

impl From<DynamicImage> for Source {
    fn from(frame: DynamicImage) -> Self {
        Self::Frame(frame)
    }
}

/// Where a frame sits within its source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMeta {
    /// Zero-based frame position.
    pub index: usize,
    /// Number of frames in the source, if known.
    pub total: Option<usize>,
    /// File path of the frame or its video; empty for in-memory frames.
    pub name: String,
    /// Frame rate of video sources.
    pub fps: Option<f32>,
}

impl SourceMeta {
    /// Metadata of a still image.
    #[must_use]
    pub fn still(index: usize, total: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            total: Some(total),
            name: name.into(),
            fps: None,
        }
    }
}

impl Default for SourceMeta {
    fn default() -> Self {
        Self::still(0, 1, String::new())
    }
}

/// Iterator over the frames of a [`Source`].
pub struct SourceIterator {
    frames: Frames,
}

enum Frames {
    Stills {
        paths: vec::IntoIter<PathBuf>,
        index: usize,
        total: usize,
    },
    Single(Option<DynamicImage>),
    #[cfg(feature = "video")]
    Clip(Box<Clip>),
    #[cfg(not(feature = "video"))]
    Unsupported(Option<PathBuf>),
}

impl SourceIterator {
    /// Create an iterator over `source`.
    ///
    /// Folders and patterns are listed up front; image files and videos are
    /// only opened while iterating.
    ///
    /// # Errors
    ///
    /// Returns an error if a folder or pattern directory cannot be listed.
    pub fn new(source: Source) -> Result<Self> {
        let frames = match source {
            Source::Image(path) => Frames::stills(vec![path]),
            Source::Files(paths) => Frames::stills(paths),
            Source::Folder(dir) => Frames::stills(list_images(&dir, None)?),
            Source::Pattern(pattern) => Frames::stills(expand_pattern(&pattern)?),
            Source::Frame(frame) => Frames::Single(Some(frame)),
            #[cfg(feature = "video")]
            Source::Video(path) => Frames::Clip(Box::new(Clip::new(path))),
            #[cfg(not(feature = "video"))]
            Source::Video(path) => Frames::Unsupported(Some(path)),
        };
        Ok(Self { frames })
    }

    /// Number of frames, when known before iterating.
    #[must_use]
    pub fn total(&self) -> Option<usize> {
        match &self.frames {
            Frames::Stills { total, .. } => Some(*total),
            Frames::Single(_) => Some(1),
            #[cfg(feature = "video")]
            Frames::Clip(clip) => clip.total,
            #[cfg(not(feature = "video"))]
            Frames::Unsupported(_) => None,
        }
    }
}

impl Frames {
    fn stills(paths: Vec<PathBuf>) -> Self {
        Self::Stills {
            total: paths.len(),
            paths: paths.into_iter(),
            index: 0,
        }
    }
}

impl Iterator for SourceIterator {
    type Item = Result<(DynamicImage, SourceMeta)>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.frames {
            Frames::Stills { paths, index, total } => {
                let path = paths.next()?;
                let meta = SourceMeta::still(*index, *total, path.to_string_lossy());
                *index += 1;
                Some(load_still(&path).map(|img| (img, meta)))
            }
            Frames::Single(frame) => frame.take().map(|img| Ok((img, SourceMeta::default()))),
            #[cfg(feature = "video")]
            Frames::Clip(clip) => clip.next_frame(),
            #[cfg(not(feature = "video"))]
            Frames::Unsupported(path) => path.take().map(|p| {
                Err(PostureError::FeatureNotEnabled(format!(
                    "{} needs video support, compile with --features video",
                    p.display()
                )))
            }),
        }
    }
}

fn load_still(path: &Path) -> Result<DynamicImage> {
    let img = image::open(path)
        .map_err(|e| PostureError::ImageError(format!("Failed to load {}: {e}", path.display())))?;
    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

/// Lazily opened video decoder.
#[cfg(feature = "video")]
struct Clip {
    path: PathBuf,
    decoder: Option<video_rs::decode::Decoder>,
    total: Option<usize>,
    index: usize,
    finished: bool,
}

#[cfg(feature = "video")]
impl Clip {
    const fn new(path: PathBuf) -> Self {
        Self {
            path,
            decoder: None,
            total: None,
            index: 0,
            finished: false,
        }
    }

    fn next_frame(&mut self) -> Option<Result<(DynamicImage, SourceMeta)>> {
        if self.finished {
            return None;
        }

        if self.decoder.is_none() {
            match video_rs::decode::Decoder::new(self.path.as_path()) {
                Ok(decoder) => {
                    if let Ok(duration) = decoder.duration() {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let frames = (duration.as_secs_f64() * f64::from(decoder.frame_rate())) as usize;
                        self.total = Some(frames);
                    }
                    self.decoder = Some(decoder);
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(PostureError::VideoError(format!(
                        "Failed to open {}: {e}",
                        self.path.display()
                    ))));
                }
            }
        }

        let decoder = self.decoder.as_mut()?;
        // video-rs reports end of stream as a decode error.
        let Ok((_, frame)) = decoder.decode() else {
            self.finished = true;
            return None;
        };

        let meta = SourceMeta {
            index: self.index,
            total: self.total,
            name: self.path.to_string_lossy().into_owned(),
            fps: Some(decoder.frame_rate()),
        };
        self.index += 1;

        Some(frame_to_image(&frame).map(|img| (img, meta)))
    }
}

#[cfg(feature = "video")]
fn frame_to_image(frame: &video_rs::Frame) -> Result<DynamicImage> {
    let (rows, cols) = (frame.shape()[0], frame.shape()[1]);
    let (Ok(height), Ok(width)) = (u32::try_from(rows), u32::try_from(cols)) else {
        return Err(PostureError::VideoError(format!("Frame too large: {cols}x{rows}")));
    };

    let pixels: Vec<u8> = frame.iter().copied().collect();
    image::RgbImage::from_raw(width, height, pixels)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| PostureError::VideoError("Decoded frame is not packed RGB".to_string()))
}

fn matches_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Images in `dir`, sorted by path. `extension` narrows the match to one type.
fn list_images(dir: &Path, extension: Option<&str>) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        PostureError::ImageError(format!("Cannot list {}: {e}", dir.display()))
    })?;

    let mut images = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let keep = match extension {
            Some(ext) => matches_extension(&path, &[ext]),
            None => matches_extension(&path, STILL_EXTENSIONS),
        };
        if keep && path.is_file() {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Expand `dir/*` or `dir/*.ext`.
fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let Some((head, tail)) = pattern.split_once('*') else {
        return Ok(vec![PathBuf::from(pattern)]);
    };

    let head = head.trim_end_matches(['/', '\\']);
    let dir = if head.is_empty() { Path::new(".") } else { Path::new(head) };
    list_images(dir, tail.strip_prefix('.'))
}
