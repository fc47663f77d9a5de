// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Draw posture verdicts onto frames.

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::debug;

use crate::landmark::PoseLandmark;
use crate::results::{Keypoint, PostureVerdict};
use crate::visualizer::{BodyRegion, Color, SKELETON};

/// Keypoints below this visibility are not drawn.
pub const KPT_VISIBILITY_THRESHOLD: f32 = 0.5;

/// Environment variable pointing at a TTF font for banner text.
pub const FONT_ENV: &str = "POSTURE_FONT";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Find the next available run directory (predict, predict2, predict3, etc.)
#[must_use]
pub fn find_next_run_dir(base: &Path, prefix: &str) -> PathBuf {
    let first = base.join(prefix);
    if !first.exists() {
        return first;
    }

    (2..)
        .map(|i| base.join(format!("{prefix}{i}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Load a font for banner text.
///
/// Tries `path`, then the `POSTURE_FONT` environment variable, then a few common
/// system locations. Annotation works without a font; only the text is skipped.
#[must_use]
pub fn load_font(path: Option<&Path>) -> Option<FontVec> {
    let env_path = std::env::var_os(FONT_ENV).map(PathBuf::from);
    let candidates = path
        .map(Path::to_path_buf)
        .into_iter()
        .chain(env_path)
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

    for candidate in candidates {
        let Ok(data) = std::fs::read(&candidate) else {
            continue;
        };
        match FontVec::try_from_vec(data) {
            Ok(font) => {
                debug!(path = %candidate.display(), "loaded annotation font");
                return Some(font);
            }
            Err(e) => debug!(path = %candidate.display(), error = %e, "invalid font file"),
        }
    }
    None
}

/// Annotate a frame with the skeleton, keypoints and a verdict banner.
///
/// # Arguments
///
/// * `image` - Frame the verdict was computed on.
/// * `verdict` - Verdict with pixel keypoints.
/// * `font` - Font for the banner text; the banner is drawn without text if `None`.
#[must_use]
pub fn annotate_image(image: &DynamicImage, verdict: &PostureVerdict, font: Option<&FontVec>) -> DynamicImage {
    let mut img = image.to_rgb8();
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return DynamicImage::ImageRgb8(img);
    }

    draw_skeleton(&mut img, &verdict.keypoints);
    if verdict.has_body() {
        draw_banner(&mut img, verdict, font);
    }

    DynamicImage::ImageRgb8(img)
}

fn visible(keypoints: &[Keypoint], id: PoseLandmark) -> Option<&Keypoint> {
    keypoints
        .iter()
        .find(|k| k.id == id.index())
        .filter(|k| k.visibility >= KPT_VISIBILITY_THRESHOLD)
}

#[allow(clippy::cast_precision_loss)]
fn draw_skeleton(img: &mut RgbImage, keypoints: &[Keypoint]) {
    let (width, height) = img.dimensions();
    let radius = (width.min(height) / 160).max(2);
    #[allow(clippy::cast_possible_wrap)]
    let radius = radius as i32;

    for &(a, b) in &SKELETON {
        if let (Some(ka), Some(kb)) = (visible(keypoints, a), visible(keypoints, b)) {
            let color: Rgb<u8> = Color::for_region(BodyRegion::of(a)).into();
            draw_line_segment_mut(img, (ka.x as f32, ka.y as f32), (kb.x as f32, kb.y as f32), color);
        }
    }

    for id in PoseLandmark::ALL {
        if let Some(k) = visible(keypoints, id) {
            let color: Rgb<u8> = Color::for_region(BodyRegion::of(id)).into();
            draw_filled_circle_mut(img, (k.x, k.y), radius, color);
        }
    }
}

fn draw_banner(img: &mut RgbImage, verdict: &PostureVerdict, font: Option<&FontVec>) {
    let (width, height) = img.dimensions();
    let banner_height = (height / 12).clamp(16, 48).min(height);

    let color: Rgb<u8> = Color::for_verdict(verdict.is_bad_posture).into();
    draw_filled_rect_mut(img, Rect::at(0, 0).of_size(width, banner_height), color);

    if let Some(font) = font {
        #[allow(clippy::cast_precision_loss)]
        let scale = PxScale::from(banner_height as f32 * 0.7);
        #[allow(clippy::cast_possible_wrap)]
        let y = (banner_height / 6) as i32;
        draw_text_mut(img, Color::WHITE.into(), 8, y, scale, font, &verdict.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::RuleVerdict;

    fn verdict(bad: bool) -> PostureVerdict {
        let keypoints = vec![
            Keypoint { id: PoseLandmark::LeftShoulder.index(), x: 50, y: 40, visibility: 0.9 },
            Keypoint { id: PoseLandmark::LeftHip.index(), x: 50, y: 90, visibility: 0.9 },
            Keypoint { id: PoseLandmark::LeftKnee.index(), x: 80, y: 90, visibility: 0.1 },
        ];
        let rule = if bad {
            RuleVerdict::from_violations(&["Knee over toe".to_string()])
        } else {
            RuleVerdict::good()
        };
        PostureVerdict::new(rule, keypoints)
    }

    #[test]
    fn test_banner_color_follows_verdict() {
        let img = DynamicImage::new_rgb8(120, 120);
        let bad = annotate_image(&img, &verdict(true), None).to_rgb8();
        assert_eq!(bad.get_pixel(60, 2), &Rgb::from(Color::BAD_POSTURE));

        let good = annotate_image(&img, &verdict(false), None).to_rgb8();
        assert_eq!(good.get_pixel(60, 2), &Rgb::from(Color::GOOD_POSTURE));
    }

    #[test]
    fn test_skeleton_skips_low_visibility() {
        let img = DynamicImage::new_rgb8(120, 120);
        let out = annotate_image(&img, &verdict(false), None).to_rgb8();
        let left = Rgb::from(Color::for_region(BodyRegion::Left));
        // Torso limb between shoulder and hip is drawn.
        assert_eq!(out.get_pixel(50, 65), &left);
        // Knee is hidden, so no keypoint at its position.
        assert_eq!(out.get_pixel(80, 90), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_no_body_leaves_frame_untouched() {
        let img = DynamicImage::new_rgb8(32, 32);
        let out = annotate_image(&img, &PostureVerdict::no_body(), None);
        assert_eq!(out.to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn test_find_next_run_dir() {
        let base = std::env::temp_dir().join(format!("posture_runs_{}", std::process::id()));
        assert_eq!(find_next_run_dir(&base, "predict"), base.join("predict"));
        std::fs::create_dir_all(base.join("predict")).unwrap();
        std::fs::create_dir_all(base.join("predict2")).unwrap();
        assert_eq!(find_next_run_dir(&base, "predict"), base.join("predict3"));
        let _ = std::fs::remove_dir_all(base);
    }
}
