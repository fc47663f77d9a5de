// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use image::Rgb;

use super::skeleton::BodyRegion;

/// Color type for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// Red color.
    pub const RED: Self = Self(255, 0, 0);
    /// Green color.
    pub const GREEN: Self = Self(0, 255, 0);
    /// White color.
    pub const WHITE: Self = Self(255, 255, 255);

    /// Banner color for bad posture.
    pub const BAD_POSTURE: Self = Self(255, 68, 79);
    /// Banner color for good posture.
    pub const GOOD_POSTURE: Self = Self(0, 180, 90);

    /// Create a new color from RGB values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    /// Color used for limbs and keypoints of a body region.
    #[must_use]
    pub const fn for_region(region: BodyRegion) -> Self {
        match region {
            BodyRegion::Face => Self(0, 255, 0),
            BodyRegion::Left => Self(255, 128, 0),
            BodyRegion::Right => Self(51, 153, 255),
        }
    }

    /// Banner color for a verdict.
    #[must_use]
    pub const fn for_verdict(is_bad_posture: bool) -> Self {
        if is_bad_posture {
            Self::BAD_POSTURE
        } else {
            Self::GOOD_POSTURE
        }
    }
}

impl From<Color> for Rgb<u8> {
    fn from(c: Color) -> Self {
        Rgb([c.0, c.1, c.2])
    }
}
