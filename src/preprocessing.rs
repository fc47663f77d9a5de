// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Image preprocessing for pose landmark inference.
//!
//! Letterboxes the frame into the model input (aspect ratio preserved, black
//! padding), normalizes to [0, 1] and lays the pixels out as NHWC or NCHW.

use image::{DynamicImage, GenericImageView, RgbImage, imageops::FilterType};
use ndarray::Array4;

/// Letterbox padding color. BlazePose is trained on zero padding.
pub const LETTERBOX_COLOR: [u8; 3] = [0, 0, 0];

/// Result of preprocessing an image, containing the tensor and transform info.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Input tensor normalized to [0, 1]: `(1, H, W, 3)` or `(1, 3, H, W)`.
    pub tensor: Array4<f32>,
    /// Original image dimensions (height, width).
    pub orig_shape: (u32, u32),
    /// Scale factors applied (`scale_y`, `scale_x`).
    pub scale: (f32, f32),
    /// Padding applied (`pad_top`, `pad_left`).
    pub padding: (f32, f32),
}

impl PreprocessResult {
    /// Map a point from model input pixels to normalized original-image coordinates.
    ///
    /// # Arguments
    ///
    /// * `x` - X coordinate in model input pixels.
    /// * `y` - Y coordinate in model input pixels.
    ///
    /// # Returns
    ///
    /// `(x, y)` where (0, 0) is the top-left and (1, 1) the bottom-right of the
    /// original image. Points in the padding map outside [0, 1].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_normalized(&self, x: f32, y: f32) -> (f32, f32) {
        let (scale_y, scale_x) = self.scale;
        let (pad_top, pad_left) = self.padding;
        let (orig_h, orig_w) = (self.orig_shape.0 as f32, self.orig_shape.1 as f32);
        (
            (x - pad_left) / scale_x / orig_w,
            (y - pad_top) / scale_y / orig_h,
        )
    }

    /// Width of the image content inside the input, in input pixels.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn content_width(&self) -> f32 {
        self.orig_shape.1 as f32 * self.scale.1
    }
}

/// Preprocess an image for pose landmark inference.
///
/// # Arguments
///
/// * `image` - Input image.
/// * `target_size` - Model input size as (height, width).
/// * `channels_last` - Produce NHWC (`true`) or NCHW (`false`).
///
/// # Returns
///
/// Preprocessed tensor and transform information for post-processing.
#[must_use]
pub fn preprocess_image(
    image: &DynamicImage,
    target_size: (usize, usize),
    channels_last: bool,
) -> PreprocessResult {
    let (orig_width, orig_height) = image.dimensions();
    let (new_width, new_height, pad_left, pad_top, scale) =
        calculate_letterbox_params(orig_width, orig_height, target_size);

    let resized = image::imageops::resize(
        &image.to_rgb8(),
        new_width.max(1),
        new_height.max(1),
        FilterType::Triangle,
    );

    #[allow(clippy::cast_possible_truncation)]
    let mut canvas = RgbImage::from_pixel(
        target_size.1 as u32,
        target_size.0 as u32,
        image::Rgb(LETTERBOX_COLOR),
    );
    image::imageops::replace(&mut canvas, &resized, i64::from(pad_left), i64::from(pad_top));

    let tensor = if channels_last {
        image_to_tensor_nhwc(&canvas)
    } else {
        image_to_tensor_nchw(&canvas)
    };

    #[allow(clippy::cast_precision_loss)]
    let padding = (pad_top as f32, pad_left as f32);

    PreprocessResult {
        tensor,
        orig_shape: (orig_height, orig_width),
        scale,
        padding,
    }
}

/// Calculate letterbox parameters for resizing.
///
/// # Returns
///
/// Tuple containing:
/// 1. `new_width`: Scaled width.
/// 2. `new_height`: Scaled height.
/// 3. `pad_left`: Left padding.
/// 4. `pad_top`: Top padding.
/// 5. `(scale_y, scale_x)`: Scale factors.
fn calculate_letterbox_params(
    orig_width: u32,
    orig_height: u32,
    target_size: (usize, usize),
) -> (u32, u32, u32, u32, (f32, f32)) {
    #[allow(clippy::cast_precision_loss)]
    let (target_h, target_w) = (target_size.0 as f32, target_size.1 as f32);
    #[allow(clippy::cast_precision_loss)]
    let (orig_h, orig_w) = (orig_height.max(1) as f32, orig_width.max(1) as f32);

    let scale = (target_h / orig_h).min(target_w / orig_w);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_w = ((orig_w * scale).round() as u32).max(1);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_h = ((orig_h * scale).round() as u32).max(1);

    #[allow(clippy::cast_possible_truncation)]
    let pad_w = (target_size.1 as u32).saturating_sub(new_w);
    #[allow(clippy::cast_possible_truncation)]
    let pad_h = (target_size.0 as u32).saturating_sub(new_h);

    #[allow(clippy::cast_precision_loss)]
    let scale_x = new_w as f32 / orig_w;
    #[allow(clippy::cast_precision_loss)]
    let scale_y = new_h as f32 / orig_h;

    (new_w, new_h, pad_w / 2, pad_h / 2, (scale_y, scale_x))
}

/// Convert an RGB image to a normalized `(1, H, W, 3)` tensor.
fn image_to_tensor_nhwc(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    let data: Vec<f32> = image.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect();
    Array4::from_shape_vec((1, h, w, 3), data).unwrap_or_else(|_| Array4::zeros((1, h, w, 3)))
}

/// Convert an RGB image to a normalized `(1, 3, H, W)` tensor.
fn image_to_tensor_nchw(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    let mut tensor = Array4::zeros((1, 3, h, w));

    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = f32::from(pixel[c]) / 255.0;
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_params_square() {
        let (new_w, new_h, pad_left, pad_top, _) = calculate_letterbox_params(512, 512, (256, 256));
        assert_eq!((new_w, new_h, pad_left, pad_top), (256, 256, 0, 0));
    }

    #[test]
    fn test_letterbox_params_wide() {
        let (new_w, new_h, pad_left, pad_top, (sy, sx)) =
            calculate_letterbox_params(640, 480, (256, 256));
        assert_eq!((new_w, new_h), (256, 192));
        assert_eq!((pad_left, pad_top), (0, 32));
        assert!((sx - 0.4).abs() < 1e-6);
        assert!((sy - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_tensor_layouts() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 32, image::Rgb([255, 0, 0])));

        let nhwc = preprocess_image(&img, (32, 32), true);
        assert_eq!(nhwc.tensor.shape(), &[1, 32, 32, 3]);
        // Top rows are padding, middle rows hold the red image.
        assert!(nhwc.tensor[[0, 0, 16, 0]].abs() < 1e-6);
        assert!((nhwc.tensor[[0, 16, 16, 0]] - 1.0).abs() < 1e-6);
        assert!(nhwc.tensor[[0, 16, 16, 1]].abs() < 1e-6);

        let nchw = preprocess_image(&img, (32, 32), false);
        assert_eq!(nchw.tensor.shape(), &[1, 3, 32, 32]);
        assert!((nchw.tensor[[0, 0, 16, 16]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tensor_shape_carries_input_size() {
        let img = DynamicImage::new_rgb8(640, 480);
        let pre = preprocess_image(&img, (224, 192), true);
        assert_eq!(pre.tensor.shape(), &[1, 224, 192, 3]);
        assert_eq!(pre.orig_shape, (480, 640));
    }

    #[test]
    fn test_to_normalized_inverts_letterbox() {
        let img = DynamicImage::new_rgb8(640, 480);
        let pre = preprocess_image(&img, (256, 256), true);

        // Image center maps to the input center.
        let (x, y) = pre.to_normalized(128.0, 128.0);
        assert!((x - 0.5).abs() < 1e-4);
        assert!((y - 0.5).abs() < 1e-4);

        // Top edge of content sits below the 32 px padding band.
        let (_, top) = pre.to_normalized(0.0, 32.0);
        assert!(top.abs() < 1e-4);
        assert!((pre.content_width() - 256.0).abs() < 1e-3);
    }
}
