use crate::sample::DetectionSample;
use crate::transforms::Transform;
use anyhow::{ensure, Result};
use image::{DynamicImage, GenericImageView};
use tch::{Kind, Tensor};

// ============================================================================
// bgr_tensor_from_image
// ============================================================================

/// Converts an image into the `[H, W, 3]` `Uint8` BGR tensor the pipelines
/// expect as input.
///
/// Non-RGB formats go through `to_rgb8` first, so alpha is dropped and
/// 16-bit / float images are quantized.
pub fn bgr_tensor_from_image(img: &DynamicImage) -> Result<Tensor> {
    let (width, height) = img.dimensions();
    ensure!(
        width > 0 && height > 0,
        "Image dimensions must be positive (got {}x{})",
        width,
        height
    );

    let rgb = match img {
        DynamicImage::ImageRgb8(rgb) => Tensor::from_slice(rgb.as_raw()),
        _ => Tensor::from_slice(img.to_rgb8().as_raw()),
    };
    Ok(rgb
        .reshape(&[height as i64, width as i64, 3])
        .flip(&[2])
        .contiguous())
}

// ============================================================================
// ConvertFromInts
// ============================================================================

/// Casts the image to `Float`. Every later stage assumes a float image.
#[derive(Debug, Clone, Default)]
pub struct ConvertFromInts;

impl Transform<DetectionSample, DetectionSample> for ConvertFromInts {
    fn apply(&self, mut sample: DetectionSample) -> Result<DetectionSample> {
        sample.image = sample.image.to_kind(Kind::Float);
        Ok(sample)
    }
}

// ============================================================================
// ToAbsoluteCoords / ToPercentCoords
// ============================================================================

/// Scales boxes from fractions of the image size to pixels.
#[derive(Debug, Clone, Default)]
pub struct ToAbsoluteCoords;

impl Transform<DetectionSample, DetectionSample> for ToAbsoluteCoords {
    fn apply(&self, mut sample: DetectionSample) -> Result<DetectionSample> {
        let (height, width) = sample.image_hw();
        let (sx, sy) = (width as f32, height as f32);
        for b in sample.boxes.iter_mut() {
            *b = b.scale(sx, sy);
        }
        Ok(sample)
    }
}

/// Scales boxes from pixels to fractions of the image size.
#[derive(Debug, Clone, Default)]
pub struct ToPercentCoords;

impl Transform<DetectionSample, DetectionSample> for ToPercentCoords {
    fn apply(&self, mut sample: DetectionSample) -> Result<DetectionSample> {
        let (height, width) = sample.image_hw();
        let (width, height) = (width as f32, height as f32);
        for b in sample.boxes.iter_mut() {
            b.x1 /= width;
            b.x2 /= width;
            b.y1 /= height;
            b.y2 /= height;
        }
        Ok(sample)
    }
}
