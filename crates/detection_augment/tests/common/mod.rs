#![allow(dead_code)]

use anyhow::Result;
use detection_augment::{
    transforms::vision::bgr_tensor_from_image, BBox, DetectionSample, LabelBundle,
};
use image::{DynamicImage, Rgb, RgbImage};
use tch::{Device, Kind, Tensor};

/// Gradient test image: red grows along x, green along y.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width) as u8;
            let g = (y * 255 / height) as u8;
            img.put_pixel(x, y, Rgb([r, g, 128]));
        }
    }
    DynamicImage::ImageRgb8(img)
}

/// Rasterizes each box (absolute pixels) into its own binary mask.
pub fn box_masks(height: i64, width: i64, boxes: &[BBox]) -> Tensor {
    let masks = Tensor::zeros(&[boxes.len() as i64, height, width], (Kind::Float, Device::Cpu));
    for (i, b) in boxes.iter().enumerate() {
        let x1 = (b.x1.floor() as i64).clamp(0, width);
        let y1 = (b.y1.floor() as i64).clamp(0, height);
        let x2 = (b.x2.ceil() as i64).clamp(x1, width);
        let y2 = (b.y2.ceil() as i64).clamp(y1, height);
        let _ = masks
            .get(i as i64)
            .narrow(0, y1, y2 - y1)
            .narrow(1, x1, x2 - x1)
            .fill_(1.0);
    }
    masks
}

/// Builds a sample from an image plus boxes given in absolute pixels.
///
/// `percent` converts the stored boxes to fractions of the image size, as
/// the training pipeline expects.
pub fn make_sample(
    width: u32,
    height: u32,
    boxes: Vec<BBox>,
    labels: Vec<i64>,
    num_crowds: usize,
    percent: bool,
) -> Result<DetectionSample> {
    let image = bgr_tensor_from_image(&gradient_image(width, height))?;
    let masks = box_masks(height as i64, width as i64, &boxes);
    let boxes = if percent {
        boxes
            .iter()
            .map(|b| b.scale(1.0 / width as f32, 1.0 / height as f32))
            .collect()
    } else {
        boxes
    };
    DetectionSample::new(image, masks, boxes, LabelBundle::new(labels, num_crowds)?)
}

pub fn all_finite(tensor: &Tensor) -> bool {
    tensor
        .isfinite()
        .all()
        .to_kind(Kind::Int64)
        .int64_value(&[])
        == 1
}

/// Every element is exactly 0 or 1.
pub fn is_binary(tensor: &Tensor) -> bool {
    tensor
        .eq(0.0)
        .logical_or(&tensor.eq(1.0))
        .all()
        .to_kind(Kind::Int64)
        .int64_value(&[])
        == 1
}
