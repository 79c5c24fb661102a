//! Spatial transforms that move image pixels, masks and boxes together.
//!
//! Boxes are expected in absolute pixel coordinates for every transform in
//! this module. When ground-truth handling is enabled the masks always end up
//! with the same height and width as the image.

use crate::config::PIXEL_MEAN;
use crate::rng::{coin, uniform};
use crate::sample::DetectionSample;
use crate::transforms::Transform;
use anyhow::{ensure, Result};
use tch::{Device, Kind, Tensor};

/// `[height, width, 3]` canvas filled with a per-channel constant.
fn filled_canvas(height: i64, width: i64, fill: &[f32; 3], kind: Kind, device: Device) -> Tensor {
    Tensor::from_slice(fill)
        .reshape(&[1, 1, 3])
        .repeat(&[height, width, 1])
        .to_kind(kind)
        .to_device(device)
}

/// Bilinear resize of a channel-first `[C, H, W]` tensor to `size x size`.
fn resize_chw(tensor: &Tensor, size: i64) -> Tensor {
    let kind = tensor.kind();
    tensor
        .to_kind(Kind::Float)
        .unsqueeze(0)
        .upsample_bilinear2d(&[size, size], false, None::<f64>, None::<f64>)
        .squeeze_dim(0)
        .to_kind(kind)
}

// ============================================================================
// Resize
// ============================================================================

/// Stretches the image to `size x size`, ignoring aspect ratio.
///
/// With `resize_gt`, masks are resized the same way (each instance treated
/// as one channel) and re-binarized, and boxes are scaled by the width and
/// height ratios.
///
/// # Example
/// ```ignore
/// let resize = Resize::new(550, true)?;
/// let sample = resize.apply(sample)?;
/// ```
#[derive(Debug, Clone)]
pub struct Resize {
    size: i64,
    resize_gt: bool,
}

impl Resize {
    pub fn new(size: i64, resize_gt: bool) -> Result<Self> {
        ensure!(size > 0, "Resize target must be positive (got {})", size);
        Ok(Self { size, resize_gt })
    }
}

impl Transform<DetectionSample, DetectionSample> for Resize {
    fn apply(&self, mut sample: DetectionSample) -> Result<DetectionSample> {
        let (height, width) = sample.image_hw();
        sample.image = resize_chw(&sample.image.permute(&[2, 0, 1]), self.size)
            .permute(&[1, 2, 0])
            .contiguous();

        if self.resize_gt {
            // An empty instance dimension has nothing to interpolate.
            sample.masks = if sample.num_instances() == 0 {
                Tensor::zeros(
                    &[0, self.size, self.size],
                    (sample.masks.kind(), sample.masks.device()),
                )
            } else {
                // Masks stay binary: interpolated edges are thresholded at 0.5.
                resize_chw(&sample.masks, self.size)
                    .gt(0.5)
                    .to_kind(sample.masks.kind())
            };

            let sx = self.size as f32 / width as f32;
            let sy = self.size as f32 / height as f32;
            for b in sample.boxes.iter_mut() {
                *b = b.scale(sx, sy);
            }
        }
        Ok(sample)
    }
}

// ============================================================================
// Pad
// ============================================================================

/// Places the image in the top-left corner of a `height x width` canvas
/// filled with the pixel mean. The image must fit inside the canvas.
#[derive(Debug, Clone)]
pub struct Pad {
    width: i64,
    height: i64,
    fill: [f32; 3],
    pad_gt: bool,
}

impl Pad {
    pub fn new(width: i64, height: i64, pad_gt: bool) -> Result<Self> {
        Self::with_fill(width, height, PIXEL_MEAN, pad_gt)
    }

    pub fn with_fill(width: i64, height: i64, fill: [f32; 3], pad_gt: bool) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "Pad canvas must be positive (got {}x{})",
            width,
            height
        );
        Ok(Self {
            width,
            height,
            fill,
            pad_gt,
        })
    }
}

impl Transform<DetectionSample, DetectionSample> for Pad {
    fn apply(&self, mut sample: DetectionSample) -> Result<DetectionSample> {
        let (im_h, im_w) = sample.image_hw();
        ensure!(
            im_h <= self.height && im_w <= self.width,
            "Image {}x{} does not fit in pad canvas {}x{}",
            im_w,
            im_h,
            self.width,
            self.height
        );

        let canvas = filled_canvas(
            self.height,
            self.width,
            &self.fill,
            sample.image.kind(),
            sample.image.device(),
        );
        canvas
            .narrow(0, 0, im_h)
            .narrow(1, 0, im_w)
            .copy_(&sample.image);
        sample.image = canvas;

        if self.pad_gt {
            let num = sample.masks.size()[0];
            let padded = Tensor::zeros(
                &[num, self.height, self.width],
                (sample.masks.kind(), sample.masks.device()),
            );
            padded
                .narrow(1, 0, im_h)
                .narrow(2, 0, im_w)
                .copy_(&sample.masks);
            sample.masks = padded;
        }
        Ok(sample)
    }
}

// ============================================================================
// Expand
// ============================================================================

/// Half of the time, zooms out by placing the image on a canvas up to four
/// times larger, filled with the pixel mean. Emulates smaller objects.
#[derive(Debug, Clone)]
pub struct Expand {
    fill: [f32; 3],
}

impl Expand {
    pub fn new(fill: [f32; 3]) -> Self {
        Self { fill }
    }
}

impl Default for Expand {
    fn default() -> Self {
        Self::new(PIXEL_MEAN)
    }
}

impl Transform<DetectionSample, DetectionSample> for Expand {
    fn apply(&self, mut sample: DetectionSample) -> Result<DetectionSample> {
        if !coin() {
            return Ok(sample);
        }

        let (height, width) = sample.image_hw();
        let (h, w) = (height as f64, width as f64);
        let ratio = uniform(1.0, 4.0);
        let left = uniform(1.0, w * ratio - w);
        let top = uniform(1.0, h * ratio - h);

        let new_h = (h * ratio) as i64;
        let new_w = (w * ratio) as i64;
        let left = (left as i64).clamp(0, new_w - width);
        let top = (top as i64).clamp(0, new_h - height);
        log::trace!(
            "expand {}x{} -> {}x{} at ({}, {})",
            width,
            height,
            new_w,
            new_h,
            left,
            top
        );

        let canvas = filled_canvas(
            new_h,
            new_w,
            &self.fill,
            sample.image.kind(),
            sample.image.device(),
        );
        canvas
            .narrow(0, top, height)
            .narrow(1, left, width)
            .copy_(&sample.image);
        sample.image = canvas;

        let num = sample.masks.size()[0];
        let masks = Tensor::zeros(
            &[num, new_h, new_w],
            (sample.masks.kind(), sample.masks.device()),
        );
        masks
            .narrow(1, top, height)
            .narrow(2, left, width)
            .copy_(&sample.masks);
        sample.masks = masks;

        for b in sample.boxes.iter_mut() {
            *b = b.translate(left as f32, top as f32);
        }
        Ok(sample)
    }
}

// ============================================================================
// RandomMirror
// ============================================================================

/// Half of the time, flips image and masks horizontally and reflects boxes
/// about the vertical center line.
#[derive(Debug, Clone, Default)]
pub struct RandomMirror;

impl RandomMirror {
    pub(crate) fn mirror(mut sample: DetectionSample) -> DetectionSample {
        let (_, width) = sample.image_hw();
        let width = width as f32;
        sample.image = sample.image.flip(&[1]);
        sample.masks = sample.masks.flip(&[2]);
        for b in sample.boxes.iter_mut() {
            let (x1, x2) = (b.x1, b.x2);
            b.x1 = width - x2;
            b.x2 = width - x1;
        }
        sample
    }
}

impl Transform<DetectionSample, DetectionSample> for RandomMirror {
    fn apply(&self, sample: DetectionSample) -> Result<DetectionSample> {
        Ok(if coin() { Self::mirror(sample) } else { sample })
    }
}
