//! SSD-style random crop that keeps masks, boxes and labels consistent.

use crate::geometry::{jaccard, BBox};
use crate::rng::{choose_index, uniform};
use crate::sample::DetectionSample;
use crate::transforms::Transform;
use anyhow::Result;
use tch::Tensor;

/// Candidate rectangles tried per sampling mode before a new mode is drawn.
const MAX_TRIALS: usize = 50;

/// `(min_iou, max_iou)` bounds of a crop mode. `None` keeps the whole image.
const SAMPLE_OPTIONS: [Option<(f32, f32)>; 6] = [
    None,
    Some((0.1, f32::INFINITY)),
    Some((0.3, f32::INFINITY)),
    Some((0.7, f32::INFINITY)),
    Some((0.9, f32::INFINITY)),
    Some((f32::NEG_INFINITY, f32::INFINITY)),
];

/// Integer crop rectangle, `[x1, x2) x [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CropRect {
    x1: i64,
    y1: i64,
    x2: i64,
    y2: i64,
}

impl CropRect {
    fn as_bbox(&self) -> BBox {
        BBox::new(self.x1 as f32, self.y1 as f32, self.x2 as f32, self.y2 as f32)
    }

    fn contains_strictly(&self, (cx, cy): (f32, f32)) -> bool {
        (self.x1 as f32) < cx && cx < self.x2 as f32 && (self.y1 as f32) < cy && cy < self.y2 as f32
    }
}

/// Randomly crops the sample, keeping only the instances whose box center
/// falls inside the crop.
///
/// Expects boxes in absolute pixel coordinates. Each call draws one of six
/// modes: keep the whole image, require a minimum IoU of 0.1 / 0.3 / 0.7 /
/// 0.9 with no upper bound, or crop freely. A mode gets up to 50 candidate
/// rectangles; if none is usable a new mode is drawn.
///
/// The IoU bound is only enforced when *both* the minimum is violated and
/// the maximum is exceeded, so with an infinite maximum it never rejects.
/// That permissive check is what the training recipe was tuned with and is
/// kept as is.
///
/// A candidate is discarded if no instance survives or only crowd instances
/// survive. A sample made only of crowd instances therefore only ever leaves
/// through the whole-image mode. `with_max_modes` bounds the number of modes
/// drawn; when the bound is reached the sample is returned untouched.
#[derive(Debug, Clone, Default)]
pub struct RandomSampleCrop {
    max_modes: Option<usize>,
}

impl RandomSampleCrop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_modes(mut self, max_modes: Option<usize>) -> Self {
        self.max_modes = max_modes;
        self
    }

    fn sample_rect(height: i64, width: i64) -> Option<CropRect> {
        let (h_img, w_img) = (height as f64, width as f64);
        let w = uniform(0.3 * w_img, w_img);
        let h = uniform(0.3 * h_img, h_img);

        // aspect ratio constraint b/t .5 & 2
        if h / w < 0.5 || h / w > 2.0 {
            return None;
        }

        let left = uniform(1.0, w_img - w);
        let top = uniform(1.0, h_img - h);
        Some(CropRect {
            x1: (left as i64).min(width),
            y1: (top as i64).min(height),
            x2: ((left + w) as i64).min(width),
            y2: ((top + h) as i64).min(height),
        })
    }

    /// One candidate for a mode. `None` means the candidate was rejected.
    fn try_crop(
        sample: &DetectionSample,
        (min_iou, max_iou): (f32, f32),
    ) -> Option<DetectionSample> {
        let (height, width) = sample.image_hw();
        let rect = Self::sample_rect(height, width)?;

        let overlap = jaccard(&sample.boxes, &rect.as_bbox());
        let min_overlap = overlap.iter().copied().fold(f32::INFINITY, f32::min);
        let max_overlap = overlap.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if min_overlap < min_iou && max_iou < max_overlap {
            return None;
        }

        let keep: Vec<usize> = sample
            .boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| rect.contains_strictly(b.center()))
            .map(|(i, _)| i)
            .collect();
        if keep.iter().all(|&i| sample.labels.is_crowd(i)) {
            return None;
        }

        let (rx1, ry1) = (rect.x1 as f32, rect.y1 as f32);
        let (rx2, ry2) = (rect.x2 as f32, rect.y2 as f32);
        let boxes = keep
            .iter()
            .map(|&i| {
                let b = sample.boxes[i];
                BBox::new(
                    b.x1.max(rx1) - rx1,
                    b.y1.max(ry1) - ry1,
                    b.x2.min(rx2) - rx1,
                    b.y2.min(ry2) - ry1,
                )
            })
            .collect();

        let (crop_w, crop_h) = (rect.x2 - rect.x1, rect.y2 - rect.y1);
        let image = sample
            .image
            .narrow(0, rect.y1, crop_h)
            .narrow(1, rect.x1, crop_w)
            .contiguous();

        let index: Vec<i64> = keep.iter().map(|&i| i as i64).collect();
        let index = Tensor::from_slice(&index).to_device(sample.masks.device());
        let masks = sample
            .masks
            .index_select(0, &index)
            .narrow(1, rect.y1, crop_h)
            .narrow(2, rect.x1, crop_w)
            .contiguous();

        Some(DetectionSample {
            image,
            masks,
            boxes,
            labels: sample.labels.retain_indices(&keep),
        })
    }
}

impl Transform<DetectionSample, DetectionSample> for RandomSampleCrop {
    fn apply(&self, sample: DetectionSample) -> Result<DetectionSample> {
        let mut modes_drawn = 0usize;
        loop {
            if let Some(max_modes) = self.max_modes {
                if modes_drawn >= max_modes {
                    log::warn!(
                        "no crop found after {} modes, keeping the full image",
                        modes_drawn
                    );
                    return Ok(sample);
                }
            }
            modes_drawn += 1;

            let Some(bounds) = SAMPLE_OPTIONS[choose_index(SAMPLE_OPTIONS.len())] else {
                return Ok(sample);
            };

            for _ in 0..MAX_TRIALS {
                if let Some(cropped) = Self::try_crop(&sample, bounds) {
                    return Ok(cropped);
                }
            }
            log::debug!(
                "crop mode (min_iou={}) abandoned after {} trials",
                bounds.0,
                MAX_TRIALS
            );
        }
    }
}
