use crate::geometry::BBox;
use anyhow::{ensure, Result};
use tch::{Kind, Tensor};

/// Class ids of a sample plus the size of its trailing crowd block.
///
/// By convention the last `num_crowds` entries of `labels` (and of the
/// matching boxes and masks) are crowd regions rather than single objects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelBundle {
    pub labels: Vec<i64>,
    pub num_crowds: usize,
}

impl LabelBundle {
    pub fn new(labels: Vec<i64>, num_crowds: usize) -> Result<Self> {
        ensure!(
            num_crowds <= labels.len(),
            "num_crowds ({}) exceeds the number of labels ({})",
            num_crowds,
            labels.len()
        );
        Ok(Self { labels, num_crowds })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether annotation `index` falls inside the trailing crowd block.
    pub fn is_crowd(&self, index: usize) -> bool {
        index >= self.labels.len() - self.num_crowds
    }

    /// Keeps the annotations at `indices` (ascending) and recounts crowds.
    pub(crate) fn retain_indices(&self, indices: &[usize]) -> Self {
        Self {
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            num_crowds: indices.iter().filter(|&&i| self.is_crowd(i)).count(),
        }
    }
}

/// One training example flowing through an augmentation pipeline.
///
/// - `image`: `[H, W, 3]`, BGR until `NormalizeAndToRGB`, integer on input
///   and `Float` once `ConvertFromInts` has run.
/// - `masks`: `[N, H, W]` `Float` instance masks.
/// - `boxes`: `N` boxes, index-aligned with `masks` and `labels.labels`.
/// - `labels`: class ids and the crowd count.
#[derive(Debug)]
pub struct DetectionSample {
    pub image: Tensor,
    pub masks: Tensor,
    pub boxes: Vec<BBox>,
    pub labels: LabelBundle,
}

/// Creates a shallow clone of the `DetectionSample`
impl Clone for DetectionSample {
    fn clone(&self) -> Self {
        Self {
            image: self.image.shallow_clone(),
            masks: self.masks.shallow_clone(),
            boxes: self.boxes.clone(),
            labels: self.labels.clone(),
        }
    }
}

impl DetectionSample {
    /// Validates shapes and annotation alignment, converting masks to `Float`.
    pub fn new(
        image: Tensor,
        masks: Tensor,
        boxes: Vec<BBox>,
        labels: LabelBundle,
    ) -> Result<Self> {
        let image_size = image.size();
        ensure!(
            image_size.len() == 3 && image_size[2] == 3,
            "Image must be a [H, W, 3] tensor (got {:?})",
            image_size
        );
        ensure!(
            image_size[0] > 0 && image_size[1] > 0,
            "Image must have a positive height and width (got {}x{})",
            image_size[1],
            image_size[0]
        );

        let mask_size = masks.size();
        ensure!(
            mask_size.len() == 3,
            "Masks must be a [N, H, W] tensor (got {:?})",
            mask_size
        );
        ensure!(
            mask_size[1..] == image_size[..2],
            "Mask spatial size {:?} does not match image size {:?}",
            &mask_size[1..],
            &image_size[..2]
        );

        let num_masks = mask_size[0] as usize;
        ensure!(
            num_masks == boxes.len() && boxes.len() == labels.len(),
            "Annotation counts disagree: {} masks, {} boxes, {} labels",
            num_masks,
            boxes.len(),
            labels.len()
        );
        ensure!(
            labels.num_crowds <= labels.len(),
            "num_crowds ({}) exceeds the number of annotations ({})",
            labels.num_crowds,
            labels.len()
        );

        Ok(Self {
            image,
            masks: masks.to_kind(Kind::Float),
            boxes,
            labels,
        })
    }

    /// `(height, width)` of the current image.
    pub fn image_hw(&self) -> (i64, i64) {
        let size = self.image.size();
        (size[0], size[1])
    }

    /// `(height, width)` of the current masks.
    pub fn masks_hw(&self) -> (i64, i64) {
        let size = self.masks.size();
        (size[1], size[2])
    }

    pub fn num_instances(&self) -> usize {
        self.boxes.len()
    }

    /// Channel-first `[3, H, W]` copy of the image for model input.
    pub fn image_chw(&self) -> Tensor {
        self.image.permute(&[2, 0, 1]).contiguous()
    }

    pub fn into_parts(self) -> (Tensor, Tensor, Vec<BBox>, LabelBundle) {
        (self.image, self.masks, self.boxes, self.labels)
    }
}
