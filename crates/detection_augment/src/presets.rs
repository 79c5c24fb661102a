//! The two fixed pipelines used for training and evaluation.
//!
//! ```text
//! ValAugmentation:   ConvertFromInts → Resize(no gt) → Pad(no gt) → NormalizeAndToRGB
//!
//! TrainAugmentation: ConvertFromInts → ToAbsoluteCoords → PhotometricDistort
//!                    → Expand → RandomSampleCrop → RandomMirror → Resize
//!                    → Pad → ToPercentCoords → NormalizeAndToRGB
//! ```
//!
//! Training input boxes are in percent coordinates and come out in percent
//! coordinates. The validation pipeline never touches ground truth.

use crate::config::AugmentConfig;
use crate::rng::seed_augment_rng;
use crate::sample::DetectionSample;
use crate::transforms::vision::{
    ConvertFromInts, Expand, NormalizeAndToRGB, Pad, PhotometricDistort, RandomMirror,
    RandomSampleCrop, Resize, ToAbsoluteCoords, ToPercentCoords,
};
use crate::transforms::{Compose, Transform};
use anyhow::{Context, Result};

fn validate(config: &AugmentConfig) -> Result<()> {
    config.validate().context("Invalid augmentation config")
}

/// Deterministic resize, pad and normalize for evaluation and inference.
#[derive(Debug)]
pub struct ValAugmentation {
    augment: Compose<DetectionSample>,
}

impl ValAugmentation {
    /// Builds the pipeline. `config.seed` is not applied: nothing here is random.
    pub fn new(config: &AugmentConfig) -> Result<Self> {
        validate(config)?;
        let size = config.img_size;
        let augment = Compose::new()
            .with(ConvertFromInts)
            .with(Resize::new(size, false)?)
            .with(Pad::with_fill(size, size, config.pixel_mean, false)?)
            .with(NormalizeAndToRGB::new(config.pixel_mean, config.pixel_std)?);
        Ok(Self { augment })
    }
}

impl Transform<DetectionSample, DetectionSample> for ValAugmentation {
    fn apply(&self, sample: DetectionSample) -> Result<DetectionSample> {
        self.augment.apply(sample)
    }
}

/// The full stochastic augmentation recipe for training.
#[derive(Debug)]
pub struct TrainAugmentation {
    augment: Compose<DetectionSample>,
}

impl TrainAugmentation {
    /// Builds the pipeline and, when `config.seed` is set, reseeds the
    /// calling thread's augmentation RNG.
    pub fn new(config: &AugmentConfig) -> Result<Self> {
        validate(config)?;
        if let Some(seed) = config.seed {
            log::debug!("seeding augmentation RNG with {}", seed);
            seed_augment_rng(seed);
        }
        let size = config.img_size;
        let augment = Compose::new()
            .with(ConvertFromInts)
            .with(ToAbsoluteCoords)
            .with(PhotometricDistort::default())
            .with(Expand::new(config.pixel_mean))
            .with(RandomSampleCrop::new().with_max_modes(config.max_crop_modes))
            .with(RandomMirror)
            .with(Resize::new(size, true)?)
            .with(Pad::with_fill(size, size, config.pixel_mean, true)?)
            .with(ToPercentCoords)
            .with(NormalizeAndToRGB::new(config.pixel_mean, config.pixel_std)?);
        Ok(Self { augment })
    }
}

impl Transform<DetectionSample, DetectionSample> for TrainAugmentation {
    fn apply(&self, sample: DetectionSample) -> Result<DetectionSample> {
        self.augment.apply(sample)
    }
}
