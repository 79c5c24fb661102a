//! Pixel-only augmentations. Masks, boxes and labels pass through untouched.

use super::color::{bgr_to_hsv_inplace, hsv_to_bgr_inplace, ColorSpace};
use crate::config::{PIXEL_MEAN, PIXEL_STD};
use crate::rng::{coin, uniform};
use crate::sample::DetectionSample;
use crate::transforms::{Compose, Transform};
use anyhow::{bail, ensure, Result};
use tch::{Device, Kind, Tensor};

fn check_factor_range(kind: &str, lower: f64, upper: f64) -> Result<()> {
    ensure!(
        upper >= lower,
        "{} upper must be >= lower (got lower={}, upper={})",
        kind,
        lower,
        upper
    );
    ensure!(lower >= 0.0, "{} lower must be non-negative (got {})", kind, lower);
    Ok(())
}

// ============================================================================
// RandomContrast
// ============================================================================

/// Scales every pixel by a factor drawn from `[lower, upper]`, half of the time.
/// Expects a float image.
#[derive(Debug, Clone)]
pub struct RandomContrast {
    lower: f64,
    upper: f64,
}

impl RandomContrast {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        check_factor_range("Contrast", lower, upper)?;
        Ok(Self { lower, upper })
    }
}

impl Default for RandomContrast {
    fn default() -> Self {
        Self {
            lower: 0.5,
            upper: 1.5,
        }
    }
}

impl Transform<DetectionSample, DetectionSample> for RandomContrast {
    fn apply(&self, mut sample: DetectionSample) -> Result<DetectionSample> {
        if coin() {
            let alpha = uniform(self.lower, self.upper);
            sample.image = sample.image * alpha;
        }
        Ok(sample)
    }
}

// ============================================================================
// RandomBrightness
// ============================================================================

/// Adds an offset drawn from `[-delta, delta]` to every pixel, half of the time.
#[derive(Debug, Clone)]
pub struct RandomBrightness {
    delta: f64,
}

impl RandomBrightness {
    pub fn new(delta: f64) -> Result<Self> {
        ensure!(
            (0.0..=255.0).contains(&delta),
            "Brightness delta must be in [0, 255] (got {})",
            delta
        );
        Ok(Self { delta })
    }
}

impl Default for RandomBrightness {
    fn default() -> Self {
        Self { delta: 32.0 }
    }
}

impl Transform<DetectionSample, DetectionSample> for RandomBrightness {
    fn apply(&self, mut sample: DetectionSample) -> Result<DetectionSample> {
        if coin() {
            let delta = uniform(-self.delta, self.delta);
            sample.image = sample.image + delta;
        }
        Ok(sample)
    }
}

// ============================================================================
// RandomSaturation
// ============================================================================

/// Scales the saturation channel of an HSV image by a factor in `[lower, upper]`.
#[derive(Debug, Clone)]
pub struct RandomSaturation {
    lower: f64,
    upper: f64,
}

impl RandomSaturation {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        check_factor_range("Saturation", lower, upper)?;
        Ok(Self { lower, upper })
    }
}

impl Default for RandomSaturation {
    fn default() -> Self {
        Self {
            lower: 0.5,
            upper: 1.5,
        }
    }
}

impl Transform<DetectionSample, DetectionSample> for RandomSaturation {
    fn apply(&self, mut sample: DetectionSample) -> Result<DetectionSample> {
        if coin() {
            let factor = uniform(self.lower, self.upper);
            let image = &sample.image;
            sample.image = Tensor::stack(
                &[image.select(2, 0), image.select(2, 1) * factor, image.select(2, 2)],
                2,
            );
        }
        Ok(sample)
    }
}

// ============================================================================
// RandomHue
// ============================================================================

/// Shifts the hue channel of an HSV image by `[-delta, delta]` degrees and
/// wraps the result back into `[0, 360]`.
#[derive(Debug, Clone)]
pub struct RandomHue {
    delta: f64,
}

impl RandomHue {
    pub fn new(delta: f64) -> Result<Self> {
        ensure!(
            (0.0..=360.0).contains(&delta),
            "Hue delta must be in [0, 360] (got {})",
            delta
        );
        Ok(Self { delta })
    }
}

impl Default for RandomHue {
    fn default() -> Self {
        Self { delta: 18.0 }
    }
}

impl Transform<DetectionSample, DetectionSample> for RandomHue {
    fn apply(&self, mut sample: DetectionSample) -> Result<DetectionSample> {
        if coin() {
            let shift = uniform(-self.delta, self.delta);
            let image = &sample.image;

            let hue = image.select(2, 0) + shift;
            let hue = (&hue - 360.0).where_self(&hue.gt(360.0), &hue);
            let hue = (&hue + 360.0).where_self(&hue.lt(0.0), &hue);

            sample.image = Tensor::stack(&[hue, image.select(2, 1), image.select(2, 2)], 2);
        }
        Ok(sample)
    }
}

// ============================================================================
// ConvertColor
// ============================================================================

/// Converts the image between BGR and HSV. Other pairs are rejected at
/// construction.
#[derive(Debug, Clone)]
pub struct ConvertColor {
    current: ColorSpace,
    target: ColorSpace,
}

impl ConvertColor {
    pub fn new(current: ColorSpace, target: ColorSpace) -> Result<Self> {
        match (current, target) {
            (ColorSpace::Bgr, ColorSpace::Hsv) | (ColorSpace::Hsv, ColorSpace::Bgr) => {
                Ok(Self { current, target })
            }
            _ => bail!(
                "Colour conversion {} -> {} is not implemented",
                current,
                target
            ),
        }
    }

    pub fn bgr_to_hsv() -> Self {
        Self {
            current: ColorSpace::Bgr,
            target: ColorSpace::Hsv,
        }
    }

    pub fn hsv_to_bgr() -> Self {
        Self {
            current: ColorSpace::Hsv,
            target: ColorSpace::Bgr,
        }
    }
}

fn map_pixels(image: &Tensor, kernel: fn(&mut [f32])) -> Result<Tensor> {
    let size = image.size();
    let device = image.device();
    let flat = image
        .to_kind(Kind::Float)
        .to_device(Device::Cpu)
        .flatten(0, -1);
    let mut pixels = Vec::<f32>::try_from(&flat)?;
    kernel(&mut pixels);
    Ok(Tensor::from_slice(&pixels)
        .reshape(size.as_slice())
        .to_device(device))
}

impl Transform<DetectionSample, DetectionSample> for ConvertColor {
    fn apply(&self, mut sample: DetectionSample) -> Result<DetectionSample> {
        let kernel: fn(&mut [f32]) = match (self.current, self.target) {
            (ColorSpace::Bgr, ColorSpace::Hsv) => bgr_to_hsv_inplace,
            _ => hsv_to_bgr_inplace,
        };
        sample.image = map_pixels(&sample.image, kernel)?;
        Ok(sample)
    }
}

// ============================================================================
// RandomLightingNoise
// ============================================================================

/// Channel-permutation noise over the six BGR orderings. Kept as a
/// pass-through: the recipe this crate reproduces never applies the
/// permutation.
#[derive(Debug, Clone, Default)]
pub struct RandomLightingNoise;

impl Transform<DetectionSample, DetectionSample> for RandomLightingNoise {
    fn apply(&self, sample: DetectionSample) -> Result<DetectionSample> {
        Ok(sample)
    }
}

// ============================================================================
// PhotometricDistort
// ============================================================================

/// Brightness, then contrast either before or after a saturation/hue block
/// in HSV space, then lighting noise.
///
/// # Example
/// ```ignore
/// let distort = PhotometricDistort::default();
/// let sample = distort.apply(sample)?;
/// ```
#[derive(Debug)]
pub struct PhotometricDistort {
    brightness: RandomBrightness,
    contrast_first: Compose<DetectionSample>,
    contrast_last: Compose<DetectionSample>,
    lighting_noise: RandomLightingNoise,
}

impl PhotometricDistort {
    pub fn new(
        brightness: RandomBrightness,
        contrast: RandomContrast,
        saturation: RandomSaturation,
        hue: RandomHue,
    ) -> Self {
        let contrast_first = Compose::new()
            .with(contrast.clone())
            .with(ConvertColor::bgr_to_hsv())
            .with(saturation.clone())
            .with(hue.clone())
            .with(ConvertColor::hsv_to_bgr());
        let contrast_last = Compose::new()
            .with(ConvertColor::bgr_to_hsv())
            .with(saturation)
            .with(hue)
            .with(ConvertColor::hsv_to_bgr())
            .with(contrast);
        Self {
            brightness,
            contrast_first,
            contrast_last,
            lighting_noise: RandomLightingNoise,
        }
    }
}

impl Default for PhotometricDistort {
    fn default() -> Self {
        Self::new(
            RandomBrightness::default(),
            RandomContrast::default(),
            RandomSaturation::default(),
            RandomHue::default(),
        )
    }
}

impl Transform<DetectionSample, DetectionSample> for PhotometricDistort {
    fn apply(&self, sample: DetectionSample) -> Result<DetectionSample> {
        let sample = self.brightness.apply(sample)?;
        let sample = if coin() {
            self.contrast_first.apply(sample)?
        } else {
            self.contrast_last.apply(sample)?
        };
        self.lighting_noise.apply(sample)
    }
}

// ============================================================================
// NormalizeAndToRGB
// ============================================================================

/// Casts to float, normalizes with per-channel statistics and reverses the
/// channel order from BGR to RGB.
///
/// # Mathematical Operation:
/// ```text
/// output[h, w, c] = (input[h, w, 2 - c] - mean[2 - c]) / std[2 - c]
/// ```
#[derive(Debug, Clone)]
pub struct NormalizeAndToRGB {
    mean: [f32; 3],
    std: [f32; 3],
}

impl NormalizeAndToRGB {
    pub fn new(mean: [f32; 3], std: [f32; 3]) -> Result<Self> {
        ensure!(
            std.iter().all(|&s| s > 0.0),
            "Normalization std must be positive (got {:?})",
            std
        );
        Ok(Self { mean, std })
    }
}

impl Default for NormalizeAndToRGB {
    fn default() -> Self {
        Self {
            mean: PIXEL_MEAN,
            std: PIXEL_STD,
        }
    }
}

impl Transform<DetectionSample, DetectionSample> for NormalizeAndToRGB {
    fn apply(&self, mut sample: DetectionSample) -> Result<DetectionSample> {
        let device = sample.image.device();
        let mean_t = Tensor::from_slice(&self.mean)
            .reshape(&[1, 1, 3])
            .to_device(device);
        let std_t = Tensor::from_slice(&self.std)
            .reshape(&[1, 1, 3])
            .to_device(device);

        let normalized = (sample.image.to_kind(Kind::Float) - mean_t) / std_t;
        sample.image = normalized.flip(&[2]).contiguous();
        Ok(sample)
    }
}
