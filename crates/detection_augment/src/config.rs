//! src/config.rs
//!
//! Configuration shared by the augmentation presets.
//!
//! Example:
//! ```ignore
//! let config = AugmentConfig::builder()
//!     .img_size(550)
//!     .seed(42)
//!     .max_crop_modes(64)
//!     .build()?;
//! let train = TrainAugmentation::new(&config)?;
//! ```

use anyhow::{ensure, Result};

/// Per-channel pixel mean of the training set, BGR order.
pub const PIXEL_MEAN: [f32; 3] = [103.94, 116.78, 123.68];

/// Per-channel pixel standard deviation of the training set, BGR order.
pub const PIXEL_STD: [f32; 3] = [57.38, 57.12, 58.40];

/// Configuration for the augmentation presets
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentConfig {
    /// Side length of the square network input
    pub img_size: i64,
    /// Background fill and normalization mean (BGR)
    pub pixel_mean: [f32; 3],
    /// Normalization standard deviation (BGR)
    pub pixel_std: [f32; 3],
    /// Upper bound on crop modes drawn per sample. `None` keeps the search
    /// unbounded.
    pub max_crop_modes: Option<usize>,
    /// Seed for the augmentation RNG.
    ///
    /// Applied once, when a `TrainAugmentation` is built, and only to the
    /// thread that builds it: each construction restarts that thread's
    /// stream. Worker threads seed themselves with `seed_augment_rng`.
    /// `ValAugmentation` draws no random numbers and ignores it.
    pub seed: Option<u64>,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            img_size: 550,
            pixel_mean: PIXEL_MEAN,
            pixel_std: PIXEL_STD,
            max_crop_modes: None,
            seed: None,
        }
    }
}

impl AugmentConfig {
    pub fn builder() -> AugmentConfigBuilder {
        AugmentConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.img_size > 0,
            "Image size must be positive (got {})",
            self.img_size
        );
        ensure!(
            self.pixel_std.iter().all(|&s| s > 0.0),
            "Pixel standard deviation must be positive (got {:?})",
            self.pixel_std
        );
        if let Some(max_modes) = self.max_crop_modes {
            ensure!(max_modes > 0, "max_crop_modes must be at least 1");
        }
        Ok(())
    }
}

/// Builder for AugmentConfig with method chaining
#[derive(Default)]
pub struct AugmentConfigBuilder {
    config: AugmentConfig,
}

impl AugmentConfigBuilder {
    /// Set the square target size (must be > 0)
    pub fn img_size(mut self, size: i64) -> Self {
        self.config.img_size = size;
        self
    }

    /// Override the BGR pixel mean
    pub fn pixel_mean(mut self, mean: [f32; 3]) -> Self {
        self.config.pixel_mean = mean;
        self
    }

    /// Override the BGR pixel standard deviation
    pub fn pixel_std(mut self, std: [f32; 3]) -> Self {
        self.config.pixel_std = std;
        self
    }

    /// Cap the number of crop modes tried per sample.
    ///
    /// Once the cap is reached the crop leaves the sample untouched. This
    /// changes the sampling distribution of the recipe, so it is off unless
    /// requested.
    pub fn max_crop_modes(mut self, max_modes: usize) -> Self {
        self.config.max_crop_modes = Some(max_modes);
        self
    }

    /// Seed the augmentation RNG of the thread that builds the training preset.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Validate and build the final configuration.
    pub fn build(self) -> Result<AugmentConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
