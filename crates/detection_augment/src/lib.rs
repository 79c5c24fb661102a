pub mod config;
pub mod geometry;
pub mod presets;
pub mod rng;
pub mod sample;
pub mod transforms;

pub use config::{AugmentConfig, AugmentConfigBuilder, PIXEL_MEAN, PIXEL_STD};
pub use geometry::{intersect, jaccard, BBox};
pub use presets::{TrainAugmentation, ValAugmentation};
pub use rng::{clear_augment_rng, seed_augment_rng};
pub use sample::{DetectionSample, LabelBundle};
pub use transforms::{Chain, Compose, Transform};
