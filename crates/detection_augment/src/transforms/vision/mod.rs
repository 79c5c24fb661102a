//! src/transforms/vision/mod.rs
//!
//! Vision transforms over [`DetectionSample`](crate::sample::DetectionSample)s.
//!
//! # Module Organization
//!
//! ```text
//! transforms/vision/
//! ├── conversion.rs    → Dtype and box-coordinate conversions, image → tensor
//! ├── photometric.rs   → Brightness, contrast, saturation, hue, normalize
//! ├── color.rs         → BGR <-> HSV pixel kernels
//! ├── geometric.rs     → Resize, pad, expand, mirror
//! ├── crop.rs          → IoU-constrained random crop
//! └── batch.rs         → Batched resize + normalize on the input's device
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use crate::transforms::{Compose, Transform};
//! use crate::transforms::vision::*;
//!
//! let pipeline = Compose::new()
//!     .with(ConvertFromInts)
//!     .with(Resize::new(550, false)?)
//!     .with(Pad::new(550, 550, false)?)
//!     .with(NormalizeAndToRGB::default());
//! ```

pub mod batch;
pub mod color;
pub mod conversion;
pub mod crop;
pub mod geometric;
pub mod photometric;

pub use batch::BatchTransform;
pub use color::ColorSpace;
pub use conversion::{bgr_tensor_from_image, ConvertFromInts, ToAbsoluteCoords, ToPercentCoords};
pub use crop::RandomSampleCrop;
pub use geometric::{Expand, Pad, RandomMirror, Resize};
pub use photometric::{
    ConvertColor, NormalizeAndToRGB, PhotometricDistort, RandomBrightness, RandomContrast,
    RandomHue, RandomLightingNoise, RandomSaturation,
};
