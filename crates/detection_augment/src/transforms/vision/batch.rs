use crate::config::{PIXEL_MEAN, PIXEL_STD};
use crate::transforms::Transform;
use anyhow::{anyhow, ensure, Context, Result};
use std::sync::Mutex;
use tch::{Device, Kind, Tensor};

/// Mean/std buffers shaped `[1, 3, 1, 1]`, resident on `device`.
#[derive(Debug)]
struct NormStats {
    device: Device,
    mean: Tensor,
    std: Tensor,
}

/// Resize + normalize + BGR→RGB for a whole batch, on the batch's own device.
///
/// Input is a `[N, H, W, C]` BGR tensor of any numeric kind. Output is a
/// `[N, C, size, size]` RGB `Float` tensor. Only the pixels are touched:
/// use this for inference, where ground truth never needs resizing.
///
/// The normalization constants are moved to the input's device on first use
/// and cached; a batch on another device replaces the cache.
///
/// # Example
/// ```ignore
/// let batch_tf = BatchTransform::new(550)?;
/// let pixels = batch_tf.apply(frames.to_device(Device::Cuda(0)))?;
/// ```
#[derive(Debug)]
pub struct BatchTransform {
    img_size: i64,
    mean: [f32; 3],
    std: [f32; 3],
    stats: Mutex<Option<NormStats>>,
}

impl BatchTransform {
    pub fn new(img_size: i64) -> Result<Self> {
        Self::with_stats(img_size, PIXEL_MEAN, PIXEL_STD)
    }

    pub fn with_stats(img_size: i64, mean: [f32; 3], std: [f32; 3]) -> Result<Self> {
        ensure!(img_size > 0, "Batch target size must be positive (got {})", img_size);
        ensure!(
            std.iter().all(|&s| s > 0.0),
            "Normalization std must be positive (got {:?})",
            std
        );
        Ok(Self {
            img_size,
            mean,
            std,
            stats: Mutex::new(None),
        })
    }

    /// Returns `(mean, std)` on `device`, migrating the cached copy if needed.
    fn stats_on(&self, device: Device) -> Result<(Tensor, Tensor)> {
        let mut guard = self
            .stats
            .lock()
            .map_err(|_| anyhow!("Batch normalization cache lock poisoned"))?;

        let stale = guard.as_ref().map_or(true, |s| s.device != device);
        if stale {
            log::debug!("moving batch normalization constants to {:?}", device);
            let to_buffer = |values: &[f32; 3]| {
                Tensor::from_slice(values)
                    .reshape(&[1, 3, 1, 1])
                    .to_device(device)
            };
            *guard = Some(NormStats {
                device,
                mean: to_buffer(&self.mean),
                std: to_buffer(&self.std),
            });
        }

        let stats = guard
            .as_ref()
            .context("Batch normalization cache is empty")?;
        Ok((stats.mean.shallow_clone(), stats.std.shallow_clone()))
    }
}

impl Transform<Tensor, Tensor> for BatchTransform {
    fn apply(&self, batch: Tensor) -> Result<Tensor> {
        let (_n, _h, _w, channels) = batch
            .size4()
            .context("Batch input must be a 4D tensor [N, H, W, C]")?;
        ensure!(
            channels == 3,
            "Batch input must have 3 channels (got {})",
            channels
        );

        let (mean, std) = self.stats_on(batch.device())?;
        let resized = batch
            .to_kind(Kind::Float)
            .permute(&[0, 3, 1, 2])
            .contiguous()
            .upsample_bilinear2d(
                &[self.img_size, self.img_size],
                false,
                None::<f64>,
                None::<f64>,
            );

        Ok(((resized - mean) / std).flip(&[1]).contiguous())
    }
}
