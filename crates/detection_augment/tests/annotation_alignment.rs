//! Masks and boxes must describe the same region after every spatial
//! transform.
//!
//! Boxes here are integer-aligned, so the extent of each binary mask has to
//! match its box exactly after expand, crop and mirror.

mod common;
use common::make_sample;

use detection_augment::{
    seed_augment_rng,
    transforms::vision::{Expand, RandomMirror, RandomSampleCrop},
    BBox, Compose, DetectionSample, Transform,
};

use anyhow::Result;
use tch::Tensor;

/// Pixel extent `[x1, y1, x2, y2)` of a binary mask, `None` when empty.
fn mask_extent(mask: &Tensor) -> Option<BBox> {
    let coords = mask.gt(0.5).nonzero();
    if coords.size()[0] == 0 {
        return None;
    }
    let ys = coords.select(1, 0);
    let xs = coords.select(1, 1);
    Some(BBox::new(
        xs.min().int64_value(&[]) as f32,
        ys.min().int64_value(&[]) as f32,
        (xs.max().int64_value(&[]) + 1) as f32,
        (ys.max().int64_value(&[]) + 1) as f32,
    ))
}

fn assert_aligned(sample: &DetectionSample) {
    assert_eq!(sample.masks_hw(), sample.image_hw());
    assert_eq!(sample.masks.size()[0] as usize, sample.boxes.len());
    for (i, b) in sample.boxes.iter().enumerate() {
        let extent = mask_extent(&sample.masks.get(i as i64));
        assert_eq!(extent, Some(*b), "mask {} disagrees with its box", i);
    }
}

fn integer_sample() -> Result<DetectionSample> {
    make_sample(
        96,
        72,
        vec![
            BBox::new(8.0, 6.0, 40.0, 30.0),
            BBox::new(50.0, 20.0, 90.0, 64.0),
            BBox::new(30.0, 40.0, 60.0, 70.0),
        ],
        vec![2, 5, 9],
        0,
        false,
    )
}

#[test]
fn test_helper_masks_match_boxes() -> Result<()> {
    assert_aligned(&integer_sample()?);
    Ok(())
}

#[test]
fn test_input_image_is_bgr() -> Result<()> {
    let sample = integer_sample()?;
    // Red grows along x; in BGR order it is the last channel.
    let last_col = sample.image.get(0).get(95);
    assert_eq!(last_col.int64_value(&[0]), 128);
    assert_eq!(last_col.int64_value(&[2]), (95 * 255 / 96) as i64);
    Ok(())
}

#[test]
fn test_expand_keeps_masks_on_boxes() -> Result<()> {
    seed_augment_rng(3);
    for _ in 0..12 {
        assert_aligned(&Expand::default().apply(integer_sample()?)?);
    }
    Ok(())
}

#[test]
fn test_mirror_keeps_masks_on_boxes() -> Result<()> {
    seed_augment_rng(4);
    for _ in 0..6 {
        assert_aligned(&RandomMirror.apply(integer_sample()?)?);
    }
    Ok(())
}

#[test]
fn test_crop_keeps_masks_on_boxes() -> Result<()> {
    seed_augment_rng(5);
    for _ in 0..24 {
        let out = RandomSampleCrop::new().apply(integer_sample()?)?;
        assert!(!out.boxes.is_empty());
        assert_aligned(&out);
    }
    Ok(())
}

#[test]
fn test_spatial_chain_keeps_masks_on_boxes() -> Result<()> {
    seed_augment_rng(6);
    let spatial = Compose::new()
        .with(Expand::default())
        .with(RandomSampleCrop::new())
        .with(RandomMirror);
    for _ in 0..24 {
        let out = spatial.apply(integer_sample()?)?;
        assert_aligned(&out);
        assert_eq!(out.labels.len(), out.boxes.len());
    }
    Ok(())
}
