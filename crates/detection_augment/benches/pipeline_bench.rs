use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use detection_augment::{
    seed_augment_rng,
    transforms::vision::{BatchTransform, RandomSampleCrop, ToAbsoluteCoords},
    AugmentConfig, BBox, DetectionSample, LabelBundle, TrainAugmentation, Transform,
    ValAugmentation,
};
use tch::{Device, Kind, Tensor};

/// Benchmarks for the per-sample presets and the batched inference path.
///
/// To run these, use:
/// ```bash
/// cargo bench --bench pipeline_bench
/// ```

/// Target sizes swept by every benchmark.
const SIZES: [i64; 3] = [300, 550, 700];

/// A 480x640 sample with `n` instances spread over the image, boxes in
/// percent coordinates.
fn make_sample(n: usize) -> DetectionSample {
    let (h, w) = (480i64, 640i64);
    let image = Tensor::randint(256, &[h, w, 3], (Kind::Uint8, Device::Cpu));
    let masks = Tensor::zeros(&[n as i64, h, w], (Kind::Float, Device::Cpu));
    let boxes = (0..n)
        .map(|i| {
            let offset = 0.6 * i as f32 / n.max(1) as f32;
            BBox::new(offset, offset, offset + 0.3, offset + 0.4)
        })
        .collect();
    let labels = LabelBundle::new((0..n as i64).collect(), 0).unwrap();
    DetectionSample::new(image, masks, boxes, labels).unwrap()
}

fn config(size: i64) -> AugmentConfig {
    AugmentConfig::builder().img_size(size).build().unwrap()
}

/// Deterministic eval pipeline, pixels only.
fn bench_val(c: &mut Criterion) {
    let mut group = c.benchmark_group("ValAugmentation");
    let sample = make_sample(4);
    for &size in &SIZES {
        let val = ValAugmentation::new(&config(size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &sample, |b, s| {
            b.iter(|| black_box(val.apply(s.clone()).unwrap()))
        });
    }
    group.finish();
}

/// Full training recipe, including the HSV round trip and the crop search.
fn bench_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("TrainAugmentation");
    group.sample_size(20);
    seed_augment_rng(0);
    for &instances in &[1usize, 8, 32] {
        let sample = make_sample(instances);
        let train = TrainAugmentation::new(&config(550)).unwrap();
        group.bench_with_input(
            BenchmarkId::new("instances", instances),
            &sample,
            |b, s| b.iter(|| black_box(train.apply(s.clone()).unwrap())),
        );
    }
    group.finish();
}

/// Crop search alone, as the instance count grows.
fn bench_crop(c: &mut Criterion) {
    let mut group = c.benchmark_group("RandomSampleCrop");
    seed_augment_rng(1);
    let crop = ToAbsoluteCoords.then(RandomSampleCrop::new());
    for &instances in &[1usize, 8, 32] {
        let sample = make_sample(instances);
        group.bench_with_input(
            BenchmarkId::new("instances", instances),
            &sample,
            |b, s| b.iter(|| black_box(crop.apply(s.clone()).unwrap())),
        );
    }
    group.finish();
}

/// Batched resize + normalize for inference.
fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("BatchTransform");
    for &batch_size in &[1i64, 8] {
        let batch = Tensor::randint(256, &[batch_size, 480, 640, 3], (Kind::Uint8, Device::Cpu));
        let tf = BatchTransform::new(550).unwrap();
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(BenchmarkId::new("batch", batch_size), &batch, |b, t| {
            b.iter(|| black_box(tf.apply(t.shallow_clone()).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_val, bench_train, bench_crop, bench_batch);
criterion_main!(benches);
