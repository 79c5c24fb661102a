use anyhow::{Context, Result};
use std::any::type_name;
use std::marker::PhantomData;

/// Defines the core `Transform` trait for composable augmentation pipelines.
///
/// A `Transform<I, O>` is an immutable configuration value exposing one
/// operation from `I` to `O`. Steps can be chained with `.then(...)` into a
/// statically typed pipeline, or collected into a [`Compose`] when the
/// sequence is built at runtime.
///
/// Note: `then()` works only when:
/// 1. **Types align**: `self: Transform<I, O>`, `next: Transform<O, M>`
/// 2. **Owned**: `Self::Sized` (no trait objects, must be concrete)
/// 3. **Thread-safe**: intermediate and output types must be `Send`
pub trait Transform<I, O>: Send + Sync {
    /// Applies the transformation to the input
    fn apply(&self, input: I) -> Result<O>;

    #[inline]
    fn then<T, M>(self, next: T) -> Chain<Self, T, O>
    where
        Self: Sized,
        T: Transform<O, M>,
        O: Send,
        M: Send,
    {
        Chain {
            first: self,
            second: next,
            _marker: PhantomData,
        }
    }
}

/// Two transforms run back to back, built with [`Transform::then`].
///
/// Unlike [`Compose`], the stages may change the value's type, so a chain can
/// end in something other than a sample (a count, a tensor, ...).
/// `PhantomData<M>` pins the intermediate type.
#[derive(Debug)]
pub struct Chain<A, B, M> {
    first: A,
    second: B,
    _marker: PhantomData<fn() -> M>,
}

impl<I, M, O, A, B> Transform<I, O> for Chain<A, B, M>
where
    A: Transform<I, M>,
    B: Transform<M, O>,
    M: Send,
{
    fn apply(&self, input: I) -> Result<O> {
        self.first
            .apply(input)
            .and_then(|mid| self.second.apply(mid))
            .with_context(|| {
                format!(
                    "Transform chain failed: {} → {} → {}",
                    type_name::<A>(),
                    type_name::<B>(),
                    type_name::<O>()
                )
            })
    }
}

struct Stage<T> {
    name: &'static str,
    transform: Box<dyn Transform<T, T>>,
}

/// An ordered list of same-typed transforms applied as a sequential fold.
///
/// Each stage remembers its concrete type name so a failure reports which
/// step of the pipeline raised it.
///
/// # Example
/// ```ignore
/// let pipeline = Compose::new()
///     .with(ConvertFromInts)
///     .with(Resize::new(550, false)?)
///     .with(NormalizeAndToRGB::default());
/// let out = pipeline.apply(sample)?;
/// ```
pub struct Compose<T> {
    stages: Vec<Stage<T>>,
}

impl<T> Default for Compose<T> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<T> Compose<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage to the end of the pipeline.
    pub fn with<S>(mut self, transform: S) -> Self
    where
        S: Transform<T, T> + 'static,
    {
        self.stages.push(Stage {
            name: type_name::<S>(),
            transform: Box::new(transform),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Type names of the stages, in application order.
    pub fn stage_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(|s| s.name)
    }
}

impl<T> std::fmt::Debug for Compose<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.stage_names()).finish()
    }
}

impl<T: Send> Transform<T, T> for Compose<T> {
    fn apply(&self, input: T) -> Result<T> {
        self.stages
            .iter()
            .enumerate()
            .try_fold(input, |acc, (index, stage)| {
                log::trace!("applying stage {} ({})", index, stage.name);
                stage
                    .transform
                    .apply(acc)
                    .with_context(|| format!("Stage {} ({}) failed", index, stage.name))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;
    use anyhow::anyhow;

    struct Shift(f32);
    impl Transform<Vec<BBox>, Vec<BBox>> for Shift {
        fn apply(&self, boxes: Vec<BBox>) -> Result<Vec<BBox>> {
            Ok(boxes.iter().map(|b| b.translate(self.0, self.0)).collect())
        }
    }

    struct CountBoxes;
    impl Transform<Vec<BBox>, usize> for CountBoxes {
        fn apply(&self, boxes: Vec<BBox>) -> Result<usize> {
            Ok(boxes.len())
        }
    }

    struct Reject;
    impl Transform<Vec<BBox>, Vec<BBox>> for Reject {
        fn apply(&self, _: Vec<BBox>) -> Result<Vec<BBox>> {
            Err(anyhow!("rejected"))
        }
    }

    fn unit_boxes() -> Vec<BBox> {
        vec![BBox::new(0.0, 0.0, 1.0, 1.0), BBox::new(1.0, 1.0, 2.0, 2.0)]
    }

    #[test]
    fn test_pipeline_construction_using_then() -> Result<()> {
        let pipeline = Shift(1.0).then(CountBoxes);
        assert_eq!(pipeline.apply(unit_boxes())?, 2);
        Ok(())
    }

    #[test]
    fn test_pipeline_chain_error_context() {
        let chain = Shift(1.0).then(Reject);
        let msg = format!("{:#}", chain.apply(unit_boxes()).unwrap_err());
        assert!(msg.contains("Transform chain failed"));
        assert!(msg.contains("Shift"));
        assert!(msg.contains("Reject"));
    }

    #[test]
    fn test_compose_applies_in_order() -> Result<()> {
        let pipeline = Compose::new().with(Shift(1.0)).with(Shift(2.5));
        assert_eq!(pipeline.len(), 2);
        let out = pipeline.apply(unit_boxes())?;
        assert_eq!(out[0], BBox::new(3.5, 3.5, 4.5, 4.5));
        Ok(())
    }

    #[test]
    fn test_compose_reports_failing_stage() {
        let pipeline = Compose::new().with(Shift(1.0)).with(Reject);
        let msg = format!("{:#}", pipeline.apply(unit_boxes()).unwrap_err());
        assert!(msg.contains("Stage 1"));
        assert!(msg.contains("Reject"));
        assert!(msg.contains("rejected"));
    }

    #[test]
    fn test_empty_compose_is_identity() -> Result<()> {
        let pipeline: Compose<Vec<BBox>> = Compose::new();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.apply(unit_boxes())?, unit_boxes());
        Ok(())
    }
}
