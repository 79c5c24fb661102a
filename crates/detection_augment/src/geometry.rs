//! Axis-aligned box primitives.

/// Axis-aligned rectangle stored as `(x1, y1, x2, y2)`.
///
/// Whether the coordinates are absolute pixels or fractions of the image
/// size depends on where the box sits in a pipeline; see the individual
/// transforms for which space they expect.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Signed area. Inverted boxes give a negative value.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Multiplies x coordinates by `sx` and y coordinates by `sy`.
    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        Self::new(self.x1 * sx, self.y1 * sy, self.x2 * sx, self.y2 * sy)
    }
}

impl From<[f32; 4]> for BBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Overlap area of every box in `boxes` with `reference`, clamped at zero.
pub fn intersect(boxes: &[BBox], reference: &BBox) -> Vec<f32> {
    boxes
        .iter()
        .map(|b| {
            let w = (b.x2.min(reference.x2) - b.x1.max(reference.x1)).max(0.0);
            let h = (b.y2.min(reference.y2) - b.y1.max(reference.y1)).max(0.0);
            w * h
        })
        .collect()
}

/// Jaccard overlap (IoU) of every box in `boxes` with `reference`.
///
/// The union is not guarded: a zero-area `reference` against a zero-area
/// box produces NaN.
pub fn jaccard(boxes: &[BBox], reference: &BBox) -> Vec<f32> {
    let area_ref = reference.area();
    intersect(boxes, reference)
        .into_iter()
        .zip(boxes)
        .map(|(inter, b)| inter / (b.area() + area_ref - inter))
        .collect()
}
