use crate::error::SceneError;
use crate::marcher::shape::Shape;
use crate::marcher::Renderable;
use crate::math::V3;

/// At or below this blend sharpness, shapes are combined with a hard minimum.
pub const HARD_MIN_BELOW: f64 = 0.05;

/// Exponential smooth minimum of `a` and `b` with blend radius `k`.
///
/// Never exceeds `min(a, b)`, and is exactly `min(a, b)` when `k <= 0.05`.
/// Evaluated relative to the smaller argument so that large distances
/// don't overflow the exponentials.
pub fn smooth_min(a: f64, b: f64, k: f64) -> f64 {
    if k <= HARD_MIN_BELOW {
        return a.min(b);
    }
    let m = a.min(b);
    let r = (-(a - m) / k).exp2() + (-(b - m) / k).exp2();
    m - k * r.log2()
}

/// Blends the distances of all `shapes` at `x`, left to right, seeded with the
/// first shape.
pub fn combined_distance(shapes: &[Shape], k: f64, x: &V3) -> Result<f64, SceneError> {
    let (first, rest) = shapes.split_first().ok_or(SceneError::InvalidScene)?;
    Ok(blend(first, rest, k, x))
}

fn blend(first: &Shape, rest: &[Shape], k: f64, x: &V3) -> f64 {
    rest.iter()
        .fold(first.distance(x), |acc, shape| smooth_min(acc, shape.distance(x), k))
}

/// A validated, non-empty set of shapes and the sharpness they are blended with.
///
/// A `Scene` is the immutable snapshot marched during a frame; edits happen on a
/// [`SceneDescription`](crate::config::SceneDescription) and are turned into a
/// new `Scene` between frames.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    shapes: Vec<Shape>,
    k: f64,
}

impl Scene {
    pub fn new(shapes: Vec<Shape>, k: f64) -> Result<Self, SceneError> {
        if shapes.is_empty() {
            return Err(SceneError::InvalidScene);
        }
        if !(k.is_finite() && k >= 0.) {
            return Err(SceneError::InvalidBlend(k));
        }
        for (index, shape) in shapes.iter().enumerate() {
            shape
                .validate()
                .map_err(|reason| SceneError::InvalidShape { index, reason })?;
        }
        Ok(Scene { shapes, k })
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn distance(&self, x: &V3) -> f64 {
        blend(&self.shapes[0], &self.shapes[1..], self.k, x)
    }

    /// Index of the shape whose own surface is closest to `x`. Ties go to the
    /// lower index.
    pub fn nearest_shape(&self, x: &V3) -> usize {
        let mut best = 0;
        let mut best_distance = self.shapes[0].distance(x);
        for (i, shape) in self.shapes.iter().enumerate().skip(1) {
            let d = shape.distance(x);
            if d < best_distance {
                best = i;
                best_distance = d;
            }
        }
        best
    }
}

impl Renderable for Scene {
    fn sdf(&self, x: &V3) -> f64 {
        self.distance(x)
    }
}
