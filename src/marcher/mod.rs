use crate::math::{add, mul, V3};

pub mod camera;
pub mod scene;
pub mod shape;

pub use camera::{Axis, Camera};
pub use scene::{combined_distance, smooth_min, Scene};
pub use shape::Shape;

/// `sdf` must be a pure function of `x`: it is called from many rays at once.
pub trait Renderable {
    fn sdf(&self, x: &V3) -> f64;
}

pub const DEFAULT_MAX_STEPS: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarchLimits {
    /// Total distance after which a ray counts as escaped.
    pub clip_distance: f64,
    /// A step shorter than this ends the march on a surface.
    pub hit_threshold: f64,
    /// Upper bound on steps, for distance functions that never converge.
    pub max_steps: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RayState {
    pub pixel: (u32, u32),
    pub origin: V3,
    pub direction: V3,
    pub total_distance: f64,
    pub steps: u32,
}

impl RayState {
    pub fn new(pixel: (u32, u32), origin: V3, direction: V3) -> Self {
        RayState {
            pixel,
            origin,
            direction,
            total_distance: 0.,
            steps: 0,
        }
    }

    pub fn advance(&mut self, length: f64) {
        self.origin = add(&self.origin, &mul(length, &self.direction));
        self.total_distance += length;
        self.steps += 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anomaly {
    /// Ran out of steps without converging or escaping.
    StepLimit,
    /// The distance function produced NaN.
    NonFinite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Hit,
    Miss,
    /// The march was abandoned; presented as a miss.
    Aborted(Anomaly),
}

impl Termination {
    pub fn is_hit(self) -> bool {
        self == Termination::Hit
    }
}

/// Sphere traces `ray` through `r` until it reaches a surface or the clip distance.
///
/// Stepping into the inside of a shape counts as a hit straight away. A ray
/// that has travelled exactly the clip distance also counts as a hit; only
/// going past it is a miss.
pub fn march(ray: &mut RayState, r: &impl Renderable, limits: &MarchLimits) -> Termination {
    let mut sdf = limits.hit_threshold;
    while ray.total_distance < limits.clip_distance && sdf >= limits.hit_threshold {
        if ray.steps >= limits.max_steps {
            return Termination::Aborted(Anomaly::StepLimit);
        }
        sdf = r.sdf(&ray.origin);
        if sdf.is_nan() {
            return Termination::Aborted(Anomaly::NonFinite);
        }
        if sdf < 0. {
            return Termination::Hit;
        }
        ray.advance(sdf);
    }

    if ray.total_distance > limits.clip_distance {
        Termination::Miss
    } else {
        Termination::Hit
    }
}
