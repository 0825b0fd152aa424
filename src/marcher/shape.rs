use crate::marcher::Renderable;
use crate::math::{abs, abs_2d, abs_each, max_each, mul, sub, v, O, V3};

/// Escape radius of the fractal iteration. Every point farther than this from
/// the fractal's center is outside it, provided the power is at least
/// [`MIN_FRACTAL_POWER`].
const ESCAPE_RADIUS: f64 = 2.;
/// Beyond this radius the fractal is treated as its escape sphere.
const BOUND_RADIUS: f64 = 2.5;
const MAX_FRACTAL_ITERATIONS: u32 = 64;
/// Below this the orbit of a point just past [`ESCAPE_RADIUS`] can stay bounded.
const MIN_FRACTAL_POWER: f64 = 2.;
const MAX_FRACTAL_POWER: f64 = 64.;

/// A primitive with a signed distance function. Negative inside, zero on the
/// surface, positive outside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Sphere {
        origin: V3,
        radius: f64,
    },
    Box {
        origin: V3,
        half_extents: V3,
    },
    /// Lies in the XZ plane around `origin`.
    Torus {
        origin: V3,
        major_radius: f64,
        minor_radius: f64,
    },
    /// Mandelbulb of the given `power`, scaled by `radius`.
    Fractal {
        origin: V3,
        iterations: u32,
        radius: f64,
        power: f64,
    },
}

impl Shape {
    pub fn origin(&self) -> V3 {
        match *self {
            Shape::Sphere { origin, .. }
            | Shape::Box { origin, .. }
            | Shape::Torus { origin, .. }
            | Shape::Fractal { origin, .. } => origin,
        }
    }

    pub fn distance(&self, x: &V3) -> f64 {
        match *self {
            Shape::Sphere { origin, radius } => abs(&sub(x, &origin)) - radius,
            Shape::Box {
                origin,
                half_extents,
            } => {
                let q = abs_each(&sub(x, &origin)) - half_extents;
                abs(&max_each(&q, &O)) + q.x.max(q.y.max(q.z)).min(0.)
            }
            Shape::Torus {
                origin,
                major_radius,
                minor_radius,
            } => {
                let p = sub(x, &origin);
                abs_2d(abs_2d(p.x, p.z) - major_radius, p.y) - minor_radius
            }
            Shape::Fractal {
                origin,
                iterations,
                radius,
                power,
            } => {
                let local = mul(1. / radius, &sub(x, &origin));
                mandelbulb(&local, iterations, power) * radius
            }
        }
    }

    /// Checks the invariants `distance` relies on: finite parameters,
    /// non-negative sizes.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.origin().is_finite() {
            return Err("origin must be finite");
        }
        match *self {
            Shape::Sphere { radius, .. } => non_negative(radius, "radius must be non-negative"),
            Shape::Box { half_extents, .. } => {
                non_negative(half_extents.x, "half extents must be non-negative")?;
                non_negative(half_extents.y, "half extents must be non-negative")?;
                non_negative(half_extents.z, "half extents must be non-negative")
            }
            Shape::Torus {
                major_radius,
                minor_radius,
                ..
            } => {
                non_negative(major_radius, "torus radii must be non-negative")?;
                non_negative(minor_radius, "torus radii must be non-negative")
            }
            Shape::Fractal {
                iterations,
                radius,
                power,
                ..
            } => {
                if !(1..=MAX_FRACTAL_ITERATIONS).contains(&iterations) {
                    Err("fractal iterations must be between 1 and 64")
                } else if !(radius.is_finite() && radius > 0.) {
                    Err("fractal radius must be positive")
                } else if !(MIN_FRACTAL_POWER..=MAX_FRACTAL_POWER).contains(&power) {
                    Err("fractal power must be in [2, 64]")
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl Renderable for Shape {
    fn sdf(&self, x: &V3) -> f64 {
        self.distance(x)
    }
}

fn non_negative(value: f64, reason: &'static str) -> Result<(), &'static str> {
    if value.is_finite() && value >= 0. {
        Ok(())
    } else {
        Err(reason)
    }
}

/// Distance estimate for a mandelbulb centered at the origin with unit scale.
fn mandelbulb(p: &V3, iterations: u32, power: f64) -> f64 {
    let start = abs(p);
    if start > BOUND_RADIUS {
        return start - ESCAPE_RADIUS;
    }

    let mut z = *p;
    let mut r = start;
    let mut dr = 1.;
    for _ in 0..iterations {
        if r > ESCAPE_RADIUS || r == 0. {
            break;
        }
        let theta = (z.z / r).clamp(-1., 1.).acos() * power;
        let phi = z.y.atan2(z.x) * power;
        dr = r.powf(power - 1.) * power * dr + 1.;
        let zr = r.powf(power);
        z = zr * v(theta.sin() * phi.cos(), phi.sin() * theta.sin(), theta.cos()) + *p;
        r = abs(&z);
    }

    // The center is a fixed point of the iteration and lies inside.
    if r == 0. {
        return 0.;
    }
    0.5 * r.ln() * r / dr
}
