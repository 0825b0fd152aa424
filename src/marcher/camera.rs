use std::f64::consts::PI;

use rayon::prelude::*;

use crate::error::SceneError;
use crate::marcher::{MarchLimits, RayState};
use crate::math::{add, cross, dot, mul, normalize, rotate_about_axis, try_normalize, V3, B1, B2};

/// Reference up vector used to build the camera basis.
pub const WORLD_UP: V3 = B2;
/// Direction a camera faces when it has nowhere better to look.
pub const DEFAULT_DIRECTION: V3 = V3 {
    x: 0.,
    y: 0.,
    z: -1.,
};
/// Beyond this `|forward · WORLD_UP|` the basis is built from +X instead.
const PARALLEL_LIMIT: f64 = 0.999;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// About the world Y axis.
    Yaw,
    /// About the camera's right axis.
    Pitch,
}

/// A pinhole camera. `direction` is kept at unit length.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub origin: V3,
    direction: V3,
    /// Vertical field of view in radians.
    pub fov: f64,
    pub clip_distance: f64,
    pub hit_threshold: f64,
    pub move_speed: f64,
    pub rotation_speed: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            origin: V3 {
                x: 0.,
                y: 0.,
                z: 5.,
            },
            direction: DEFAULT_DIRECTION,
            fov: PI / 2.5,
            clip_distance: 100.,
            hit_threshold: 0.001,
            move_speed: 0.1,
            rotation_speed: 0.02,
        }
    }
}

impl Camera {
    pub fn new(
        origin: V3,
        direction: V3,
        fov: f64,
        clip_distance: f64,
        hit_threshold: f64,
    ) -> Result<Self, SceneError> {
        let mut camera = Camera {
            origin,
            fov,
            clip_distance,
            hit_threshold,
            ..Camera::default()
        };
        camera.validate()?;
        camera.set_direction(direction);
        Ok(camera)
    }

    /// Checks the settings marching depends on. Needed again after writing to
    /// the public fields directly.
    pub fn validate(&self) -> Result<(), SceneError> {
        if !self.origin.is_finite() {
            return Err(SceneError::InvalidCamera("origin must be finite"));
        }
        if !(self.fov > 0. && self.fov < PI) {
            return Err(SceneError::InvalidCamera(
                "field of view must be between 0 and pi",
            ));
        }
        if !(self.clip_distance.is_finite() && self.clip_distance > 0.) {
            return Err(SceneError::InvalidCamera("clip distance must be positive"));
        }
        if !(self.hit_threshold.is_finite() && self.hit_threshold > 0.) {
            return Err(SceneError::InvalidCamera("hit threshold must be positive"));
        }
        if !(self.move_speed.is_finite() && self.rotation_speed.is_finite()) {
            return Err(SceneError::InvalidCamera("speeds must be finite"));
        }
        Ok(())
    }

    pub fn direction(&self) -> V3 {
        self.direction
    }

    /// Points the camera along `direction`. A direction with no usable length
    /// resets the camera to [`DEFAULT_DIRECTION`].
    pub fn set_direction(&mut self, direction: V3) {
        self.direction = match try_normalize(&direction) {
            Some(d) => d,
            None => {
                tracing::warn!(?direction, "degenerate camera direction, resetting to default");
                DEFAULT_DIRECTION
            }
        };
    }

    pub fn forward(&self) -> V3 {
        normalize(&self.direction)
    }

    pub fn world_up(&self) -> V3 {
        if dot(&self.forward(), &WORLD_UP).abs() > PARALLEL_LIMIT {
            B1
        } else {
            WORLD_UP
        }
    }

    pub fn right(&self) -> V3 {
        normalize(&cross(&self.world_up(), &self.forward()))
    }

    pub fn up(&self) -> V3 {
        cross(&self.forward(), &self.right())
    }

    pub fn rotate(&mut self, axis: Axis, amount: f64) {
        let angle = amount * self.rotation_speed;
        let rotated = match axis {
            Axis::Yaw => rotate_about_axis(&self.direction, &WORLD_UP, angle),
            Axis::Pitch => {
                let mut d = rotate_about_axis(&self.direction, &self.right(), angle);
                d.y = d.y.clamp(-1., 1.);
                d
            }
        };
        self.set_direction(rotated);
    }

    /// Moves relative to the view: `delta.x` along right, `delta.z` backwards,
    /// `delta.y` straight up in world space. Returns whether anything moved.
    pub fn move_by(&mut self, delta: V3) -> bool {
        if delta.is_zero() {
            return false;
        }
        let mut step = add(&mul(delta.x, &self.right()), &mul(-delta.z, &self.forward()));
        step.y += delta.y;
        self.origin = add(&self.origin, &mul(self.move_speed, &step));
        true
    }

    /// One ray per pixel, in row-major order, each starting at the camera origin.
    pub fn generate_rays(&self, width: u32, height: u32) -> Vec<RayState> {
        if width == 0 || height == 0 {
            return Vec::new();
        }
        let aspect = f64::from(width) / f64::from(height);
        let half_height = (self.fov / 2.).tan();
        let half_width = aspect * half_height;
        let (forward, right, up) = (self.forward(), self.right(), self.up());
        let origin = self.origin;

        let count = width as usize * height as usize;
        (0..count)
            .into_par_iter()
            .map(move |i| ((i % width as usize) as u32, (i / width as usize) as u32))
            .map(move |(x, y)| {
                let u = (f64::from(x) + 0.5) / f64::from(width);
                let v = (f64::from(y) + 0.5) / f64::from(height);
                let ndc_x = (2. * u - 1.) * half_width;
                let ndc_y = (1. - 2. * v) * half_height;
                let direction = normalize(&(forward + ndc_x * right + ndc_y * up));
                RayState::new((x, y), origin, direction)
            })
            .collect()
    }

    pub fn march_limits(&self, max_steps: u32) -> MarchLimits {
        MarchLimits {
            clip_distance: self.clip_distance,
            hit_threshold: self.hit_threshold,
            max_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{abs, dist, v, B3, O};

    fn assert_close(a: &V3, b: &V3, tolerance: f64) {
        assert!(dist(a, b) < tolerance, "{a:?} != {b:?}");
    }

    fn assert_orthonormal(camera: &Camera) {
        let (f, r, u) = (camera.forward(), camera.right(), camera.up());
        for axis in [f, r, u] {
            assert!((abs(&axis) - 1.).abs() < 1e-9, "{axis:?}");
        }
        assert!(dot(&f, &r).abs() < 1e-9);
        assert!(dot(&f, &u).abs() < 1e-9);
        assert!(dot(&r, &u).abs() < 1e-9);
    }

    #[test]
    fn default_basis() {
        let camera = Camera::default();
        assert_close(&camera.forward(), &-B3, 1e-12);
        assert_close(&camera.right(), &-B1, 1e-12);
        assert_close(&camera.up(), &B2, 1e-12);
    }

    #[test]
    fn looking_straight_up_uses_alternate_world_up() {
        let mut camera = Camera::default();
        camera.set_direction(B2);
        assert_eq!(camera.world_up(), B1);
        assert_orthonormal(&camera);

        camera.set_direction(v(0., -1., 0.0001));
        assert_eq!(camera.world_up(), B1);
        assert_orthonormal(&camera);
    }

    #[test]
    fn zero_direction_resets() {
        let mut camera = Camera::default();
        camera.set_direction(v(1., 0., 0.));
        camera.set_direction(O);
        assert_eq!(camera.direction(), DEFAULT_DIRECTION);
        camera.set_direction(v(f64::NAN, 1., 0.));
        assert_eq!(camera.direction(), DEFAULT_DIRECTION);
    }

    #[test]
    fn direction_is_normalized() {
        let camera = Camera::new(O, v(0., 3., -4.), 1., 50., 0.01).unwrap();
        assert_close(&camera.direction(), &v(0., 0.6, -0.8), 1e-12);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(Camera::new(O, B3, 0., 10., 0.01).is_err());
        assert!(Camera::new(O, B3, PI, 10., 0.01).is_err());
        assert!(Camera::new(O, B3, 1., 0., 0.01).is_err());
        assert!(Camera::new(O, B3, 1., 10., -0.01).is_err());
        assert!(Camera::new(v(f64::NAN, 0., 0.), B3, 1., 10., 0.01).is_err());
    }

    #[test]
    fn field_writes_are_caught_by_validate() {
        assert_eq!(Camera::default().validate(), Ok(()));
        for clip in [f64::NAN, 0., -5., f64::INFINITY] {
            let mut camera = Camera::default();
            camera.clip_distance = clip;
            assert!(camera.validate().is_err(), "{clip}");
        }
        let mut camera = Camera::default();
        camera.hit_threshold = f64::NAN;
        assert!(camera.validate().is_err());
        let mut camera = Camera::default();
        camera.rotation_speed = f64::INFINITY;
        assert!(camera.validate().is_err());
    }

    #[test]
    fn yaw_turns_about_world_y() {
        let mut camera = Camera::default();
        camera.rotation_speed = 1.;
        camera.rotate(Axis::Yaw, std::f64::consts::FRAC_PI_2);
        assert_close(&camera.direction(), &-B1, 1e-12);
    }

    #[test]
    fn rotation_is_scaled_by_speed() {
        let mut camera = Camera::default();
        camera.rotate(Axis::Yaw, 10.);
        // 10 * 0.02 radians
        assert!((dot(&camera.direction(), &-B3) - 0.2f64.cos()).abs() < 1e-12);
    }

    #[test]
    fn pitch_turns_about_right_axis() {
        let mut camera = Camera::default();
        camera.rotation_speed = 1.;
        // Right is -X, so a positive turn tips -Z towards -Y.
        camera.rotate(Axis::Pitch, 0.3);
        assert!((camera.direction().y + 0.3f64.sin()).abs() < 1e-12);
        assert!(camera.direction().x.abs() < 1e-12);
        assert_orthonormal(&camera);
    }

    #[test]
    fn pitching_past_vertical_stays_in_range() {
        let mut camera = Camera::default();
        camera.rotation_speed = 0.1;
        for _ in 0..200 {
            camera.rotate(Axis::Pitch, 1.);
            let d = camera.direction();
            assert!((-1. ..=1.).contains(&d.y), "{d:?}");
            assert!((abs(&d) - 1.).abs() < 1e-9);
        }
        for _ in 0..200 {
            camera.rotate(Axis::Pitch, -1.);
            assert!((-1. ..=1.).contains(&camera.direction().y));
        }
    }

    #[test]
    fn move_is_relative_to_view() {
        let mut camera = Camera::default();
        camera.move_speed = 1.;
        // Forward is -Z, so a negative z delta moves forward.
        assert!(camera.move_by(v(0., 0., -1.)));
        assert_close(&camera.origin, &v(0., 0., 4.), 1e-12);
        assert!(camera.move_by(v(1., 0., 0.)));
        assert_close(&camera.origin, &v(-1., 0., 4.), 1e-12);
        assert!(camera.move_by(v(0., 2., 0.)));
        assert_close(&camera.origin, &v(-1., 2., 4.), 1e-12);
    }

    #[test]
    fn move_is_scaled_by_speed() {
        let mut camera = Camera::default();
        camera.move_by(v(0., 1., 0.));
        assert_close(&camera.origin, &v(0., 0.1, 5.), 1e-12);
    }

    #[test]
    fn zero_move_is_a_no_op() {
        let mut camera = Camera::default();
        let before = camera.clone();
        assert!(!camera.move_by(O));
        assert_eq!(camera, before);
    }

    #[test]
    fn one_unit_ray_per_pixel() {
        let mut camera = Camera::default();
        camera.set_direction(v(0.3, -0.2, -1.));
        let rays = camera.generate_rays(16, 9);
        assert_eq!(rays.len(), 16 * 9);
        for (i, ray) in rays.iter().enumerate() {
            assert_eq!(ray.pixel, ((i % 16) as u32, (i / 16) as u32));
            assert!((abs(&ray.direction) - 1.).abs() < 1e-12);
            assert_eq!(ray.origin, camera.origin);
            assert_eq!(ray.total_distance, 0.);
            assert_eq!(ray.steps, 0);
        }
    }

    #[test]
    fn center_pixel_looks_forward() {
        let mut camera = Camera::default();
        camera.set_direction(v(-0.4, 0.5, 0.2));
        let rays = camera.generate_rays(5, 3);
        let center = &rays[5 + 2];
        assert_eq!(center.pixel, (2, 1));
        assert_close(&center.direction, &camera.forward(), 1e-3);
    }

    #[test]
    fn corners_follow_the_field_of_view() {
        let camera = Camera::default();
        let rays = camera.generate_rays(2, 2);
        // Top-left pixel points up and to the camera's left (+X).
        let top_left = rays[0].direction;
        assert!(top_left.x > 0. && top_left.y > 0. && top_left.z < 0.);
        let bottom_right = rays[3].direction;
        assert!(bottom_right.x < 0. && bottom_right.y < 0.);
        assert!((top_left.y + bottom_right.y).abs() < 1e-12);
    }

    #[test]
    fn empty_viewport_has_no_rays() {
        assert!(Camera::default().generate_rays(0, 10).is_empty());
    }
}
