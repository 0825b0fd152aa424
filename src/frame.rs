//! Per-frame driving of the marcher: input, scene commits, and the parallel pass
//! over every pixel.

use rayon::prelude::*;

use crate::config::SceneDescription;
use crate::error::SceneError;
use crate::marcher::{march, Anomaly, Axis, Camera, Scene, Termination, DEFAULT_MAX_STEPS};
use crate::math::V3;

/// Tunables that stay fixed for the duration of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSettings {
    pub width: u32,
    pub height: u32,
    /// Fraction of the output resolution that is actually marched.
    pub res_scale: f64,
    pub max_steps: u32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        FrameSettings {
            width: 800,
            height: 600,
            res_scale: 0.5,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl FrameSettings {
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.width == 0 || self.height == 0 {
            Err(SceneError::InvalidSettings("output size must be non-zero"))
        } else if !(self.res_scale > 0. && self.res_scale <= 1.) {
            Err(SceneError::InvalidSettings(
                "resolution scale must be in (0, 1]",
            ))
        } else if self.max_steps == 0 {
            Err(SceneError::InvalidSettings("max steps must be non-zero"))
        } else {
            Ok(())
        }
    }

    /// Size of the marched image, truncated. Never smaller than one pixel.
    pub fn render_size(&self) -> (u32, u32) {
        let scale = |n: u32| ((f64::from(n) * self.res_scale).floor() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Unnormalized per-axis movement, see [`Camera::move_by`].
    pub movement: V3,
    /// Look deltas: `.0` yaws, `.1` pitches (inverted).
    pub look: (f64, f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelResult {
    pub hit: bool,
    pub steps: u32,
    /// Index of the shape closest to where the ray stopped, for hits.
    pub shape: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct Frame {
    pub index: u64,
    pub width: u32,
    pub height: u32,
    /// Row-major.
    pub pixels: Vec<PixelResult>,
    /// Rays abandoned for running out of steps or producing NaN.
    pub aborted: usize,
}

impl Frame {
    pub fn pixel(&self, x: u32, y: u32) -> Option<&PixelResult> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize)
    }

    pub fn hits(&self) -> usize {
        self.pixels.iter().filter(|p| p.hit).count()
    }
}

/// Owns the camera and the scene, and produces one [`Frame`] per call to
/// [`Orchestrator::frame`].
///
/// Scene and settings edits are made on staging copies and only take effect at
/// the start of the next frame, so the snapshot being marched never changes
/// under a running pass.
#[derive(Debug)]
pub struct Orchestrator {
    camera: Camera,
    scene: Scene,
    description: SceneDescription,
    staged: SceneDescription,
    staged_dirty: bool,
    settings: FrameSettings,
    staged_settings: Option<FrameSettings>,
    frames: u64,
}

impl Orchestrator {
    pub fn new(
        camera: Camera,
        description: SceneDescription,
        settings: FrameSettings,
    ) -> Result<Self, SceneError> {
        settings.validate()?;
        camera.validate()?;
        let scene = Scene::try_from(&description)?;
        Ok(Orchestrator {
            camera,
            scene,
            staged: description.clone(),
            description,
            staged_dirty: false,
            settings,
            staged_settings: None,
            frames: 0,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The scene marched by the most recent frame.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The description [`Orchestrator::scene`] was built from.
    pub fn description(&self) -> &SceneDescription {
        &self.description
    }

    pub fn settings(&self) -> &FrameSettings {
        &self.settings
    }

    /// Staging copy of the scene. Changes apply from the next frame on.
    pub fn edit_scene(&mut self) -> &mut SceneDescription {
        self.staged_dirty = true;
        &mut self.staged
    }

    /// Replaces the frame settings from the next frame on.
    pub fn stage_settings(&mut self, settings: FrameSettings) {
        self.staged_settings = Some(settings);
    }

    /// Commits staged edits, applies `input` to the camera, and marches every pixel.
    ///
    /// If a staged edit is invalid the frame is not marched at all and the
    /// error is returned; the previous scene, settings and camera are left as
    /// they were and the staged edits are kept so they can be fixed.
    pub fn frame(&mut self, input: &FrameInput) -> Result<Frame, SceneError> {
        self.commit()?;
        self.apply_input(input);

        let (width, height) = self.settings.render_size();
        let limits = self.camera.march_limits(self.settings.max_steps);
        let scene = &self.scene;
        let outcomes: Vec<(PixelResult, Option<Anomaly>)> = self
            .camera
            .generate_rays(width, height)
            .into_par_iter()
            .map(|mut ray| {
                let termination = march(&mut ray, scene, &limits);
                let hit = termination.is_hit();
                let pixel = PixelResult {
                    hit,
                    steps: ray.steps,
                    shape: hit.then(|| scene.nearest_shape(&ray.origin)),
                };
                let anomaly = match termination {
                    Termination::Aborted(anomaly) => Some(anomaly),
                    Termination::Hit | Termination::Miss => None,
                };
                (pixel, anomaly)
            })
            .collect();

        let aborted = outcomes.iter().filter(|(_, a)| a.is_some()).count();
        if aborted > 0 {
            let step_limit = outcomes
                .iter()
                .filter(|(_, a)| *a == Some(Anomaly::StepLimit))
                .count();
            tracing::warn!(
                frame = self.frames,
                aborted,
                step_limit,
                non_finite = aborted - step_limit,
                "rays abandoned without converging"
            );
        }

        let frame = Frame {
            index: self.frames,
            width,
            height,
            pixels: outcomes.into_iter().map(|(pixel, _)| pixel).collect(),
            aborted,
        };
        tracing::debug!(
            frame = frame.index,
            width,
            height,
            hits = frame.hits(),
            "frame marched"
        );
        self.frames += 1;
        Ok(frame)
    }

    fn commit(&mut self) -> Result<(), SceneError> {
        self.camera.validate()?;
        if let Some(settings) = self.staged_settings {
            settings.validate()?;
        }
        if self.staged_dirty {
            self.scene = Scene::try_from(&self.staged)?;
            self.description.clone_from(&self.staged);
            self.staged_dirty = false;
        }
        if let Some(settings) = self.staged_settings.take() {
            self.settings = settings;
        }
        Ok(())
    }

    fn apply_input(&mut self, input: &FrameInput) {
        self.camera.move_by(input.movement);
        let (look_x, look_y) = input.look;
        if look_x != 0. {
            self.camera.rotate(Axis::Yaw, look_x);
        }
        if look_y != 0. {
            self.camera.rotate(Axis::Pitch, -look_y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShapeKind;
    use crate::math::{v, O};

    fn small() -> FrameSettings {
        FrameSettings {
            width: 20,
            height: 16,
            res_scale: 1.,
            max_steps: 200,
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(Camera::default(), SceneDescription::default(), small()).unwrap()
    }

    #[test]
    fn render_size_scales_and_truncates() {
        let settings = FrameSettings::default();
        assert_eq!(settings.render_size(), (400, 300));
        let odd = FrameSettings {
            width: 801,
            height: 599,
            ..settings
        };
        assert_eq!(odd.render_size(), (400, 299));
        let tiny = FrameSettings {
            width: 3,
            height: 1,
            res_scale: 0.01,
            ..settings
        };
        assert_eq!(tiny.render_size(), (1, 1));
    }

    #[test]
    fn settings_are_validated() {
        let zero = FrameSettings {
            width: 0,
            ..small()
        };
        assert!(zero.validate().is_err());
        let scale = FrameSettings {
            res_scale: 1.5,
            ..small()
        };
        assert!(scale.validate().is_err());
        assert!(Orchestrator::new(Camera::default(), SceneDescription::default(), scale).is_err());
    }

    #[test]
    fn frame_covers_every_pixel() {
        let mut o = orchestrator();
        let frame = o.frame(&FrameInput::default()).unwrap();
        assert_eq!((frame.width, frame.height), (20, 16));
        assert_eq!(frame.pixels.len(), 20 * 16);
        assert_eq!(frame.index, 0);
        assert_eq!(o.frame(&FrameInput::default()).unwrap().index, 1);
    }

    #[test]
    fn sphere_in_view_is_hit_in_the_middle() {
        let mut o = orchestrator();
        let frame = o.frame(&FrameInput::default()).unwrap();
        let center = frame.pixel(10, 8).unwrap();
        assert!(center.hit);
        assert_eq!(center.shape, Some(1));
        assert!(center.steps > 0);
        let corner = frame.pixel(19, 15).unwrap();
        assert!(!corner.hit);
        assert_eq!(corner.shape, None);
        assert_eq!(frame.pixel(20, 0), None);
        assert!(frame.hits() > 0 && frame.hits() < frame.pixels.len());
    }

    #[test]
    fn scene_edits_wait_for_next_frame() {
        let mut o = orchestrator();
        o.edit_scene().set_origin(1, v(50., 0., 0.)).unwrap();
        assert_eq!(o.scene().shapes()[1].origin(), O);

        let frame = o.frame(&FrameInput::default()).unwrap();
        assert_eq!(o.scene().shapes()[1].origin(), v(50., 0., 0.));
        assert_eq!(o.description().shapes[1].origin, v(50., 0., 0.));
        assert!(!frame.pixel(10, 8).unwrap().hit);
    }

    #[test]
    fn invalid_edit_aborts_the_frame() {
        let mut o = orchestrator();
        let before = o.camera().clone();
        o.edit_scene().set_size(1, v(-1., 0., 0.)).unwrap();
        let input = FrameInput {
            movement: v(1., 0., 0.),
            look: (0., 0.),
        };
        assert!(matches!(
            o.frame(&input),
            Err(SceneError::InvalidShape { index: 1, .. })
        ));
        assert_eq!(o.camera(), &before);
        assert_eq!(o.scene().shapes()[1].origin(), O);

        o.edit_scene().set_size(1, v(1., 0., 0.)).unwrap();
        assert!(o.frame(&input).is_ok());
        assert_ne!(o.camera().origin, before.origin);
    }

    #[test]
    fn removing_every_shape_is_rejected() {
        let mut o = orchestrator();
        o.edit_scene().shapes.clear();
        assert_eq!(o.frame(&FrameInput::default()).unwrap_err(), SceneError::InvalidScene);
    }

    #[test]
    fn kind_edit_changes_the_snapshot() {
        let mut o = orchestrator();
        o.edit_scene().set_kind(1, ShapeKind::Box).unwrap();
        o.frame(&FrameInput::default()).unwrap();
        assert!(matches!(o.scene().shapes()[1], crate::marcher::Shape::Box { .. }));
    }

    #[test]
    fn staged_settings_apply_next_frame() {
        let mut o = orchestrator();
        o.stage_settings(FrameSettings {
            width: 8,
            height: 4,
            ..small()
        });
        assert_eq!(o.settings().width, 20);
        let frame = o.frame(&FrameInput::default()).unwrap();
        assert_eq!((frame.width, frame.height), (8, 4));
    }

    #[test]
    fn input_moves_and_turns_the_camera() {
        let mut o = orchestrator();
        let input = FrameInput {
            movement: v(0., 0., -1.),
            look: (5., 0.),
        };
        o.frame(&input).unwrap();
        assert!((o.camera().origin.z - 4.9).abs() < 1e-12);
        assert!(o.camera().direction().x < 0.);
        assert_eq!(o.camera().direction().y, 0.);
    }

    #[test]
    fn look_y_pitches_inverted() {
        let mut o = orchestrator();
        o.frame(&FrameInput {
            movement: O,
            look: (0., 1.),
        })
        .unwrap();
        // -1 pitch from -Z tips the view upwards.
        assert!(o.camera().direction().y > 0.);
    }

    #[test]
    fn invalid_camera_is_rejected() {
        for clip in [f64::NAN, 0.] {
            let mut camera = Camera::default();
            camera.clip_distance = clip;
            assert!(matches!(
                Orchestrator::new(camera, SceneDescription::default(), small()),
                Err(SceneError::InvalidCamera(_))
            ));
        }
    }

    #[test]
    fn step_limit_is_reported() {
        let mut o = Orchestrator::new(
            Camera::default(),
            SceneDescription::default(),
            FrameSettings {
                max_steps: 1,
                ..small()
            },
        )
        .unwrap();
        let frame = o.frame(&FrameInput::default()).unwrap();
        assert_eq!(frame.aborted, frame.pixels.len());
        assert_eq!(frame.hits(), 0);
    }
}
