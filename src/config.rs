//! Scene descriptions: the editable, serializable form of a [`Scene`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SceneError};
use crate::marcher::{Scene, Shape};
use crate::math::{v, V3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Sphere,
    Box,
    Torus,
    Fractal,
}

/// One shape as it appears in a scene file or an editor.
///
/// `size` is read according to `kind`:
/// * sphere: `x` is the radius
/// * box: half extents
/// * torus: `x` major radius, `y` minor radius
/// * fractal: `x` iterations, `y` radius, `z` power
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    pub origin: V3,
    pub size: V3,
    /// Presentation hint only.
    #[serde(default = "default_color")]
    pub color: V3,
}

fn default_color() -> V3 {
    v(1., 1., 1.)
}

fn default_k() -> f64 {
    1.
}

impl ShapeDescriptor {
    pub fn to_shape(&self) -> Shape {
        let (origin, size) = (self.origin, self.size);
        match self.kind {
            ShapeKind::Sphere => Shape::Sphere {
                origin,
                radius: size.x,
            },
            ShapeKind::Box => Shape::Box {
                origin,
                half_extents: size,
            },
            ShapeKind::Torus => Shape::Torus {
                origin,
                major_radius: size.x,
                minor_radius: size.y,
            },
            ShapeKind::Fractal => Shape::Fractal {
                origin,
                // Saturating: negative and NaN become 0 and fail validation.
                iterations: size.x as u32,
                radius: size.y,
                power: size.z,
            },
        }
    }
}

/// The staging copy of a scene. Edits go here and become visible once the
/// description is turned into a [`Scene`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub shapes: Vec<ShapeDescriptor>,
    #[serde(default = "default_k")]
    pub k: f64,
}

impl Default for SceneDescription {
    fn default() -> Self {
        SceneDescription {
            shapes: vec![
                ShapeDescriptor {
                    kind: ShapeKind::Box,
                    origin: v(-2., 3.5, -1.),
                    size: v(1.5, 1.5, 1.5),
                    color: v(0.8, 0.2, 0.2),
                },
                ShapeDescriptor {
                    kind: ShapeKind::Sphere,
                    origin: v(0., 0., 0.),
                    size: v(1., 1., 1.),
                    color: v(0.8, 0.9, 0.1),
                },
            ],
            k: default_k(),
        }
    }
}

impl SceneDescription {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let description: SceneDescription = serde_json::from_str(json)?;
        Scene::try_from(&description)?;
        Ok(description)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let description = Self::from_json_str(&fs::read_to_string(path)?)?;
        tracing::info!(
            path = %path.display(),
            shapes = description.shapes.len(),
            k = description.k,
            "loaded scene"
        );
        Ok(description)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn shape(&self, index: usize) -> Result<&ShapeDescriptor, SceneError> {
        self.shapes.get(index).ok_or(SceneError::UnknownShape(index))
    }

    pub fn shape_mut(&mut self, index: usize) -> Result<&mut ShapeDescriptor, SceneError> {
        self.shapes
            .get_mut(index)
            .ok_or(SceneError::UnknownShape(index))
    }

    pub fn set_kind(&mut self, index: usize, kind: ShapeKind) -> Result<(), SceneError> {
        self.shape_mut(index)?.kind = kind;
        Ok(())
    }

    pub fn set_origin(&mut self, index: usize, origin: V3) -> Result<(), SceneError> {
        self.shape_mut(index)?.origin = origin;
        Ok(())
    }

    pub fn set_size(&mut self, index: usize, size: V3) -> Result<(), SceneError> {
        self.shape_mut(index)?.size = size;
        Ok(())
    }

    pub fn set_color(&mut self, index: usize, color: V3) -> Result<(), SceneError> {
        self.shape_mut(index)?.color = color;
        Ok(())
    }

    /// Sets the blend sharpness. Checked when the description becomes a scene.
    pub fn set_k(&mut self, k: f64) {
        self.k = k;
    }

    /// Appends a shape and returns its index.
    pub fn push(&mut self, shape: ShapeDescriptor) -> usize {
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    /// Removes a shape. Later shapes move down one index.
    pub fn remove(&mut self, index: usize) -> Result<ShapeDescriptor, SceneError> {
        if index < self.shapes.len() {
            Ok(self.shapes.remove(index))
        } else {
            Err(SceneError::UnknownShape(index))
        }
    }
}

impl TryFrom<&SceneDescription> for Scene {
    type Error = SceneError;

    fn try_from(description: &SceneDescription) -> Result<Self, Self::Error> {
        Scene::new(
            description.shapes.iter().map(ShapeDescriptor::to_shape).collect(),
            description.k,
        )
    }
}
