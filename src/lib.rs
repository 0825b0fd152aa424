//! Sphere tracing of signed distance fields: shapes, their smooth blend, a
//! pinhole camera, and the per-frame pass that marches one ray per pixel.

pub mod config;
pub mod error;
pub mod frame;
pub mod marcher;
pub mod math;

pub use config::{SceneDescription, ShapeDescriptor, ShapeKind};
pub use error::{ConfigError, SceneError};
pub use frame::{Frame, FrameInput, FrameSettings, Orchestrator, PixelResult};
