use thiserror::Error;

/// Problems with a scene, camera or frame setup that stop a frame from being marched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("scene has no shapes")]
    InvalidScene,
    #[error("shape {index} is invalid: {reason}")]
    InvalidShape { index: usize, reason: &'static str },
    #[error("blend sharpness must be finite and non-negative, got {0}")]
    InvalidBlend(f64),
    #[error("no shape at index {0}")]
    UnknownShape(usize),
    #[error("invalid camera: {0}")]
    InvalidCamera(&'static str),
    #[error("invalid frame settings: {0}")]
    InvalidSettings(&'static str),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read scene file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse scene file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Scene(#[from] SceneError),
}
