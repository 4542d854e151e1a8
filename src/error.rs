//! Error types for the vantage viewer
//!
//! Rendering failures are fatal to renderer initialization and are reported
//! with the driver's compile or link log. Color and mesh errors are ordinary
//! input validation failures that leave scene state untouched.

use crate::gfx::rendering::device::ShaderStage;

/// Failures raised by a [`RenderDevice`](crate::gfx::rendering::device::RenderDevice)
/// or while bringing a renderer context up.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("render device context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program failed to link: {0}")]
    ProgramLink(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("texture upload rejected: {0}")]
    Texture(String),
}

impl RenderError {
    pub fn context<T: ToString>(msg: T) -> Self {
        RenderError::ContextUnavailable(msg.to_string())
    }

    pub fn compile<T: ToString>(stage: ShaderStage, log: T) -> Self {
        RenderError::ShaderCompile {
            stage,
            log: log.to_string(),
        }
    }

    pub fn link<T: ToString>(log: T) -> Self {
        RenderError::ProgramLink(log.to_string())
    }

    pub fn surface<T: ToString>(msg: T) -> Self {
        RenderError::Surface(msg.to_string())
    }
}

/// Hex color strings that do not match `#RRGGBB`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("malformed hex color '{0}', expected #RRGGBB")]
    MalformedHex(String),
}

/// Mesh data that violates the flat triangle-list contract, or a load that
/// never produced data.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("mesh layout mismatch: {0}")]
    LayoutMismatch(String),

    #[error("mesh load failed: {0}")]
    LoadFailed(String),

    #[error("mesh load was abandoned before completion")]
    Cancelled,
}

/// Rejected parameter updates.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("no scene object with id {0}")]
    UnknownObject(usize),

    #[error("no light in slot {0}")]
    UnknownLight(usize),

    #[error(transparent)]
    Color(#[from] ColorError),
}

/// Result type alias for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;
