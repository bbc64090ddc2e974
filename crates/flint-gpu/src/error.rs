//! GPU error types.

use std::io;
use std::path::PathBuf;

use ash::vk;
use thiserror::Error;

/// GPU-related errors.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Vulkan error.
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    /// No suitable GPU found.
    #[error("No suitable GPU found")]
    NoSuitableDevice,

    /// A shader binary could not be read from disk.
    #[error("Failed to read shader file {}: {source}", path.display())]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Shader module creation failed.
    #[error("Shader module creation failed: {0}")]
    ShaderModule(String),

    /// Pipeline creation failed.
    #[error("Pipeline creation failed: {0}")]
    PipelineCreation(String),

    /// A pipeline configuration precondition was violated.
    ///
    /// This is a caller bug, not a device refusal: the configuration was
    /// handed over incomplete.
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(&'static str),

    /// Surface creation failed.
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;
