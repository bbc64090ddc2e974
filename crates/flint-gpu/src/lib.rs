//! Vulkan bootstrap and graphics pipeline management for Flint.
//!
//! The crate wraps the unsafe `ash` surface behind a small set of owning
//! types. [`GpuContext`] brings up instance, physical device and logical
//! device; [`SurfaceContext`] binds a window surface; [`Pipeline`] builds
//! a graphics pipeline from SPIR-V files and a [`PipelineConfig`].
//!
//! Pipeline construction runs against the [`PipelineDevice`] trait rather
//! than the raw device, which keeps resource-lifetime behavior testable
//! without a GPU.

pub mod context;
pub mod error;
pub mod instance;
pub mod pass;
pub mod pipeline;
pub mod surface;

pub use context::{GpuContext, GpuContextBuilder};
pub use error::{GpuError, Result};
pub use pass::{create_color_render_pass, create_pipeline_layout};
pub use pipeline::{ColorBlend, DepthBias, DepthState, Pipeline, PipelineConfig, PipelineDevice};
pub use surface::{select_surface_format, SurfaceContext};
