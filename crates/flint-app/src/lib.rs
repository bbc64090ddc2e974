//! Application framework for Flint.
//!
//! This crate handles the boilerplate between `main` and a live graphics
//! pipeline:
//! - Window creation and the winit event loop
//! - GPU context and surface initialization
//! - Render pass, pipeline layout and pipeline construction
//! - Teardown in reverse creation order on close
//!
//! # Example
//!
//! ```no_run
//! use flint_app::AppConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     flint_app::run(AppConfig::new("My App").with_size(1280, 720))
//! }
//! ```

mod runner;

pub use runner::{run, AppConfig};

// Re-export commonly used types for convenience
pub use flint_gpu::{GpuContext, GpuContextBuilder, Pipeline, PipelineConfig};
