//! Flint Demo Viewer
//!
//! Opens a window, brings up the GPU, and builds the triangle pipeline from
//! the shaders under `shaders/`. The window stays open until closed.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p flint-viewer
//! ```
//!
//! The SPIR-V binaries are looked up relative to the working directory, so
//! run from the repository root (or point `AppConfig::with_shaders` at
//! another location).
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

use flint_app::{run, AppConfig};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

fn main() -> anyhow::Result<()> {
    run(AppConfig::new("Flint Viewer").with_size(WIDTH, HEIGHT))
}
