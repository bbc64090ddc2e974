//! Application runner and event loop.

use std::path::PathBuf;
use std::sync::Arc;

use ash::vk;
use flint_gpu::{
    create_color_render_pass, create_pipeline_layout, GpuContext, GpuContextBuilder, Pipeline,
    PipelineConfig, SurfaceContext,
};
use flint_log::TracingSink;
use flint_platform::{PlatformError, WindowConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::{Window, WindowId};

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Window title.
    pub title: String,
    /// Initial window width.
    pub width: u32,
    /// Initial window height.
    pub height: u32,
    /// Enable Vulkan validation layers (default: debug builds only).
    pub validation: bool,
    /// Path to the compiled vertex shader.
    pub vertex_shader: PathBuf,
    /// Path to the compiled fragment shader.
    pub fragment_shader: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Flint".to_string(),
            width: 800,
            height: 600,
            validation: cfg!(debug_assertions),
            vertex_shader: PathBuf::from("shaders/simple_shader.vert.spv"),
            fragment_shader: PathBuf::from("shaders/simple_shader.frag.spv"),
        }
    }
}

impl AppConfig {
    /// Create a new config with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the window dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Enable or disable validation layers.
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    /// Set the shader binaries the pipeline is built from.
    pub fn with_shaders(
        mut self,
        vertex_shader: impl Into<PathBuf>,
        fragment_shader: impl Into<PathBuf>,
    ) -> Self {
        self.vertex_shader = vertex_shader.into();
        self.fragment_shader = fragment_shader.into();
        self
    }
}

/// Run the application with the given configuration.
///
/// This function initializes logging, creates the window and GPU context,
/// builds the graphics pipeline, and runs the event loop until the window
/// is closed. A failure during initialization tears the loop down and is
/// returned to the caller.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("{} starting...", config.title);

    let event_loop = flint_platform::create_event_loop()?;
    // No frame loop is running; only window events need servicing
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut runner = AppRunner {
        config,
        state: None,
        init_error: None,
    };

    event_loop
        .run_app(&mut runner)
        .map_err(|e| PlatformError::EventLoop(e.to_string()))?;

    match runner.init_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Internal application runner that implements winit's ApplicationHandler.
struct AppRunner {
    config: AppConfig,
    state: Option<AppState>,
    init_error: Option<anyhow::Error>,
}

/// Internal application state.
struct AppState {
    /// The surface was created from this window's handles; the window must
    /// outlive it.
    #[allow(dead_code)]
    window: Arc<Window>,
    gpu: Arc<GpuContext>,
    surface: SurfaceContext,
    pipeline_layout: vk::PipelineLayout,
    render_pass: vk::RenderPass,
    pipeline: Option<Pipeline>,
}

impl ApplicationHandler for AppRunner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        info!("Creating application state...");

        match self.create_state(event_loop) {
            Ok(state) => {
                self.state = Some(state);
                info!("Application ready");
            }
            Err(e) => {
                error!("Failed to initialize application: {e}");
                self.init_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            info!("Close requested");
            if let Some(mut state) = self.state.take() {
                state.cleanup();
            }
            event_loop.exit();
        }
    }
}

impl AppRunner {
    fn create_state(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState> {
        // Create window
        let window_config = WindowConfig {
            title: self.config.title.clone(),
            width: self.config.width,
            height: self.config.height,
            resizable: true,
        };
        let window = Arc::new(flint_platform::create_window(event_loop, &window_config)?);

        // Create GPU context
        let gpu = Arc::new(
            GpuContextBuilder::new()
                .app_name(&self.config.title)
                .validation(self.config.validation)
                .build()?,
        );

        let surface = unsafe { SurfaceContext::from_window(&gpu, &*window)? };
        let surface_format = surface.preferred_format(&gpu)?;

        let render_pass = unsafe { create_color_render_pass(gpu.device(), surface_format.format)? };
        let pipeline_layout = unsafe { create_pipeline_layout(gpu.device(), &[], &[])? };

        // The pipeline renders at the size the window actually came up at
        let size = window.inner_size();
        let mut pipeline_config = PipelineConfig::new(size.width, size.height);
        pipeline_config.pipeline_layout = pipeline_layout;
        pipeline_config.render_pass = render_pass;

        let pipeline = Pipeline::from_spirv_paths(
            gpu.clone(),
            &self.config.vertex_shader,
            &self.config.fragment_shader,
            &pipeline_config,
            &TracingSink,
        )?;

        Ok(AppState {
            window,
            gpu,
            surface,
            pipeline_layout,
            render_pass,
            pipeline: Some(pipeline),
        })
    }
}

impl AppState {
    fn cleanup(&mut self) {
        info!("Starting cleanup...");

        if let Err(e) = self.gpu.wait_idle() {
            error!("Failed to wait idle: {e}");
        }

        // The pipeline goes first; it references the layout and render pass
        self.pipeline = None;

        unsafe {
            let device = self.gpu.device();
            device.destroy_pipeline_layout(self.pipeline_layout, None);
            device.destroy_render_pass(self.render_pass, None);
            self.surface.destroy();
        }

        info!("Cleanup complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_the_viewer_setup() {
        let config = AppConfig::default();
        assert_eq!(config.title, "Flint");
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 600);
        assert_eq!(config.validation, cfg!(debug_assertions));
        assert_eq!(
            config.vertex_shader,
            PathBuf::from("shaders/simple_shader.vert.spv")
        );
        assert_eq!(
            config.fragment_shader,
            PathBuf::from("shaders/simple_shader.frag.spv")
        );
    }

    #[test]
    fn config_builders_chain() {
        let config = AppConfig::new("Triangle")
            .with_size(1280, 720)
            .with_validation(false)
            .with_shaders("out/tri.vert.spv", "out/tri.frag.spv");

        assert_eq!(config.title, "Triangle");
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert!(!config.validation);
        assert_eq!(config.vertex_shader, PathBuf::from("out/tri.vert.spv"));
        assert_eq!(config.fragment_shader, PathBuf::from("out/tri.frag.spv"));
    }
}
