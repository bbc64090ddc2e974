//! Windowing and event loop plumbing for Flint.
//!
//! Wraps winit window creation behind [`WindowConfig`] so applications
//! describe a window once and hand the description to the event loop.

use thiserror::Error;
use tracing::debug;
use winit::dpi::PhysicalSize;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowAttributes};

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),
    #[error("Event loop error: {0}")]
    EventLoop(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Flint".to_string(),
            width: 800,
            height: 600,
            resizable: true,
        }
    }
}

impl WindowConfig {
    /// Translate the configuration into winit window attributes.
    ///
    /// The size is requested in physical pixels so the framebuffer comes
    /// out matching the configured extent on any display scale.
    pub fn attributes(&self) -> WindowAttributes {
        Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(PhysicalSize::new(self.width, self.height))
            .with_resizable(self.resizable)
    }
}

/// Create the event loop the application runs on.
pub fn create_event_loop() -> Result<EventLoop<()>> {
    EventLoop::new().map_err(|e| PlatformError::EventLoop(e.to_string()))
}

/// Create a window on a running event loop.
pub fn create_window(event_loop: &ActiveEventLoop, config: &WindowConfig) -> Result<Window> {
    let window = event_loop
        .create_window(config.attributes())
        .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;

    debug!("Created window {}x{}", config.width, config.height);
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_an_800_by_600_window() {
        let config = WindowConfig::default();
        assert_eq!(config.title, "Flint");
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 600);
        assert!(config.resizable);
    }

    #[test]
    fn attributes_carry_the_configured_state() {
        let config = WindowConfig {
            title: "Triangle".to_string(),
            width: 1280,
            height: 720,
            resizable: false,
        };

        let attrs = config.attributes();
        assert_eq!(attrs.title, "Triangle");
        assert_eq!(attrs.inner_size, Some(PhysicalSize::new(1280, 720).into()));
        assert!(!attrs.resizable);
    }
}
