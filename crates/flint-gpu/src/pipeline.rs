//! Graphics pipeline configuration and ownership.
//!
//! This module carries the core of the crate:
//! - [`PipelineConfig`] describes the fixed-function state for one pipeline
//! - [`PipelineDevice`] is the narrow device capability the wrapper needs
//! - [`Pipeline`] owns the pipeline and its shader modules and releases
//!   them exactly once when dropped

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use ash::vk;
use flint_log::LogSink;

use crate::context::GpuContext;
use crate::error::{GpuError, Result};

/// Depth bias state for rasterization.
#[derive(Clone, Copy, Debug)]
pub struct DepthBias {
    pub enable: bool,
    pub constant_factor: f32,
    pub clamp: f32,
    pub slope_factor: f32,
}

impl Default for DepthBias {
    fn default() -> Self {
        Self {
            enable: false,
            constant_factor: 0.0,
            clamp: 0.0,
            slope_factor: 0.0,
        }
    }
}

/// Blend state for the single color attachment.
#[derive(Clone, Copy, Debug)]
pub struct ColorBlend {
    pub enable: bool,
    pub src_color_factor: vk::BlendFactor,
    pub dst_color_factor: vk::BlendFactor,
    pub color_op: vk::BlendOp,
    pub src_alpha_factor: vk::BlendFactor,
    pub dst_alpha_factor: vk::BlendFactor,
    pub alpha_op: vk::BlendOp,
    pub write_mask: vk::ColorComponentFlags,
}

impl Default for ColorBlend {
    fn default() -> Self {
        Self {
            enable: false,
            src_color_factor: vk::BlendFactor::ONE,
            dst_color_factor: vk::BlendFactor::ZERO,
            color_op: vk::BlendOp::ADD,
            src_alpha_factor: vk::BlendFactor::ONE,
            dst_alpha_factor: vk::BlendFactor::ZERO,
            alpha_op: vk::BlendOp::ADD,
            write_mask: vk::ColorComponentFlags::RGBA,
        }
    }
}

/// Depth test state.
#[derive(Clone, Copy, Debug)]
pub struct DepthState {
    pub test_enable: bool,
    pub write_enable: bool,
    pub compare_op: vk::CompareOp,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test_enable: true,
            write_enable: true,
            compare_op: vk::CompareOp::LESS,
        }
    }
}

/// Fixed-function configuration for one graphics pipeline.
///
/// Built once per pipeline with [`PipelineConfig::new`] and passed by
/// reference into [`Pipeline::from_spirv_paths`]. Every field is plain
/// data; callers may overwrite any of them before construction.
#[derive(Clone, Copy, Debug)]
pub struct PipelineConfig {
    pub topology: vk::PrimitiveTopology,
    pub primitive_restart: bool,
    pub viewport: vk::Viewport,
    pub scissor: vk::Rect2D,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub line_width: f32,
    pub depth_bias: DepthBias,
    pub samples: vk::SampleCountFlags,
    pub color_blend: ColorBlend,
    pub depth: DepthState,
    /// Not owned; the caller must keep it alive through pipeline creation.
    /// Null until the caller fills it in.
    pub pipeline_layout: vk::PipelineLayout,
    /// Not owned; the caller must keep it alive for the pipeline's usage.
    /// Null until the caller fills it in.
    pub render_pass: vk::RenderPass,
    pub subpass: u32,
}

impl PipelineConfig {
    /// Build the default configuration for a render target of the given size.
    ///
    /// The state comes out ready for a classic forward pass: filled
    /// triangles, no culling, clockwise front faces, depth testing on,
    /// blending off, one full-target viewport and scissor. Zero extents are
    /// accepted here; the device rejects the degenerate viewport at
    /// creation time.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            primitive_restart: false,
            viewport: vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: width as f32,
                height: height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            },
            scissor: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width, height },
            },
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::CLOCKWISE,
            line_width: 1.0,
            depth_bias: DepthBias::default(),
            samples: vk::SampleCountFlags::TYPE_1,
            color_blend: ColorBlend::default(),
            depth: DepthState::default(),
            pipeline_layout: vk::PipelineLayout::null(),
            render_pass: vk::RenderPass::null(),
            subpass: 0,
        }
    }

    /// Check the preconditions pipeline creation relies on.
    fn validate(&self) -> Result<()> {
        if self.pipeline_layout == vk::PipelineLayout::null() {
            return Err(GpuError::InvalidConfig("no pipeline layout provided"));
        }
        if self.render_pass == vk::RenderPass::null() {
            return Err(GpuError::InvalidConfig("no render pass provided"));
        }
        Ok(())
    }
}

/// Device-side operations the pipeline wrapper needs.
///
/// [`GpuContext`] implements this against the live Vulkan device; tests
/// implement it with a recording double. The methods are not internally
/// synchronized: callers sharing one device across threads must serialize
/// construction and teardown themselves. Handles passed to the destroy
/// methods must have been created by the same implementation.
pub trait PipelineDevice: Send + Sync {
    /// Create a shader module from a raw SPIR-V binary.
    fn create_shader_module(&self, code: &[u8]) -> Result<vk::ShaderModule>;

    /// Create one graphics pipeline from the configuration and two stages.
    fn create_graphics_pipeline(
        &self,
        config: &PipelineConfig,
        vert_module: vk::ShaderModule,
        frag_module: vk::ShaderModule,
    ) -> Result<vk::Pipeline>;

    /// Destroy a shader module.
    fn destroy_shader_module(&self, module: vk::ShaderModule);

    /// Destroy a pipeline.
    fn destroy_pipeline(&self, pipeline: vk::Pipeline);
}

/// A graphics pipeline and the shader modules it was built from.
///
/// Owns one `vk::Pipeline` plus the vertex and fragment modules, and
/// releases all three through the retained device when dropped. The value
/// is movable but not clonable, so exactly one owner ever runs the
/// teardown.
pub struct Pipeline {
    handle: vk::Pipeline,
    vert_module: vk::ShaderModule,
    frag_module: vk::ShaderModule,
    device: Arc<dyn PipelineDevice>,
}

impl Pipeline {
    /// Build a graphics pipeline from two SPIR-V files on disk.
    ///
    /// `config.pipeline_layout` and `config.render_pass` must be filled in;
    /// otherwise construction fails with [`GpuError::InvalidConfig`] before
    /// touching the filesystem or the device. Shader byte sizes are
    /// reported through `log`, and a refused pipeline-creation call is
    /// reported on the fatal channel. Whatever the failure, every device
    /// resource created along the way is released before the error returns.
    pub fn from_spirv_paths(
        device: Arc<dyn PipelineDevice>,
        vert_path: impl AsRef<Path>,
        frag_path: impl AsRef<Path>,
        config: &PipelineConfig,
        log: &dyn LogSink,
    ) -> Result<Self> {
        config.validate()?;

        let vert_code = read_shader(vert_path.as_ref())?;
        let frag_code = read_shader(frag_path.as_ref())?;

        log.info(&format!("Vertex shader code size: {}", vert_code.len()));
        log.info(&format!("Fragment shader code size: {}", frag_code.len()));

        let vert_guard = ModuleGuard::create(device.as_ref(), &vert_code)?;
        let frag_guard = ModuleGuard::create(device.as_ref(), &frag_code)?;

        let handle =
            match device.create_graphics_pipeline(config, vert_guard.module, frag_guard.module) {
                Ok(handle) => handle,
                Err(err) => {
                    log.fatal("Failed to create graphics pipeline");
                    return Err(err);
                }
            };

        Ok(Self {
            handle,
            vert_module: vert_guard.release(),
            frag_module: frag_guard.release(),
            device,
        })
    }

    /// Get the pipeline handle for command recording.
    pub fn handle(&self) -> vk::Pipeline {
        self.handle
    }
}

// The device is a trait object without Debug; show the handles only.
impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("handle", &self.handle)
            .field("vert_module", &self.vert_module)
            .field("frag_module", &self.frag_module)
            .finish_non_exhaustive()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.device.destroy_shader_module(self.vert_module);
        self.device.destroy_shader_module(self.frag_module);
        self.device.destroy_pipeline(self.handle);
    }
}

/// Destroys a freshly created shader module unless construction completes.
struct ModuleGuard<'a> {
    device: &'a dyn PipelineDevice,
    module: vk::ShaderModule,
    armed: bool,
}

impl<'a> ModuleGuard<'a> {
    fn create(device: &'a dyn PipelineDevice, code: &[u8]) -> Result<Self> {
        let module = device.create_shader_module(code)?;
        Ok(Self {
            device,
            module,
            armed: true,
        })
    }

    /// Hand the module over to its final owner.
    fn release(mut self) -> vk::ShaderModule {
        self.armed = false;
        self.module
    }
}

impl Drop for ModuleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.device.destroy_shader_module(self.module);
        }
    }
}

fn read_shader(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| GpuError::ShaderRead {
        path: path.to_path_buf(),
        source,
    })
}

impl PipelineDevice for GpuContext {
    fn create_shader_module(&self, code: &[u8]) -> Result<vk::ShaderModule> {
        let words = spirv_words(code)?;
        let create_info = vk::ShaderModuleCreateInfo::default().code(&words);
        let module = unsafe { self.device.create_shader_module(&create_info, None) }
            .map_err(|e| GpuError::ShaderModule(e.to_string()))?;
        Ok(module)
    }

    fn create_graphics_pipeline(
        &self,
        config: &PipelineConfig,
        vert_module: vk::ShaderModule,
        frag_module: vk::ShaderModule,
    ) -> Result<vk::Pipeline> {
        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vert_module)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(frag_module)
                .name(c"main"),
        ];

        // Zero vertex bindings and attributes
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default();

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(config.topology)
            .primitive_restart_enable(config.primitive_restart);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(std::slice::from_ref(&config.viewport))
            .scissors(std::slice::from_ref(&config.scissor));

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(config.polygon_mode)
            .cull_mode(config.cull_mode)
            .front_face(config.front_face)
            .depth_bias_enable(config.depth_bias.enable)
            .depth_bias_constant_factor(config.depth_bias.constant_factor)
            .depth_bias_clamp(config.depth_bias.clamp)
            .depth_bias_slope_factor(config.depth_bias.slope_factor)
            .line_width(config.line_width);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(config.samples)
            .sample_shading_enable(false);

        let blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(config.color_blend.enable)
            .src_color_blend_factor(config.color_blend.src_color_factor)
            .dst_color_blend_factor(config.color_blend.dst_color_factor)
            .color_blend_op(config.color_blend.color_op)
            .src_alpha_blend_factor(config.color_blend.src_alpha_factor)
            .dst_alpha_blend_factor(config.color_blend.dst_alpha_factor)
            .alpha_blend_op(config.color_blend.alpha_op)
            .color_write_mask(config.color_blend.write_mask);

        let color_blending = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&blend_attachment));

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(config.depth.test_enable)
            .depth_write_enable(config.depth.write_enable)
            .depth_compare_op(config.depth.compare_op)
            .depth_bounds_test_enable(false)
            .min_depth_bounds(0.0)
            .max_depth_bounds(1.0)
            .stencil_test_enable(false);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .layout(config.pipeline_layout)
            .render_pass(config.render_pass)
            .subpass(config.subpass)
            .base_pipeline_handle(vk::Pipeline::null())
            .base_pipeline_index(-1);

        let pipelines = unsafe {
            self.device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
        }
        .map_err(|(_pipelines, e)| GpuError::PipelineCreation(e.to_string()))?;

        Ok(pipelines[0])
    }

    fn destroy_shader_module(&self, module: vk::ShaderModule) {
        unsafe { self.device.destroy_shader_module(module, None) };
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe { self.device.destroy_pipeline(pipeline, None) };
    }
}

/// Repack a SPIR-V byte stream into the u32 words Vulkan expects.
fn spirv_words(code: &[u8]) -> Result<Vec<u32>> {
    if code.len() % 4 != 0 {
        return Err(GpuError::ShaderModule(format!(
            "SPIR-V binary size {} is not a multiple of 4",
            code.len()
        )));
    }

    Ok(code
        .chunks_exact(4)
        .map(|word| u32::from_ne_bytes([word[0], word[1], word[2], word[3]]))
        .collect())
}
