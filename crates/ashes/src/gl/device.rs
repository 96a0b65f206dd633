//! GL device: resource creation and ownership
//!
//! The device owns every GL-side resource in slotmap arenas keyed by the
//! core handles, so stale handles surface as `ResourceLost` instead of
//! touching freed names. A device-global VAO carries the vertex layout and
//! a dedicated uniform buffer at [`super::PUSH_CONSTANT_BINDING`] backs
//! push constants; both are created up front.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use slotmap::SlotMap;

use crate::core::{
    AshesError, AshesResult, BufferCreateInfo, BufferHandle, DescriptorSetHandle,
    DescriptorSetLayoutCreateInfo, DescriptorSetLayoutHandle, Extent2D, FenceHandle, Format,
    Framebuffer, FramebufferHandle, GraphicsPipelineCreateInfo, ImageCreateInfo, ImageHandle,
    ImageViewCreateInfo, ImageViewHandle, PipelineHandle, PipelineLayoutCreateInfo,
    PipelineLayoutHandle, QueryPoolHandle, RenderPass, RenderPassCreateInfo, RenderPassHandle,
    SamplerCreateInfo, SamplerHandle, SemaphoreHandle, ShaderModuleCreateInfo, ShaderModuleHandle,
    ShaderSource, ShaderStageFlags, WaitResult, WriteDescriptorSet,
    validate_framebuffer, AttachmentViewDesc,
};

use super::api::GlContext;
use super::convert;
use super::queue::GlQueue;
use super::swapchain::GlSwapchain;
use super::{PUSH_CONSTANT_BINDING, PUSH_CONSTANT_SIZE};

pub(crate) struct GlBuffer {
    pub name: u32,
    pub size: u64,
}

pub(crate) struct GlImage {
    pub name: u32,
    pub target: u32,
    pub format: Format,
    pub width: u32,
    pub height: u32,
}

pub(crate) struct GlImageView {
    pub texture: u32,
    pub target: u32,
    pub format: Format,
    pub extent: Extent2D,
    pub base_mip_level: u32,
}

pub(crate) struct GlShaderModule {
    pub shader: u32,
    pub stage: ShaderStageFlags,
}

pub(crate) struct GlPipeline {
    pub program: u32,
    pub info: GraphicsPipelineCreateInfo,
}

pub(crate) struct GlFbAttachment {
    pub texture: u32,
    pub target: u32,
    pub format: Format,
    pub mip_level: u32,
    /// Index among the framebuffer's color attachments, in slot order
    pub color_index: Option<u32>,
}

/// `name == 0` is the default framebuffer (swapchain)
pub(crate) struct GlFramebuffer {
    pub name: u32,
    pub extent: Extent2D,
    pub attachments: Vec<GlFbAttachment>,
}

pub(crate) struct GlFence {
    pub sync: Option<u64>,
}

pub(crate) struct GlSemaphore {
    pub signaled: bool,
}

pub(crate) struct GlDeviceState {
    pub ctx: Rc<dyn GlContext>,
    pub buffers: SlotMap<BufferHandle, GlBuffer>,
    pub images: SlotMap<ImageHandle, GlImage>,
    pub views: SlotMap<ImageViewHandle, GlImageView>,
    pub samplers: SlotMap<SamplerHandle, u32>,
    pub shader_modules: SlotMap<ShaderModuleHandle, GlShaderModule>,
    pub render_passes: SlotMap<RenderPassHandle, RenderPass>,
    pub framebuffers: SlotMap<FramebufferHandle, GlFramebuffer>,
    pub set_layouts: SlotMap<DescriptorSetLayoutHandle, DescriptorSetLayoutCreateInfo>,
    pub descriptor_sets: SlotMap<DescriptorSetHandle, Vec<WriteDescriptorSet>>,
    pub pipeline_layouts: SlotMap<PipelineLayoutHandle, PipelineLayoutCreateInfo>,
    pub pipelines: SlotMap<PipelineHandle, GlPipeline>,
    pub fences: SlotMap<FenceHandle, GlFence>,
    pub semaphores: SlotMap<SemaphoreHandle, GlSemaphore>,
    pub query_pools: SlotMap<QueryPoolHandle, Vec<u32>>,
    pub push_constant_buffer: u32,
    pub scratch_read_fbo: u32,
    pub scratch_draw_fbo: u32,
}

fn backend(reason: String) -> AshesError {
    AshesError::Backend(reason)
}

/// The OpenGL device
///
/// All operations run synchronously on the thread owning the GL context.
/// The device and every queue/swapchain created from it share state, so
/// they must stay on that thread.
pub struct GlDevice {
    state: Rc<RefCell<GlDeviceState>>,
}

impl GlDevice {
    /// Initialize a device over a context
    ///
    /// Creates the device VAO, the push-constant buffer, and the two
    /// scratch framebuffers used for resolves and image copies.
    pub fn new(ctx: Rc<dyn GlContext>) -> AshesResult<Self> {
        let init = |e: String| AshesError::Initialization(e);

        let vao = ctx.create_vertex_array().map_err(init)?;
        ctx.bind_vertex_array(vao);

        let push_constant_buffer = ctx.create_buffer().map_err(init)?;
        ctx.bind_buffer(glow::UNIFORM_BUFFER, push_constant_buffer);
        ctx.buffer_data_size(
            glow::UNIFORM_BUFFER,
            PUSH_CONSTANT_SIZE as i32,
            glow::DYNAMIC_DRAW,
        );
        ctx.bind_buffer_range(
            glow::UNIFORM_BUFFER,
            PUSH_CONSTANT_BINDING,
            push_constant_buffer,
            0,
            PUSH_CONSTANT_SIZE as i32,
        );

        let scratch_read_fbo = ctx.create_framebuffer().map_err(init)?;
        let scratch_draw_fbo = ctx.create_framebuffer().map_err(init)?;

        Ok(Self {
            state: Rc::new(RefCell::new(GlDeviceState {
                ctx,
                buffers: SlotMap::with_key(),
                images: SlotMap::with_key(),
                views: SlotMap::with_key(),
                samplers: SlotMap::with_key(),
                shader_modules: SlotMap::with_key(),
                render_passes: SlotMap::with_key(),
                framebuffers: SlotMap::with_key(),
                set_layouts: SlotMap::with_key(),
                descriptor_sets: SlotMap::with_key(),
                pipeline_layouts: SlotMap::with_key(),
                pipelines: SlotMap::with_key(),
                fences: SlotMap::with_key(),
                semaphores: SlotMap::with_key(),
                query_pools: SlotMap::with_key(),
                push_constant_buffer,
                scratch_read_fbo,
                scratch_draw_fbo,
            })),
        })
    }

    /// The device's single queue
    pub fn queue(&self) -> GlQueue {
        GlQueue::new(Rc::clone(&self.state))
    }

    /// Create a buffer with immutable size
    pub fn create_buffer(&self, info: &BufferCreateInfo) -> AshesResult<BufferHandle> {
        let mut state = self.state.borrow_mut();
        let name = state.ctx.create_buffer().map_err(backend)?;
        state.ctx.bind_buffer(glow::COPY_WRITE_BUFFER, name);
        state.ctx.buffer_data_size(
            glow::COPY_WRITE_BUFFER,
            info.size as i32,
            convert::buffer_usage_hint(info.usage),
        );
        state.ctx.bind_buffer(glow::COPY_WRITE_BUFFER, 0);
        Ok(state.buffers.insert(GlBuffer {
            name,
            size: info.size,
        }))
    }

    /// Write bytes into a buffer at `offset`
    pub fn upload_buffer(&self, buffer: BufferHandle, offset: u64, data: &[u8]) -> AshesResult<()> {
        let state = self.state.borrow();
        let entry = state
            .buffers
            .get(buffer)
            .ok_or(AshesError::ResourceLost { what: "buffer" })?;
        state.ctx.bind_buffer(glow::COPY_WRITE_BUFFER, entry.name);
        state
            .ctx
            .buffer_sub_data(glow::COPY_WRITE_BUFFER, offset as i32, data);
        state.ctx.bind_buffer(glow::COPY_WRITE_BUFFER, 0);
        Ok(())
    }

    /// Destroy a buffer; the handle becomes stale
    pub fn destroy_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.buffers.remove(buffer) {
            state.ctx.delete_buffer(entry.name);
        }
    }

    /// Create a 2D image with immutable storage
    pub fn create_image(&self, info: &ImageCreateInfo) -> AshesResult<ImageHandle> {
        let mut state = self.state.borrow_mut();
        let name = state.ctx.create_texture().map_err(backend)?;
        let (internal, _, _) = convert::texture_format(info.format);
        let samples = info.samples.count();
        let target = if samples > 1 {
            glow::TEXTURE_2D_MULTISAMPLE
        } else {
            glow::TEXTURE_2D
        };
        state.ctx.bind_texture(target, name);
        if samples > 1 {
            state.ctx.tex_image_2d_multisample(
                target,
                samples as i32,
                internal,
                info.extent.width as i32,
                info.extent.height as i32,
            );
        } else {
            state.ctx.tex_storage_2d(
                target,
                info.mip_levels as i32,
                internal,
                info.extent.width as i32,
                info.extent.height as i32,
            );
        }
        state.ctx.bind_texture(target, 0);
        Ok(state.images.insert(GlImage {
            name,
            target,
            format: info.format,
            width: info.extent.width,
            height: info.extent.height,
        }))
    }

    /// Destroy an image; views over it become dangling and must not be used
    pub fn destroy_image(&self, image: ImageHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.images.remove(image) {
            state.ctx.delete_texture(entry.name);
        }
    }

    /// Create a view over an image's mip range
    pub fn create_image_view(
        &self,
        image: ImageHandle,
        info: &ImageViewCreateInfo,
    ) -> AshesResult<ImageViewHandle> {
        let mut state = self.state.borrow_mut();
        let entry = state
            .images
            .get(image)
            .ok_or(AshesError::ResourceLost { what: "image" })?;
        let extent = Extent2D::new(
            (entry.width >> info.base_mip_level).max(1),
            (entry.height >> info.base_mip_level).max(1),
        );
        let view = GlImageView {
            texture: entry.name,
            target: entry.target,
            format: info.format,
            extent,
            base_mip_level: info.base_mip_level,
        };
        Ok(state.views.insert(view))
    }

    /// Create a sampler
    pub fn create_sampler(&self, info: &SamplerCreateInfo) -> AshesResult<SamplerHandle> {
        let mut state = self.state.borrow_mut();
        let name = state.ctx.create_sampler().map_err(backend)?;
        state
            .ctx
            .sampler_parameter_i32(name, glow::TEXTURE_MAG_FILTER, convert::filter(info.mag_filter));
        state
            .ctx
            .sampler_parameter_i32(name, glow::TEXTURE_MIN_FILTER, convert::filter(info.min_filter));
        state
            .ctx
            .sampler_parameter_i32(name, glow::TEXTURE_WRAP_S, convert::wrap_mode(info.wrap_u));
        state
            .ctx
            .sampler_parameter_i32(name, glow::TEXTURE_WRAP_T, convert::wrap_mode(info.wrap_v));
        Ok(state.samplers.insert(name))
    }

    /// Compile a GLSL shader module
    ///
    /// SPIR-V modules are rejected; on GL the crate consumes GLSL text.
    pub fn create_shader_module(
        &self,
        info: &ShaderModuleCreateInfo,
    ) -> AshesResult<ShaderModuleHandle> {
        let source = match &info.source {
            ShaderSource::Glsl(source) => source,
            ShaderSource::SpirV(_) => {
                return Err(AshesError::Backend(
                    "the GL backend consumes GLSL source; SPIR-V requires the Vulkan backend"
                        .into(),
                ))
            }
        };
        let shader_type = convert::shader_type(info.stage).ok_or(AshesError::Configuration {
            reason: format!("shader module must declare exactly one stage, got {:?}", info.stage),
        })?;

        let mut state = self.state.borrow_mut();
        let shader = state.ctx.create_shader(shader_type).map_err(backend)?;
        state.ctx.shader_source(shader, source);
        state.ctx.compile_shader(shader);
        if !state.ctx.get_shader_compile_status(shader) {
            let log = state.ctx.get_shader_info_log(shader);
            state.ctx.delete_shader(shader);
            return Err(AshesError::Configuration {
                reason: format!("shader compilation failed: {log}"),
            });
        }
        Ok(state.shader_modules.insert(GlShaderModule {
            shader,
            stage: info.stage,
        }))
    }

    /// Validate and register a render pass
    pub fn create_render_pass(&self, info: RenderPassCreateInfo) -> AshesResult<RenderPassHandle> {
        let pass = RenderPass::new(info)?;
        Ok(self.state.borrow_mut().render_passes.insert(pass))
    }

    /// Register a descriptor set layout
    pub fn create_descriptor_set_layout(
        &self,
        info: DescriptorSetLayoutCreateInfo,
    ) -> AshesResult<DescriptorSetLayoutHandle> {
        Ok(self.state.borrow_mut().set_layouts.insert(info))
    }

    /// Allocate an empty descriptor set against a layout
    pub fn allocate_descriptor_set(
        &self,
        layout: DescriptorSetLayoutHandle,
    ) -> AshesResult<DescriptorSetHandle> {
        let mut state = self.state.borrow_mut();
        if !state.set_layouts.contains_key(layout) {
            return Err(AshesError::ResourceLost {
                what: "descriptor set layout",
            });
        }
        Ok(state.descriptor_sets.insert(Vec::new()))
    }

    /// Write or overwrite bindings in a descriptor set
    pub fn update_descriptor_set(
        &self,
        set: DescriptorSetHandle,
        writes: &[WriteDescriptorSet],
    ) -> AshesResult<()> {
        let mut state = self.state.borrow_mut();
        let stored = state
            .descriptor_sets
            .get_mut(set)
            .ok_or(AshesError::ResourceLost {
                what: "descriptor set",
            })?;
        for write in writes {
            match stored.iter_mut().find(|w| w.binding() == write.binding()) {
                Some(slot) => *slot = *write,
                None => stored.push(*write),
            }
        }
        Ok(())
    }

    /// Register a pipeline layout
    pub fn create_pipeline_layout(
        &self,
        info: PipelineLayoutCreateInfo,
    ) -> AshesResult<PipelineLayoutHandle> {
        Ok(self.state.borrow_mut().pipeline_layouts.insert(info))
    }

    /// Link a graphics pipeline's program and freeze its state bundle
    pub fn create_graphics_pipeline(
        &self,
        info: GraphicsPipelineCreateInfo,
    ) -> AshesResult<PipelineHandle> {
        let mut state = self.state.borrow_mut();
        let program = state.ctx.create_program().map_err(backend)?;
        for &stage in &info.stages {
            let module = state
                .shader_modules
                .get(stage)
                .ok_or(AshesError::ResourceLost {
                    what: "shader module",
                })?;
            state.ctx.attach_shader(program, module.shader);
        }
        state.ctx.link_program(program);
        if !state.ctx.get_program_link_status(program) {
            let log = state.ctx.get_program_info_log(program);
            state.ctx.delete_program(program);
            return Err(AshesError::Configuration {
                reason: format!("program link failed: {log}"),
            });
        }
        Ok(state.pipelines.insert(GlPipeline { program, info }))
    }

    /// Destroy a pipeline; the handle becomes stale
    pub fn destroy_pipeline(&self, pipeline: PipelineHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.pipelines.remove(pipeline) {
            state.ctx.delete_program(entry.program);
        }
    }

    /// Bind views to a render pass's attachment slots and build the FBO
    pub fn create_framebuffer(
        &self,
        render_pass: RenderPassHandle,
        views: &[ImageViewHandle],
        extent: Extent2D,
    ) -> AshesResult<Framebuffer> {
        let mut state = self.state.borrow_mut();
        let pass = state
            .render_passes
            .get(render_pass)
            .ok_or(AshesError::ResourceLost { what: "render pass" })?;

        let mut descs = Vec::with_capacity(views.len());
        for &view in views {
            let view = state
                .views
                .get(view)
                .ok_or(AshesError::ResourceLost { what: "image view" })?;
            descs.push(AttachmentViewDesc {
                format: view.format,
                extent: view.extent,
            });
        }
        validate_framebuffer(pass, extent, &descs)?;

        let name = state.ctx.create_framebuffer().map_err(backend)?;
        state.ctx.bind_framebuffer(glow::FRAMEBUFFER, name);
        let mut attachments = Vec::with_capacity(views.len());
        let mut color_index = 0u32;
        for &handle in views {
            let view = &state.views[handle];
            let aspects = view.format.aspects();
            let (attachment, index) = if view.format.is_color() {
                let slot = glow::COLOR_ATTACHMENT0 + color_index;
                color_index += 1;
                (slot, Some(color_index - 1))
            } else if view.format.is_depth() && view.format.is_stencil() {
                (glow::DEPTH_STENCIL_ATTACHMENT, None)
            } else if view.format.is_depth() {
                (glow::DEPTH_ATTACHMENT, None)
            } else {
                (glow::STENCIL_ATTACHMENT, None)
            };
            debug_assert!(!aspects.is_empty());
            state.ctx.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                attachment,
                view.target,
                view.texture,
                view.base_mip_level as i32,
            );
            attachments.push(GlFbAttachment {
                texture: view.texture,
                target: view.target,
                format: view.format,
                mip_level: view.base_mip_level,
                color_index: index,
            });
        }
        let status = state.ctx.check_framebuffer_status(glow::FRAMEBUFFER);
        state.ctx.bind_framebuffer(glow::FRAMEBUFFER, 0);
        if status != glow::FRAMEBUFFER_COMPLETE {
            state.ctx.delete_framebuffer(name);
            return Err(AshesError::Backend(format!(
                "framebuffer incomplete: {status:#x}"
            )));
        }

        let handle = state.framebuffers.insert(GlFramebuffer {
            name,
            extent,
            attachments,
        });
        debug!("created framebuffer {name} ({}x{})", extent.width, extent.height);
        Ok(Framebuffer::new(handle, views.len(), extent))
    }

    /// Destroy a framebuffer; its handle becomes stale
    pub fn destroy_framebuffer(&self, framebuffer: &Framebuffer) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.framebuffers.remove(framebuffer.handle()) {
            if entry.name != 0 {
                state.ctx.delete_framebuffer(entry.name);
            }
        }
    }

    /// Create an unsignaled fence
    pub fn create_fence(&self) -> FenceHandle {
        self.state.borrow_mut().fences.insert(GlFence { sync: None })
    }

    /// Return a fence to the unsignaled state
    pub fn reset_fence(&self, fence: FenceHandle) -> AshesResult<()> {
        let mut state = self.state.borrow_mut();
        let sync = {
            let entry = state
                .fences
                .get_mut(fence)
                .ok_or(AshesError::ResourceLost { what: "fence" })?;
            entry.sync.take()
        };
        if let Some(sync) = sync {
            state.ctx.delete_sync(sync);
        }
        Ok(())
    }

    /// Block until the fence signals or `timeout_ns` elapses
    ///
    /// A fence that has never been submitted cannot signal: a finite wait
    /// times out, an infinite wait (`u64::MAX`) reports `Error` rather than
    /// blocking forever.
    pub fn wait_for_fence(&self, fence: FenceHandle, timeout_ns: u64) -> AshesResult<WaitResult> {
        let state = self.state.borrow();
        let entry = state
            .fences
            .get(fence)
            .ok_or(AshesError::ResourceLost { what: "fence" })?;
        let Some(sync) = entry.sync else {
            return Ok(if timeout_ns == u64::MAX {
                WaitResult::Error
            } else {
                WaitResult::TimedOut
            });
        };
        let timeout = timeout_ns.min(i32::MAX as u64) as i32;
        let status = state
            .ctx
            .client_wait_sync(sync, glow::SYNC_FLUSH_COMMANDS_BIT, timeout);
        Ok(match status {
            glow::ALREADY_SIGNALED | glow::CONDITION_SATISFIED => WaitResult::Success,
            glow::TIMEOUT_EXPIRED => WaitResult::TimedOut,
            _ => WaitResult::Error,
        })
    }

    /// Create a semaphore (host-side ordering marker on GL)
    pub fn create_semaphore(&self) -> SemaphoreHandle {
        self.state
            .borrow_mut()
            .semaphores
            .insert(GlSemaphore { signaled: false })
    }

    /// Create a pool of `count` timestamp queries
    pub fn create_query_pool(&self, count: u32) -> AshesResult<QueryPoolHandle> {
        let mut state = self.state.borrow_mut();
        let mut queries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            queries.push(state.ctx.create_query().map_err(backend)?);
        }
        Ok(state.query_pools.insert(queries))
    }

    /// Read back one query's timestamp
    pub fn get_query_result(&self, pool: QueryPoolHandle, query: u32) -> AshesResult<u64> {
        let state = self.state.borrow();
        let queries = state
            .query_pools
            .get(pool)
            .ok_or(AshesError::ResourceLost { what: "query pool" })?;
        let name = queries
            .get(query as usize)
            .copied()
            .ok_or(AshesError::Configuration {
                reason: format!("query {query} out of range (pool size {})", queries.len()),
            })?;
        Ok(state.ctx.get_query_result(name))
    }

    /// Wrap the default framebuffer as the presentation target
    pub fn create_swapchain(
        &self,
        render_pass: RenderPassHandle,
        extent: Extent2D,
    ) -> AshesResult<GlSwapchain> {
        let mut state = self.state.borrow_mut();
        let attachment_count = state
            .render_passes
            .get(render_pass)
            .ok_or(AshesError::ResourceLost { what: "render pass" })?
            .attachment_count();
        let handle = state.framebuffers.insert(GlFramebuffer {
            name: 0,
            extent,
            attachments: Vec::new(),
        });
        Ok(GlSwapchain::new(
            Rc::clone(&self.state),
            Framebuffer::new(handle, attachment_count, extent),
        ))
    }

    pub(crate) fn state(&self) -> Rc<RefCell<GlDeviceState>> {
        Rc::clone(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        AttachmentDescription, AttachmentReference, BufferUsageFlags, ImageLayout,
        ImageUsageFlags, SubpassDescription,
    };
    use crate::gl::CaptureContext;

    fn device() -> GlDevice {
        GlDevice::new(Rc::new(CaptureContext::new())).unwrap()
    }

    #[test]
    fn stale_buffer_handle_is_resource_lost() {
        let device = device();
        let buffer = device
            .create_buffer(&BufferCreateInfo {
                size: 64,
                usage: BufferUsageFlags::VERTEX_BUFFER,
            })
            .unwrap();
        device.destroy_buffer(buffer);
        let err = device.upload_buffer(buffer, 0, &[0u8; 4]).unwrap_err();
        assert!(matches!(err, AshesError::ResourceLost { what: "buffer" }));
    }

    #[test]
    fn spirv_module_is_rejected() {
        let device = device();
        let err = device
            .create_shader_module(&ShaderModuleCreateInfo::spirv(
                ShaderStageFlags::VERTEX,
                vec![0x0723_0203],
            ))
            .unwrap_err();
        assert!(matches!(err, AshesError::Backend(_)));
    }

    #[test]
    fn framebuffer_view_count_is_validated() {
        let device = device();
        let pass = device
            .create_render_pass(RenderPassCreateInfo {
                attachments: vec![AttachmentDescription::color_clear_store(
                    Format::Rgba8Unorm,
                    ImageLayout::PresentSrc,
                )],
                subpasses: vec![SubpassDescription {
                    color_attachments: vec![AttachmentReference::color(0)],
                    ..Default::default()
                }],
                dependencies: vec![],
            })
            .unwrap();
        let err = device
            .create_framebuffer(pass, &[], Extent2D::new(8, 8))
            .unwrap_err();
        assert!(matches!(err, AshesError::Configuration { .. }));
    }

    #[test]
    fn unsubmitted_fence_waits_per_contract() {
        let device = device();
        let fence = device.create_fence();
        assert_eq!(
            device.wait_for_fence(fence, 1_000_000).unwrap(),
            WaitResult::TimedOut
        );
        assert_eq!(
            device.wait_for_fence(fence, u64::MAX).unwrap(),
            WaitResult::Error
        );
    }

    #[test]
    fn image_view_extent_tracks_mip_level() {
        let device = device();
        let image = device
            .create_image(&ImageCreateInfo {
                format: Format::Rgba8Unorm,
                extent: crate::core::Extent3D {
                    width: 64,
                    height: 32,
                    depth: 1,
                },
                mip_levels: 4,
                samples: crate::core::SampleCount::X1,
                usage: ImageUsageFlags::SAMPLED,
            })
            .unwrap();
        let view = device
            .create_image_view(
                image,
                &ImageViewCreateInfo {
                    format: Format::Rgba8Unorm,
                    aspects: Format::Rgba8Unorm.aspects(),
                    base_mip_level: 2,
                    level_count: 1,
                },
            )
            .unwrap();
        let state = device.state();
        let state = state.borrow();
        assert_eq!(state.views[view].extent, Extent2D::new(16, 8));
    }
}
