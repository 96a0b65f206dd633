//! Command replay against the GL state machine
//!
//! `submit` walks the recorded command list in order and translates each
//! command into native calls, bridging the deferred recording model onto
//! GL's immediate, global-state API. Replay state (current pass, pipeline,
//! vertex/index bindings) lives on the stack for the duration of one
//! submission; nothing is assumed about GL state left over from earlier
//! submissions except the device VAO and push-constant binding.
//!
//! Failure semantics: a stale handle aborts the submission with
//! `ResourceLost`; a structurally malformed recording (a draw with no
//! bound pipeline, a missing vertex buffer) is skipped with a debug log
//! and produces undefined output, never a panic.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::core::{
    AshesError, AshesResult, AttachmentLoadOp, AttachmentStoreOp, ClearColorValue, ClearValue,
    Command, CommandBuffer, CommandBufferState, FenceHandle, FramebufferHandle, ImageAspectFlags,
    IndexType, PipelineHandle, PrimitiveTopology, RenderPassHandle, SemaphoreHandle,
    VertexInputRate,
};

use super::api::GlContext;
use super::convert;
use super::device::{GlDeviceState, GlFramebuffer};

/// The device's submission queue
///
/// One per device; `submit` executes synchronously on the context thread.
pub struct GlQueue {
    state: Rc<RefCell<GlDeviceState>>,
}

impl GlQueue {
    pub(crate) fn new(state: Rc<RefCell<GlDeviceState>>) -> Self {
        Self { state }
    }

    /// Replay executable command buffers in order
    ///
    /// `waits` are checked for host-side ordering (GL work is already
    /// ordered by the single context thread) and consumed; `signals` are
    /// marked signaled once replay returns. A supplied fence receives a
    /// native sync object inserted after the last command.
    pub fn submit(
        &self,
        buffers: &[&CommandBuffer],
        waits: &[SemaphoreHandle],
        signals: &[SemaphoreHandle],
        fence: Option<FenceHandle>,
    ) -> AshesResult<()> {
        let mut state = self.state.borrow_mut();

        for buffer in buffers {
            if buffer.state() != CommandBufferState::Executable {
                return Err(AshesError::InvalidCommandBufferState {
                    expected: CommandBufferState::Executable.name(),
                    actual: buffer.state().name(),
                });
            }
        }

        for &wait in waits {
            let semaphore = state
                .semaphores
                .get_mut(wait)
                .ok_or(AshesError::ResourceLost { what: "semaphore" })?;
            if !semaphore.signaled {
                // Host ordering already guarantees the dependency on GL.
                debug!("waiting on an unsignaled semaphore; continuing (host-ordered)");
            }
            semaphore.signaled = false;
        }

        {
            let mut replay = Replayer::new(&state);
            for buffer in buffers {
                for command in buffer.commands() {
                    replay.execute(command)?;
                }
            }
        }

        for &signal in signals {
            state
                .semaphores
                .get_mut(signal)
                .ok_or(AshesError::ResourceLost { what: "semaphore" })?
                .signaled = true;
        }

        if let Some(fence) = fence {
            let sync = state
                .ctx
                .fence_sync()
                .map_err(AshesError::Backend)?;
            let old = {
                let entry = state
                    .fences
                    .get_mut(fence)
                    .ok_or(AshesError::ResourceLost { what: "fence" })?;
                entry.sync.replace(sync)
            };
            if let Some(old) = old {
                state.ctx.delete_sync(old);
            }
        }

        for buffer in buffers {
            buffer.mark_submitted();
        }
        Ok(())
    }

    /// Block until all submitted work completes
    pub fn wait_idle(&self) -> AshesResult<()> {
        let state = self.state.borrow();
        let sync = state.ctx.fence_sync().map_err(AshesError::Backend)?;
        state
            .ctx
            .client_wait_sync(sync, glow::SYNC_FLUSH_COMMANDS_BIT, i32::MAX);
        state.ctx.delete_sync(sync);
        Ok(())
    }
}

struct ActivePass {
    render_pass: RenderPassHandle,
    framebuffer: FramebufferHandle,
    subpass: usize,
}

struct Replayer<'a> {
    state: &'a GlDeviceState,
    pass: Option<ActivePass>,
    pipeline: Option<PipelineHandle>,
    index: Option<(u64, IndexType)>,
    vertex_buffers: HashMap<u32, (u32, u64)>,
    layout_dirty: bool,
}

impl<'a> Replayer<'a> {
    fn new(state: &'a GlDeviceState) -> Self {
        Self {
            state,
            pass: None,
            pipeline: None,
            index: None,
            vertex_buffers: HashMap::new(),
            layout_dirty: false,
        }
    }

    fn ctx(&self) -> &dyn GlContext {
        self.state.ctx.as_ref()
    }

    fn execute(&mut self, command: &Command) -> AshesResult<()> {
        match command {
            Command::BeginRenderPass {
                render_pass,
                framebuffer,
                clear_values,
                ..
            } => self.begin_render_pass(*render_pass, *framebuffer, clear_values),
            Command::NextSubpass { .. } => self.next_subpass(),
            Command::EndRenderPass => self.end_render_pass(),
            Command::BindPipeline { pipeline, .. } => self.bind_pipeline(*pipeline),
            Command::BindDescriptorSet { set, .. } => self.bind_descriptor_set(*set),
            Command::BindVertexBuffers {
                first_binding,
                buffers,
            } => self.bind_vertex_buffers(*first_binding, buffers),
            Command::BindIndexBuffer {
                buffer,
                offset,
                index_type,
            } => self.bind_index_buffer(*buffer, *offset, *index_type),
            Command::SetViewport { viewport } => {
                self.ctx().viewport(
                    viewport.x as i32,
                    viewport.y as i32,
                    viewport.width as i32,
                    viewport.height as i32,
                );
                Ok(())
            }
            Command::SetScissor { scissor } => {
                self.ctx().enable(glow::SCISSOR_TEST);
                self.ctx().scissor(
                    scissor.offset.x,
                    scissor.offset.y,
                    scissor.extent.width as i32,
                    scissor.extent.height as i32,
                );
                Ok(())
            }
            Command::PushConstants { offset, data, .. } => {
                let ctx = self.ctx();
                ctx.bind_buffer(glow::UNIFORM_BUFFER, self.state.push_constant_buffer);
                ctx.buffer_sub_data(glow::UNIFORM_BUFFER, *offset as i32, data);
                ctx.bind_buffer(glow::UNIFORM_BUFFER, 0);
                Ok(())
            }
            Command::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => self.draw(*vertex_count, *instance_count, *first_vertex, *first_instance),
            Command::DrawIndexed {
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            } => self.draw_indexed(
                *index_count,
                *instance_count,
                *first_index,
                *vertex_offset,
                *first_instance,
            ),
            Command::CopyBuffer { src, dst, regions } => self.copy_buffer(*src, *dst, regions),
            Command::CopyBufferToImage { src, dst, regions } => {
                self.copy_buffer_to_image(*src, *dst, regions)
            }
            Command::CopyImage { src, dst, regions } => self.copy_image(*src, *dst, regions),
            Command::PipelineBarrier {
                memory_barriers,
                buffer_barriers,
                image_barriers,
                ..
            } => {
                let mut bits = 0;
                for barrier in memory_barriers {
                    bits |= convert::barrier_bits(barrier.dst_access_mask);
                }
                for barrier in buffer_barriers {
                    bits |= convert::barrier_bits(barrier.dst_access_mask);
                }
                for barrier in image_barriers {
                    bits |= convert::barrier_bits(barrier.dst_access_mask);
                }
                if bits != 0 {
                    self.ctx().memory_barrier(bits);
                }
                Ok(())
            }
            Command::WriteTimestamp { pool, query, .. } => {
                let queries = self
                    .state
                    .query_pools
                    .get(*pool)
                    .ok_or(AshesError::ResourceLost { what: "query pool" })?;
                match queries.get(*query as usize) {
                    Some(&name) => self.ctx().query_counter(name),
                    None => debug!("timestamp query {query} out of range; skipped"),
                }
                Ok(())
            }
            Command::ResetQueryPool { pool, .. } => {
                // GL queries reset implicitly on the next QueryCounter.
                if !self.state.query_pools.contains_key(*pool) {
                    return Err(AshesError::ResourceLost { what: "query pool" });
                }
                Ok(())
            }
            Command::ClearColorImage { image, color } => self.clear_color_image(*image, *color),
            Command::ClearDepthStencilImage {
                image,
                depth,
                stencil,
                aspects,
            } => self.clear_depth_stencil_image(*image, *depth, *stencil, *aspects),
        }
    }

    // render pass handling

    fn begin_render_pass(
        &mut self,
        render_pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        clear_values: &[ClearValue],
    ) -> AshesResult<()> {
        let pass = self
            .state
            .render_passes
            .get(render_pass)
            .ok_or(AshesError::ResourceLost { what: "render pass" })?;
        let fb = self
            .state
            .framebuffers
            .get(framebuffer)
            .ok_or(AshesError::ResourceLost { what: "framebuffer" })?;

        let ctx = self.ctx();
        ctx.bind_framebuffer(glow::FRAMEBUFFER, fb.name);

        if fb.name == 0 {
            // Default framebuffer: one glClear with an accumulated mask.
            let mut mask = 0;
            for (slot, attachment) in pass.attachments().iter().enumerate() {
                let clear = clear_values.get(slot);
                if attachment.format.is_color() && attachment.load_op == AttachmentLoadOp::Clear {
                    if let Some(ClearValue::Color(ClearColorValue::Float(c))) = clear {
                        ctx.color_mask(true, true, true, true);
                        ctx.clear_color(c[0], c[1], c[2], c[3]);
                        mask |= glow::COLOR_BUFFER_BIT;
                    } else {
                        debug!("integer clear on the default framebuffer; skipped");
                    }
                }
                if attachment.format.is_depth() && attachment.load_op == AttachmentLoadOp::Clear {
                    if let Some(ClearValue::DepthStencil { depth, .. }) = clear {
                        ctx.depth_mask(true);
                        ctx.clear_depth(*depth);
                        mask |= glow::DEPTH_BUFFER_BIT;
                    }
                }
                if attachment.format.is_stencil()
                    && attachment.stencil_load_op == AttachmentLoadOp::Clear
                {
                    if let Some(ClearValue::DepthStencil { stencil, .. }) = clear {
                        ctx.stencil_mask_separate(glow::FRONT_AND_BACK, u32::MAX);
                        ctx.clear_stencil(*stencil as i32);
                        mask |= glow::STENCIL_BUFFER_BIT;
                    }
                }
            }
            if mask != 0 {
                ctx.clear(mask);
            }
        } else {
            // FBO: per-attachment buffer clears with write masks forced on.
            let all_color: Vec<u32> = fb
                .attachments
                .iter()
                .filter_map(|a| a.color_index)
                .map(|i| glow::COLOR_ATTACHMENT0 + i)
                .collect();
            if !all_color.is_empty() {
                ctx.draw_buffers(&all_color);
            }
            for (slot, (entry, decl)) in
                fb.attachments.iter().zip(pass.attachments()).enumerate()
            {
                let clear = clear_values.get(slot);
                if decl.format.is_color() && decl.load_op == AttachmentLoadOp::Clear {
                    let Some(index) = entry.color_index else { continue };
                    let Some(ClearValue::Color(color)) = clear else {
                        debug!("missing color clear value for attachment {slot}; skipped");
                        continue;
                    };
                    ctx.color_mask(true, true, true, true);
                    match color {
                        ClearColorValue::Float(v) => ctx.clear_buffer_f32(glow::COLOR, index, v),
                        ClearColorValue::Int(v) => ctx.clear_buffer_i32(glow::COLOR, index, v),
                        ClearColorValue::Uint(v) => ctx.clear_buffer_u32(glow::COLOR, index, v),
                    }
                } else if !decl.format.is_color() {
                    let Some(ClearValue::DepthStencil { depth, stencil }) = clear else {
                        continue;
                    };
                    let clear_depth =
                        decl.format.is_depth() && decl.load_op == AttachmentLoadOp::Clear;
                    let clear_stencil = decl.format.is_stencil()
                        && decl.stencil_load_op == AttachmentLoadOp::Clear;
                    if clear_depth {
                        ctx.depth_mask(true);
                    }
                    if clear_stencil {
                        ctx.stencil_mask_separate(glow::FRONT_AND_BACK, u32::MAX);
                    }
                    if clear_depth && clear_stencil {
                        ctx.clear_buffer_depth_stencil(
                            glow::DEPTH_STENCIL,
                            0,
                            *depth,
                            *stencil as i32,
                        );
                    } else if clear_depth {
                        ctx.clear_buffer_f32(glow::DEPTH, 0, &[*depth]);
                    } else if clear_stencil {
                        ctx.clear_buffer_i32(glow::STENCIL, 0, &[*stencil as i32]);
                    }
                }
            }
            self.apply_draw_buffers(fb, render_pass, 0)?;
        }

        self.pass = Some(ActivePass {
            render_pass,
            framebuffer,
            subpass: 0,
        });
        Ok(())
    }

    fn next_subpass(&mut self) -> AshesResult<()> {
        let Some(pass) = self.pass.as_mut() else {
            debug!("NextSubpass outside a render pass; skipped");
            return Ok(());
        };
        let (render_pass, framebuffer, subpass) =
            (pass.render_pass, pass.framebuffer, pass.subpass);
        self.resolve_subpass(render_pass, framebuffer, subpass)?;
        let next = subpass + 1;
        if let Some(pass) = self.pass.as_mut() {
            pass.subpass = next;
        }
        let fb = self
            .state
            .framebuffers
            .get(framebuffer)
            .ok_or(AshesError::ResourceLost { what: "framebuffer" })?;
        if fb.name != 0 {
            self.apply_draw_buffers(fb, render_pass, next)?;
        }
        Ok(())
    }

    fn end_render_pass(&mut self) -> AshesResult<()> {
        let Some(pass) = self.pass.take() else {
            debug!("EndRenderPass outside a render pass; skipped");
            return Ok(());
        };
        self.resolve_subpass(pass.render_pass, pass.framebuffer, pass.subpass)?;

        let rp = self
            .state
            .render_passes
            .get(pass.render_pass)
            .ok_or(AshesError::ResourceLost { what: "render pass" })?;
        let fb = self
            .state
            .framebuffers
            .get(pass.framebuffer)
            .ok_or(AshesError::ResourceLost { what: "framebuffer" })?;

        // Store-op DontCare lets the driver drop tile memory.
        let mut discard = Vec::new();
        for (slot, decl) in rp.attachments().iter().enumerate() {
            let dont_store = decl.store_op == AttachmentStoreOp::DontCare;
            let dont_store_stencil = decl.stencil_store_op == AttachmentStoreOp::DontCare;
            if fb.name == 0 {
                if decl.format.is_color() && dont_store {
                    discard.push(glow::COLOR);
                }
                if decl.format.is_depth() && dont_store {
                    discard.push(glow::DEPTH);
                }
                if decl.format.is_stencil() && dont_store_stencil {
                    discard.push(glow::STENCIL);
                }
            } else if let Some(entry) = fb.attachments.get(slot) {
                if decl.format.is_color() && dont_store {
                    if let Some(index) = entry.color_index {
                        discard.push(glow::COLOR_ATTACHMENT0 + index);
                    }
                }
                if decl.format.is_depth() && dont_store {
                    discard.push(glow::DEPTH_ATTACHMENT);
                }
                if decl.format.is_stencil() && dont_store_stencil {
                    discard.push(glow::STENCIL_ATTACHMENT);
                }
            }
        }
        if !discard.is_empty() {
            self.ctx().invalidate_framebuffer(glow::FRAMEBUFFER, &discard);
        }
        self.ctx().bind_framebuffer(glow::FRAMEBUFFER, 0);
        Ok(())
    }

    /// Map a subpass's color references onto GL draw buffers
    fn apply_draw_buffers(
        &self,
        fb: &GlFramebuffer,
        render_pass: RenderPassHandle,
        subpass: usize,
    ) -> AshesResult<()> {
        let rp = self
            .state
            .render_passes
            .get(render_pass)
            .ok_or(AshesError::ResourceLost { what: "render pass" })?;
        let Some(desc) = rp.subpasses().get(subpass) else {
            debug!("subpass {subpass} out of range; draw buffers unchanged");
            return Ok(());
        };
        let buffers: Vec<u32> = desc
            .color_attachments
            .iter()
            .map(|r| {
                fb.attachments
                    .get(r.attachment as usize)
                    .and_then(|a| a.color_index)
                    .map_or(glow::NONE, |i| glow::COLOR_ATTACHMENT0 + i)
            })
            .collect();
        if !buffers.is_empty() {
            self.ctx().draw_buffers(&buffers);
        }
        Ok(())
    }

    /// Blit each color attachment to its resolve target through scratch FBOs
    fn resolve_subpass(
        &self,
        render_pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        subpass: usize,
    ) -> AshesResult<()> {
        let rp = self
            .state
            .render_passes
            .get(render_pass)
            .ok_or(AshesError::ResourceLost { what: "render pass" })?;
        let fb = self
            .state
            .framebuffers
            .get(framebuffer)
            .ok_or(AshesError::ResourceLost { what: "framebuffer" })?;
        let Some(desc) = rp.subpasses().get(subpass) else {
            return Ok(());
        };
        if desc.resolve_attachments.is_empty() || fb.name == 0 {
            return Ok(());
        }

        let ctx = self.ctx();
        for (color, resolve) in desc
            .color_attachments
            .iter()
            .zip(&desc.resolve_attachments)
        {
            let (Some(src), Some(dst)) = (
                fb.attachments.get(color.attachment as usize),
                fb.attachments.get(resolve.attachment as usize),
            ) else {
                debug!("resolve pair out of range; skipped");
                continue;
            };
            ctx.bind_framebuffer(glow::READ_FRAMEBUFFER, self.state.scratch_read_fbo);
            ctx.framebuffer_texture_2d(
                glow::READ_FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                src.target,
                src.texture,
                src.mip_level as i32,
            );
            ctx.read_buffer(glow::COLOR_ATTACHMENT0);
            ctx.bind_framebuffer(glow::DRAW_FRAMEBUFFER, self.state.scratch_draw_fbo);
            ctx.framebuffer_texture_2d(
                glow::DRAW_FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                dst.target,
                dst.texture,
                dst.mip_level as i32,
            );
            ctx.draw_buffers(&[glow::COLOR_ATTACHMENT0]);
            let (w, h) = (fb.extent.width as i32, fb.extent.height as i32);
            ctx.blit_framebuffer(0, 0, w, h, 0, 0, w, h, glow::COLOR_BUFFER_BIT, glow::NEAREST);
        }
        // Put the pass framebuffer back for the next subpass's draws.
        ctx.bind_framebuffer(glow::FRAMEBUFFER, fb.name);
        Ok(())
    }

    // pipeline and binding state

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) -> AshesResult<()> {
        let entry = self
            .state
            .pipelines
            .get(pipeline)
            .ok_or(AshesError::ResourceLost { what: "pipeline" })?;
        let info = &entry.info;
        let ctx = self.ctx();

        ctx.use_program(entry.program);

        let raster = &info.rasterization;
        ctx.polygon_mode(convert::polygon_mode(raster.polygon_mode));
        match convert::cull_mode(raster.cull_mode) {
            Some(mode) => {
                ctx.enable(glow::CULL_FACE);
                ctx.cull_face(mode);
            }
            None => ctx.disable(glow::CULL_FACE),
        }
        ctx.front_face(convert::front_face(raster.front_face));
        ctx.line_width(raster.line_width);
        if raster.depth_clamp {
            ctx.enable(glow::DEPTH_CLAMP);
        } else {
            ctx.disable(glow::DEPTH_CLAMP);
        }
        match raster.depth_bias {
            Some((constant, slope)) => {
                ctx.enable(glow::POLYGON_OFFSET_FILL);
                ctx.polygon_offset(slope, constant);
            }
            None => ctx.disable(glow::POLYGON_OFFSET_FILL),
        }

        let ds = &info.depth_stencil;
        if ds.depth_test {
            ctx.enable(glow::DEPTH_TEST);
            ctx.depth_func(convert::compare_op(ds.depth_compare));
        } else {
            ctx.disable(glow::DEPTH_TEST);
        }
        ctx.depth_mask(ds.depth_write);
        if ds.stencil_test {
            ctx.enable(glow::STENCIL_TEST);
            for (face, s) in [(glow::FRONT, &ds.front), (glow::BACK, &ds.back)] {
                ctx.stencil_func_separate(
                    face,
                    convert::compare_op(s.compare_op),
                    s.reference as i32,
                    s.compare_mask,
                );
                ctx.stencil_op_separate(
                    face,
                    convert::stencil_op(s.fail_op),
                    convert::stencil_op(s.depth_fail_op),
                    convert::stencil_op(s.pass_op),
                );
                ctx.stencil_mask_separate(face, s.write_mask);
            }
        } else {
            ctx.disable(glow::STENCIL_TEST);
        }

        // GL blend state is global; attachment 0 drives it.
        let blend = &info.color_blend;
        match blend.attachments.first() {
            Some(a) if a.blend_enable => {
                ctx.enable(glow::BLEND);
                ctx.blend_func_separate(
                    convert::blend_factor(a.src_color),
                    convert::blend_factor(a.dst_color),
                    convert::blend_factor(a.src_alpha),
                    convert::blend_factor(a.dst_alpha),
                );
                ctx.blend_equation_separate(
                    convert::blend_op(a.color_op),
                    convert::blend_op(a.alpha_op),
                );
            }
            _ => ctx.disable(glow::BLEND),
        }
        let c = blend.blend_constants;
        ctx.blend_color(c[0], c[1], c[2], c[3]);
        if let Some(a) = blend.attachments.first() {
            use crate::core::ColorComponentFlags as C;
            ctx.color_mask(
                a.color_write_mask.contains(C::R),
                a.color_write_mask.contains(C::G),
                a.color_write_mask.contains(C::B),
                a.color_write_mask.contains(C::A),
            );
        }

        if info.multisample.alpha_to_coverage {
            ctx.enable(glow::SAMPLE_ALPHA_TO_COVERAGE);
        } else {
            ctx.disable(glow::SAMPLE_ALPHA_TO_COVERAGE);
        }

        if info.input_assembly.primitive_restart {
            ctx.enable(glow::PRIMITIVE_RESTART_FIXED_INDEX);
        } else {
            ctx.disable(glow::PRIMITIVE_RESTART_FIXED_INDEX);
        }
        if let PrimitiveTopology::PatchList { control_points } = info.input_assembly.topology {
            ctx.patch_parameter_i32(glow::PATCH_VERTICES, control_points as i32);
        }

        if let Some(viewport) = info.viewport {
            ctx.viewport(
                viewport.x as i32,
                viewport.y as i32,
                viewport.width as i32,
                viewport.height as i32,
            );
        }
        match info.scissor {
            Some(scissor) => {
                ctx.enable(glow::SCISSOR_TEST);
                ctx.scissor(
                    scissor.offset.x,
                    scissor.offset.y,
                    scissor.extent.width as i32,
                    scissor.extent.height as i32,
                );
            }
            None => ctx.disable(glow::SCISSOR_TEST),
        }

        self.pipeline = Some(pipeline);
        self.layout_dirty = true;
        Ok(())
    }

    fn bind_descriptor_set(&mut self, set: crate::core::DescriptorSetHandle) -> AshesResult<()> {
        use crate::core::WriteDescriptorSet;
        let writes = self
            .state
            .descriptor_sets
            .get(set)
            .ok_or(AshesError::ResourceLost {
                what: "descriptor set",
            })?;
        let ctx = self.ctx();
        for write in writes {
            match *write {
                WriteDescriptorSet::UniformBuffer {
                    binding,
                    buffer,
                    offset,
                    range,
                } => {
                    let name = self
                        .state
                        .buffers
                        .get(buffer)
                        .ok_or(AshesError::ResourceLost { what: "buffer" })?
                        .name;
                    ctx.bind_buffer_range(
                        glow::UNIFORM_BUFFER,
                        binding,
                        name,
                        offset as i32,
                        range as i32,
                    );
                }
                WriteDescriptorSet::StorageBuffer {
                    binding,
                    buffer,
                    offset,
                    range,
                } => {
                    let name = self
                        .state
                        .buffers
                        .get(buffer)
                        .ok_or(AshesError::ResourceLost { what: "buffer" })?
                        .name;
                    ctx.bind_buffer_range(
                        glow::SHADER_STORAGE_BUFFER,
                        binding,
                        name,
                        offset as i32,
                        range as i32,
                    );
                }
                WriteDescriptorSet::CombinedImageSampler {
                    binding,
                    view,
                    sampler,
                } => {
                    let view = self
                        .state
                        .views
                        .get(view)
                        .ok_or(AshesError::ResourceLost { what: "image view" })?;
                    let sampler = self
                        .state
                        .samplers
                        .get(sampler)
                        .copied()
                        .ok_or(AshesError::ResourceLost { what: "sampler" })?;
                    ctx.active_texture(binding);
                    ctx.bind_texture(view.target, view.texture);
                    ctx.bind_sampler(binding, sampler);
                }
            }
        }
        Ok(())
    }

    fn bind_vertex_buffers(
        &mut self,
        first_binding: u32,
        buffers: &[(crate::core::BufferHandle, u64)],
    ) -> AshesResult<()> {
        for (i, &(buffer, offset)) in buffers.iter().enumerate() {
            let name = self
                .state
                .buffers
                .get(buffer)
                .ok_or(AshesError::ResourceLost { what: "buffer" })?
                .name;
            self.vertex_buffers
                .insert(first_binding + i as u32, (name, offset));
        }
        self.layout_dirty = true;
        Ok(())
    }

    fn bind_index_buffer(
        &mut self,
        buffer: crate::core::BufferHandle,
        offset: u64,
        index_type: IndexType,
    ) -> AshesResult<()> {
        let name = self
            .state
            .buffers
            .get(buffer)
            .ok_or(AshesError::ResourceLost { what: "buffer" })?
            .name;
        self.ctx().bind_buffer(glow::ELEMENT_ARRAY_BUFFER, name);
        self.index = Some((offset, index_type));
        Ok(())
    }

    /// Apply the bound pipeline's vertex layout to the device VAO
    ///
    /// Deferred to draw time so binding order between pipeline and vertex
    /// buffers does not matter, matching the recording model.
    fn flush_vertex_layout(&mut self) -> Option<u32> {
        let pipeline = self.state.pipelines.get(self.pipeline?)?;
        let mode = convert::topology(pipeline.info.input_assembly.topology);
        if !self.layout_dirty {
            return Some(mode);
        }
        let ctx = self.state.ctx.as_ref();
        for attribute in &pipeline.info.vertex_input.attributes {
            let Some(binding) = pipeline
                .info
                .vertex_input
                .bindings
                .iter()
                .find(|b| b.binding == attribute.binding)
            else {
                debug!(
                    "attribute {} references undeclared binding {}; skipped",
                    attribute.location, attribute.binding
                );
                continue;
            };
            let Some(&(name, base_offset)) = self.vertex_buffers.get(&attribute.binding) else {
                debug!("no vertex buffer bound at binding {}; skipped", attribute.binding);
                continue;
            };
            ctx.bind_buffer(glow::ARRAY_BUFFER, name);
            ctx.enable_vertex_attrib_array(attribute.location);
            let fmt = convert::attribute_format(attribute.format);
            let offset = (base_offset + u64::from(attribute.offset)) as i32;
            if fmt.integer {
                ctx.vertex_attrib_pointer_i32(
                    attribute.location,
                    fmt.components,
                    fmt.data_type,
                    binding.stride as i32,
                    offset,
                );
            } else {
                ctx.vertex_attrib_pointer_f32(
                    attribute.location,
                    fmt.components,
                    fmt.data_type,
                    fmt.normalized,
                    binding.stride as i32,
                    offset,
                );
            }
            let divisor = match binding.input_rate {
                VertexInputRate::Vertex => 0,
                VertexInputRate::Instance => 1,
            };
            ctx.vertex_attrib_divisor(attribute.location, divisor);
        }
        self.layout_dirty = false;
        Some(mode)
    }

    // draws

    fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> AshesResult<()> {
        let Some(mode) = self.flush_vertex_layout() else {
            debug!("draw with no bound pipeline; skipped (output undefined)");
            return Ok(());
        };
        if first_instance != 0 {
            debug!("first_instance {first_instance} unsupported on GL; drawing from 0");
        }
        if instance_count != 1 {
            self.ctx().draw_arrays_instanced(
                mode,
                first_vertex as i32,
                vertex_count as i32,
                instance_count as i32,
            );
        } else {
            self.ctx().draw_arrays(mode, first_vertex as i32, vertex_count as i32);
        }
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> AshesResult<()> {
        let Some(mode) = self.flush_vertex_layout() else {
            debug!("indexed draw with no bound pipeline; skipped (output undefined)");
            return Ok(());
        };
        let Some((base_offset, index_type)) = self.index else {
            debug!("indexed draw with no bound index buffer; skipped (output undefined)");
            return Ok(());
        };
        if first_instance != 0 {
            debug!("first_instance {first_instance} unsupported on GL; drawing from 0");
        }
        let element_type = convert::index_type(index_type);
        let offset = (base_offset + u64::from(first_index) * index_type.size()) as i32;
        if instance_count != 1 {
            self.ctx().draw_elements_instanced_base_vertex(
                mode,
                index_count as i32,
                element_type,
                offset,
                instance_count as i32,
                vertex_offset,
            );
        } else {
            self.ctx().draw_elements_base_vertex(
                mode,
                index_count as i32,
                element_type,
                offset,
                vertex_offset,
            );
        }
        Ok(())
    }

    // transfers

    fn copy_buffer(
        &self,
        src: crate::core::BufferHandle,
        dst: crate::core::BufferHandle,
        regions: &[crate::core::BufferCopy],
    ) -> AshesResult<()> {
        let src = self
            .state
            .buffers
            .get(src)
            .ok_or(AshesError::ResourceLost { what: "buffer" })?
            .name;
        let dst = self
            .state
            .buffers
            .get(dst)
            .ok_or(AshesError::ResourceLost { what: "buffer" })?
            .name;
        let ctx = self.ctx();
        ctx.bind_buffer(glow::COPY_READ_BUFFER, src);
        ctx.bind_buffer(glow::COPY_WRITE_BUFFER, dst);
        for region in regions {
            ctx.copy_buffer_sub_data(
                glow::COPY_READ_BUFFER,
                glow::COPY_WRITE_BUFFER,
                region.src_offset as i32,
                region.dst_offset as i32,
                region.size as i32,
            );
        }
        ctx.bind_buffer(glow::COPY_READ_BUFFER, 0);
        ctx.bind_buffer(glow::COPY_WRITE_BUFFER, 0);
        Ok(())
    }

    fn copy_buffer_to_image(
        &self,
        src: crate::core::BufferHandle,
        dst: crate::core::ImageHandle,
        regions: &[crate::core::BufferImageCopy],
    ) -> AshesResult<()> {
        let src = self
            .state
            .buffers
            .get(src)
            .ok_or(AshesError::ResourceLost { what: "buffer" })?
            .name;
        let image = self
            .state
            .images
            .get(dst)
            .ok_or(AshesError::ResourceLost { what: "image" })?;
        let (_, format, data_type) = convert::texture_format(image.format);
        let ctx = self.ctx();
        ctx.bind_buffer(glow::PIXEL_UNPACK_BUFFER, src);
        ctx.bind_texture(image.target, image.name);
        for region in regions {
            ctx.tex_sub_image_2d_from_buffer(
                image.target,
                region.mip_level as i32,
                region.image_offset.x,
                region.image_offset.y,
                region.image_extent.width as i32,
                region.image_extent.height as i32,
                format,
                data_type,
                region.buffer_offset as u32,
            );
        }
        ctx.bind_texture(image.target, 0);
        ctx.bind_buffer(glow::PIXEL_UNPACK_BUFFER, 0);
        Ok(())
    }

    fn copy_image(
        &self,
        src: crate::core::ImageHandle,
        dst: crate::core::ImageHandle,
        regions: &[crate::core::ImageCopy],
    ) -> AshesResult<()> {
        let src = self
            .state
            .images
            .get(src)
            .ok_or(AshesError::ResourceLost { what: "image" })?;
        let dst = self
            .state
            .images
            .get(dst)
            .ok_or(AshesError::ResourceLost { what: "image" })?;
        let aspects = src.format.aspects();
        let mask = convert::blit_mask(aspects);
        let attachment = attachment_point(aspects);
        let ctx = self.ctx();
        for region in regions {
            ctx.bind_framebuffer(glow::READ_FRAMEBUFFER, self.state.scratch_read_fbo);
            ctx.framebuffer_texture_2d(
                glow::READ_FRAMEBUFFER,
                attachment,
                src.target,
                src.name,
                region.src_mip_level as i32,
            );
            ctx.bind_framebuffer(glow::DRAW_FRAMEBUFFER, self.state.scratch_draw_fbo);
            ctx.framebuffer_texture_2d(
                glow::DRAW_FRAMEBUFFER,
                attachment,
                dst.target,
                dst.name,
                region.dst_mip_level as i32,
            );
            if aspects.contains(ImageAspectFlags::COLOR) {
                ctx.read_buffer(glow::COLOR_ATTACHMENT0);
                ctx.draw_buffers(&[glow::COLOR_ATTACHMENT0]);
            }
            let (sx, sy) = (region.src_offset.x, region.src_offset.y);
            let (dx, dy) = (region.dst_offset.x, region.dst_offset.y);
            let (w, h) = (region.extent.width as i32, region.extent.height as i32);
            ctx.blit_framebuffer(sx, sy, sx + w, sy + h, dx, dy, dx + w, dy + h, mask, glow::NEAREST);
        }
        self.restore_pass_framebuffer()?;
        Ok(())
    }

    // image clears outside a render pass

    fn clear_color_image(
        &self,
        image: crate::core::ImageHandle,
        color: ClearColorValue,
    ) -> AshesResult<()> {
        let image = self
            .state
            .images
            .get(image)
            .ok_or(AshesError::ResourceLost { what: "image" })?;
        let ctx = self.ctx();
        ctx.bind_framebuffer(glow::FRAMEBUFFER, self.state.scratch_draw_fbo);
        ctx.framebuffer_texture_2d(
            glow::FRAMEBUFFER,
            glow::COLOR_ATTACHMENT0,
            image.target,
            image.name,
            0,
        );
        ctx.draw_buffers(&[glow::COLOR_ATTACHMENT0]);
        ctx.color_mask(true, true, true, true);
        match color {
            ClearColorValue::Float(v) => ctx.clear_buffer_f32(glow::COLOR, 0, &v),
            ClearColorValue::Int(v) => ctx.clear_buffer_i32(glow::COLOR, 0, &v),
            ClearColorValue::Uint(v) => ctx.clear_buffer_u32(glow::COLOR, 0, &v),
        }
        ctx.framebuffer_texture_2d(
            glow::FRAMEBUFFER,
            glow::COLOR_ATTACHMENT0,
            image.target,
            0,
            0,
        );
        self.restore_pass_framebuffer()?;
        Ok(())
    }

    fn clear_depth_stencil_image(
        &self,
        image: crate::core::ImageHandle,
        depth: f32,
        stencil: u32,
        aspects: ImageAspectFlags,
    ) -> AshesResult<()> {
        let image = self
            .state
            .images
            .get(image)
            .ok_or(AshesError::ResourceLost { what: "image" })?;
        let aspects = aspects & image.format.aspects();
        let attachment = attachment_point(aspects);
        let ctx = self.ctx();
        ctx.bind_framebuffer(glow::FRAMEBUFFER, self.state.scratch_draw_fbo);
        ctx.framebuffer_texture_2d(glow::FRAMEBUFFER, attachment, image.target, image.name, 0);
        let has_depth = aspects.contains(ImageAspectFlags::DEPTH);
        let has_stencil = aspects.contains(ImageAspectFlags::STENCIL);
        if has_depth {
            ctx.depth_mask(true);
        }
        if has_stencil {
            ctx.stencil_mask_separate(glow::FRONT_AND_BACK, u32::MAX);
        }
        if has_depth && has_stencil {
            ctx.clear_buffer_depth_stencil(glow::DEPTH_STENCIL, 0, depth, stencil as i32);
        } else if has_depth {
            ctx.clear_buffer_f32(glow::DEPTH, 0, &[depth]);
        } else if has_stencil {
            ctx.clear_buffer_i32(glow::STENCIL, 0, &[stencil as i32]);
        }
        ctx.framebuffer_texture_2d(glow::FRAMEBUFFER, attachment, image.target, 0, 0);
        self.restore_pass_framebuffer()?;
        Ok(())
    }

    /// Rebind the active pass's framebuffer after scratch-FBO traffic
    fn restore_pass_framebuffer(&self) -> AshesResult<()> {
        match &self.pass {
            Some(pass) => {
                let fb = self
                    .state
                    .framebuffers
                    .get(pass.framebuffer)
                    .ok_or(AshesError::ResourceLost { what: "framebuffer" })?;
                self.ctx().bind_framebuffer(glow::FRAMEBUFFER, fb.name);
            }
            None => self.ctx().bind_framebuffer(glow::FRAMEBUFFER, 0),
        }
        Ok(())
    }
}

/// FBO attachment point covering a set of aspects
fn attachment_point(aspects: ImageAspectFlags) -> u32 {
    let depth = aspects.contains(ImageAspectFlags::DEPTH);
    let stencil = aspects.contains(ImageAspectFlags::STENCIL);
    if depth && stencil {
        glow::DEPTH_STENCIL_ATTACHMENT
    } else if depth {
        glow::DEPTH_ATTACHMENT
    } else if stencil {
        glow::STENCIL_ATTACHMENT
    } else {
        glow::COLOR_ATTACHMENT0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CommandBufferUsageFlags;
    use crate::gl::{CaptureContext, GlCall, GlDevice};

    fn device_and_log() -> (GlDevice, crate::gl::CallLog) {
        let ctx = CaptureContext::new();
        let log = ctx.log();
        let device = GlDevice::new(Rc::new(ctx)).unwrap();
        (device, log)
    }

    #[test]
    fn non_executable_buffer_is_rejected() {
        let (device, _) = device_and_log();
        let queue = device.queue();
        let mut cmd = CommandBuffer::new();
        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        let err = queue.submit(&[&cmd], &[], &[], None).unwrap_err();
        assert!(matches!(
            err,
            AshesError::InvalidCommandBufferState {
                expected: "Executable",
                actual: "Recording",
            }
        ));
    }

    #[test]
    fn draw_without_pipeline_is_skipped() {
        let (device, log) = device_and_log();
        let queue = device.queue();
        let mut cmd = CommandBuffer::new();
        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        cmd.cmd_draw(3, 1, 0, 0).unwrap();
        cmd.end().unwrap();
        log.clear();
        queue.submit(&[&cmd], &[], &[], None).unwrap();
        assert!(log
            .position(|c| matches!(c, GlCall::DrawArrays { .. }))
            .is_none());
    }

    #[test]
    fn one_time_submit_buffer_is_invalidated() {
        let (device, _) = device_and_log();
        let queue = device.queue();
        let mut cmd = CommandBuffer::new();
        cmd.begin(CommandBufferUsageFlags::ONE_TIME_SUBMIT).unwrap();
        cmd.end().unwrap();
        queue.submit(&[&cmd], &[], &[], None).unwrap();
        assert_eq!(cmd.state(), CommandBufferState::Invalid);
        let err = queue.submit(&[&cmd], &[], &[], None).unwrap_err();
        assert!(matches!(err, AshesError::InvalidCommandBufferState { .. }));
    }

    #[test]
    fn submit_signals_fence_with_a_sync_object() {
        let (device, log) = device_and_log();
        let queue = device.queue();
        let fence = device.create_fence();
        let mut cmd = CommandBuffer::new();
        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        cmd.end().unwrap();
        log.clear();
        queue.submit(&[&cmd], &[], &[], Some(fence)).unwrap();
        assert!(log
            .position(|c| matches!(c, GlCall::FenceSync { .. }))
            .is_some());
        assert_eq!(
            device.wait_for_fence(fence, 1_000).unwrap(),
            crate::core::WaitResult::Success
        );
    }
}
