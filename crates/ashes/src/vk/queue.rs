//! Command re-encoding onto native Vulkan command buffers
//!
//! `submit` allocates one native command buffer per call, walks the
//! recorded command lists in order, and re-encodes each command through
//! the `cmd_*` entry points. The native buffer is handed to the driver
//! and retired on `wait_idle`; the portable recording stays owned by the
//! application and can be replayed again unless it was one-time-submit.
//!
//! Failure semantics match the GL backend: a stale handle aborts the
//! submission with `ResourceLost` before anything reaches the queue.

use std::cell::RefCell;
use std::rc::Rc;

use ash::vk;

use crate::core::{
    AshesError, AshesResult, Command, CommandBuffer, CommandBufferState, FenceHandle,
    ImageAspectFlags, SemaphoreHandle,
};

use super::convert;
use super::device::VkDeviceState;

fn backend(what: &str, e: vk::Result) -> AshesError {
    AshesError::Backend(format!("{what}: {e}"))
}

/// The device's graphics queue
pub struct VkQueue {
    state: Rc<RefCell<VkDeviceState>>,
}

impl VkQueue {
    pub(crate) fn new(state: Rc<RefCell<VkDeviceState>>) -> Self {
        Self { state }
    }

    /// Re-encode executable command buffers and submit them
    ///
    /// Each wait semaphore blocks the color-attachment-output stage. The
    /// native command buffer lives until [`super::VkDevice::wait_idle`]
    /// or queue [`Self::wait_idle`] retires it.
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

        let mut wait_semaphores = Vec::with_capacity(waits.len());
        for &wait in waits {
            wait_semaphores.push(*state.semaphores.get(wait).ok_or(
                AshesError::ResourceLost { what: "semaphore" },
            )?);
        }
        let wait_stages =
            vec![vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT; wait_semaphores.len()];
        let mut signal_semaphores = Vec::with_capacity(signals.len());
        for &signal in signals {
            signal_semaphores.push(*state.semaphores.get(signal).ok_or(
                AshesError::ResourceLost { what: "semaphore" },
            )?);
        }
        let raw_fence = match fence {
            Some(fence) => *state
                .fences
                .get(fence)
                .ok_or(AshesError::ResourceLost { what: "fence" })?,
            None => vk::Fence::null(),
        };

        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(state.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let native = unsafe {
            state
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| backend("failed to allocate command buffer", e))?[0]
        };

        let encode = || -> AshesResult<()> {
            let begin_info = vk::CommandBufferBeginInfo::builder()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            unsafe {
                state
                    .device
                    .begin_command_buffer(native, &begin_info)
                    .map_err(|e| backend("failed to begin command buffer", e))?;
            }
            for buffer in buffers {
                for command in buffer.commands() {
                    encode_command(&state, native, command)?;
                }
            }
            unsafe {
                state
                    .device
                    .end_command_buffer(native)
                    .map_err(|e| backend("failed to end command buffer", e))?;
            }
            Ok(())
        };
        if let Err(e) = encode() {
            unsafe { state.device.free_command_buffers(state.command_pool, &[native]) };
            return Err(e);
        }

        let command_buffers = [native];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);
        unsafe {
            state
                .device
                .queue_submit(state.queue, &[submit_info.build()], raw_fence)
                .map_err(|e| backend("queue submission failed", e))?;
        }
        state.pending.push(native);

        for buffer in buffers {
            buffer.mark_submitted();
        }
        Ok(())
    }

    /// Block until all submitted work completes
    pub fn wait_idle(&self) -> AshesResult<()> {
        let mut state = self.state.borrow_mut();
        unsafe {
            state
                .device
                .queue_wait_idle(state.queue)
                .map_err(|e| backend("queue wait failed", e))?;
        }
        let pending = std::mem::take(&mut state.pending);
        if !pending.is_empty() {
            unsafe {
                state
                    .device
                    .free_command_buffers(state.command_pool, &pending);
            }
        }
        Ok(())
    }
}

fn encode_command(
    state: &VkDeviceState,
    cb: vk::CommandBuffer,
    command: &Command,
) -> AshesResult<()> {
    let device = &state.device;
    match command {
        Command::BeginRenderPass {
            render_pass,
            framebuffer,
            render_area,
            clear_values,
            contents,
        } => {
            let pass = state
                .render_passes
                .get(*render_pass)
                .ok_or(AshesError::ResourceLost { what: "render pass" })?;
            let fb = state
                .framebuffers
                .get(*framebuffer)
                .ok_or(AshesError::ResourceLost { what: "framebuffer" })?;
            let clear_values: Vec<vk::ClearValue> =
                clear_values.iter().map(|&v| convert::clear_value(v)).collect();
            let begin_info = vk::RenderPassBeginInfo::builder()
                .render_pass(pass.raw)
                .framebuffer(fb.raw)
                .render_area(convert::rect_2d(*render_area))
                .clear_values(&clear_values);
            unsafe {
                device.cmd_begin_render_pass(cb, &begin_info, convert::subpass_contents(*contents));
            }
        }
        Command::NextSubpass { contents } => unsafe {
            device.cmd_next_subpass(cb, convert::subpass_contents(*contents));
        },
        Command::EndRenderPass => unsafe {
            device.cmd_end_render_pass(cb);
        },
        Command::BindPipeline {
            pipeline,
            bind_point,
        } => {
            let raw = *state
                .pipelines
                .get(*pipeline)
                .ok_or(AshesError::ResourceLost { what: "pipeline" })?;
            unsafe {
                device.cmd_bind_pipeline(cb, convert::bind_point(*bind_point), raw);
            }
        }
        Command::BindDescriptorSet {
            set,
            layout,
            set_number,
            bind_point,
        } => {
            let raw_set = *state
                .descriptor_sets
                .get(*set)
                .ok_or(AshesError::ResourceLost {
                    what: "descriptor set",
                })?;
            let raw_layout = *state
                .pipeline_layouts
                .get(*layout)
                .ok_or(AshesError::ResourceLost {
                    what: "pipeline layout",
                })?;
            unsafe {
                device.cmd_bind_descriptor_sets(
                    cb,
                    convert::bind_point(*bind_point),
                    raw_layout,
                    *set_number,
                    &[raw_set],
                    &[],
                );
            }
        }
        Command::BindVertexBuffers {
            first_binding,
            buffers,
        } => {
            let mut raw_buffers = Vec::with_capacity(buffers.len());
            let mut offsets = Vec::with_capacity(buffers.len());
            for &(buffer, offset) in buffers {
                raw_buffers.push(
                    state
                        .buffers
                        .get(buffer)
                        .ok_or(AshesError::ResourceLost { what: "buffer" })?
                        .buffer,
                );
                offsets.push(offset);
            }
            unsafe {
                device.cmd_bind_vertex_buffers(cb, *first_binding, &raw_buffers, &offsets);
            }
        }
        Command::BindIndexBuffer {
            buffer,
            offset,
            index_type,
        } => {
            let raw = state
                .buffers
                .get(*buffer)
                .ok_or(AshesError::ResourceLost { what: "buffer" })?
                .buffer;
            unsafe {
                device.cmd_bind_index_buffer(cb, raw, *offset, convert::index_type(*index_type));
            }
        }
        Command::SetViewport { viewport } => unsafe {
            device.cmd_set_viewport(cb, 0, &[convert::viewport(*viewport)]);
        },
        Command::SetScissor { scissor } => unsafe {
            device.cmd_set_scissor(cb, 0, &[convert::rect_2d(*scissor)]);
        },
        Command::PushConstants {
            layout,
            stages,
            offset,
            data,
        } => {
            let raw_layout = *state
                .pipeline_layouts
                .get(*layout)
                .ok_or(AshesError::ResourceLost {
                    what: "pipeline layout",
                })?;
            unsafe {
                device.cmd_push_constants(
                    cb,
                    raw_layout,
                    convert::shader_stages(*stages),
                    *offset,
                    data,
                );
            }
        }
        Command::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        } => unsafe {
            device.cmd_draw(cb, *vertex_count, *instance_count, *first_vertex, *first_instance);
        },
        Command::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        } => unsafe {
            device.cmd_draw_indexed(
                cb,
                *index_count,
                *instance_count,
                *first_index,
                *vertex_offset,
                *first_instance,
            );
        },
        Command::CopyBuffer { src, dst, regions } => {
            let src = state
                .buffers
                .get(*src)
                .ok_or(AshesError::ResourceLost { what: "buffer" })?
                .buffer;
            let dst = state
                .buffers
                .get(*dst)
                .ok_or(AshesError::ResourceLost { what: "buffer" })?
                .buffer;
            let regions: Vec<vk::BufferCopy> = regions
                .iter()
                .map(|r| vk::BufferCopy {
                    src_offset: r.src_offset,
                    dst_offset: r.dst_offset,
                    size: r.size,
                })
                .collect();
            unsafe {
                device.cmd_copy_buffer(cb, src, dst, &regions);
            }
        }
        Command::CopyBufferToImage { src, dst, regions } => {
            let src = state
                .buffers
                .get(*src)
                .ok_or(AshesError::ResourceLost { what: "buffer" })?
                .buffer;
            let image = state
                .images
                .get(*dst)
                .ok_or(AshesError::ResourceLost { what: "image" })?;
            let aspect = convert::aspect_flags(image.format.aspects());
            let regions: Vec<vk::BufferImageCopy> = regions
                .iter()
                .map(|r| vk::BufferImageCopy {
                    buffer_offset: r.buffer_offset,
                    buffer_row_length: 0,
                    buffer_image_height: 0,
                    image_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: aspect,
                        mip_level: r.mip_level,
                        base_array_layer: 0,
                        layer_count: 1,
                    },
                    image_offset: convert::offset_3d(r.image_offset),
                    image_extent: vk::Extent3D {
                        width: r.image_extent.width,
                        height: r.image_extent.height,
                        depth: r.image_extent.depth,
                    },
                })
                .collect();
            unsafe {
                device.cmd_copy_buffer_to_image(
                    cb,
                    src,
                    image.image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &regions,
                );
            }
        }
        Command::CopyImage { src, dst, regions } => {
            let src = state
                .images
                .get(*src)
                .ok_or(AshesError::ResourceLost { what: "image" })?;
            let dst = state
                .images
                .get(*dst)
                .ok_or(AshesError::ResourceLost { what: "image" })?;
            let src_aspect = convert::aspect_flags(src.format.aspects());
            let dst_aspect = convert::aspect_flags(dst.format.aspects());
            let regions: Vec<vk::ImageCopy> = regions
                .iter()
                .map(|r| vk::ImageCopy {
                    src_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: src_aspect,
                        mip_level: r.src_mip_level,
                        base_array_layer: 0,
                        layer_count: 1,
                    },
                    src_offset: convert::offset_3d(r.src_offset),
                    dst_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: dst_aspect,
                        mip_level: r.dst_mip_level,
                        base_array_layer: 0,
                        layer_count: 1,
                    },
                    dst_offset: convert::offset_3d(r.dst_offset),
                    extent: vk::Extent3D {
                        width: r.extent.width,
                        height: r.extent.height,
                        depth: r.extent.depth,
                    },
                })
                .collect();
            unsafe {
                device.cmd_copy_image(
                    cb,
                    src.image,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    dst.image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &regions,
                );
            }
        }
        Command::PipelineBarrier {
            src_stage_mask,
            dst_stage_mask,
            memory_barriers,
            buffer_barriers,
            image_barriers,
        } => {
            let memory: Vec<vk::MemoryBarrier> = memory_barriers
                .iter()
                .map(|b| {
                    vk::MemoryBarrier::builder()
                        .src_access_mask(convert::access_flags(b.src_access_mask))
                        .dst_access_mask(convert::access_flags(b.dst_access_mask))
                        .build()
                })
                .collect();
            let mut buffer: Vec<vk::BufferMemoryBarrier> =
                Vec::with_capacity(buffer_barriers.len());
            for b in buffer_barriers {
                let raw = state
                    .buffers
                    .get(b.buffer)
                    .ok_or(AshesError::ResourceLost { what: "buffer" })?
                    .buffer;
                buffer.push(
                    vk::BufferMemoryBarrier::builder()
                        .src_access_mask(convert::access_flags(b.src_access_mask))
                        .dst_access_mask(convert::access_flags(b.dst_access_mask))
                        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                        .buffer(raw)
                        .offset(b.offset)
                        .size(if b.size == u64::MAX {
                            vk::WHOLE_SIZE
                        } else {
                            b.size
                        })
                        .build(),
                );
            }
            let mut image: Vec<vk::ImageMemoryBarrier> = Vec::with_capacity(image_barriers.len());
            for b in image_barriers {
                let entry = state
                    .images
                    .get(b.image)
                    .ok_or(AshesError::ResourceLost { what: "image" })?;
                image.push(
                    vk::ImageMemoryBarrier::builder()
                        .src_access_mask(convert::access_flags(b.src_access_mask))
                        .dst_access_mask(convert::access_flags(b.dst_access_mask))
                        .old_layout(convert::image_layout(b.old_layout))
                        .new_layout(convert::image_layout(b.new_layout))
                        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                        .image(entry.image)
                        .subresource_range(vk::ImageSubresourceRange {
                            aspect_mask: convert::aspect_flags(entry.format.aspects()),
                            base_mip_level: 0,
                            level_count: vk::REMAINING_MIP_LEVELS,
                            base_array_layer: 0,
                            layer_count: vk::REMAINING_ARRAY_LAYERS,
                        })
                        .build(),
                );
            }
            unsafe {
                device.cmd_pipeline_barrier(
                    cb,
                    convert::pipeline_stages(*src_stage_mask),
                    convert::pipeline_stages(*dst_stage_mask),
                    vk::DependencyFlags::empty(),
                    &memory,
                    &buffer,
                    &image,
                );
            }
        }
        Command::WriteTimestamp { stage, pool, query } => {
            let raw = *state
                .query_pools
                .get(*pool)
                .ok_or(AshesError::ResourceLost { what: "query pool" })?;
            unsafe {
                device.cmd_write_timestamp(cb, convert::pipeline_stages(*stage), raw, *query);
            }
        }
        Command::ResetQueryPool {
            pool,
            first_query,
            query_count,
        } => {
            let raw = *state
                .query_pools
                .get(*pool)
                .ok_or(AshesError::ResourceLost { what: "query pool" })?;
            unsafe {
                device.cmd_reset_query_pool(cb, raw, *first_query, *query_count);
            }
        }
        Command::ClearColorImage { image, color } => {
            let entry = state
                .images
                .get(*image)
                .ok_or(AshesError::ResourceLost { what: "image" })?;
            let range = vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: vk::REMAINING_MIP_LEVELS,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
            };
            unsafe {
                device.cmd_clear_color_image(
                    cb,
                    entry.image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &convert::clear_color(*color),
                    &[range],
                );
            }
        }
        Command::ClearDepthStencilImage {
            image,
            depth,
            stencil,
            aspects,
        } => {
            let entry = state
                .images
                .get(*image)
                .ok_or(AshesError::ResourceLost { what: "image" })?;
            let aspect_mask = convert::aspect_flags(
                *aspects & (ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL),
            );
            let range = vk::ImageSubresourceRange {
                aspect_mask,
                base_mip_level: 0,
                level_count: vk::REMAINING_MIP_LEVELS,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
            };
            let value = vk::ClearDepthStencilValue {
                depth: *depth,
                stencil: *stencil,
            };
            unsafe {
                device.cmd_clear_depth_stencil_image(
                    cb,
                    entry.image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &value,
                    &[range],
                );
            }
        }
    }
    Ok(())
}
