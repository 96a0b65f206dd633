//! Command buffer recording
//!
//! A command buffer captures a linear, replayable script of GPU work
//! without executing any of it. Recording is append-only and O(1) per
//! call; no native API is touched until a queue submits the buffer.
//!
//! The state machine mirrors Vulkan's: `Initial` -> `begin` -> `Recording`
//! -> `end` -> `Executable`, with `reset` returning to `Initial` from any
//! state and one-time-submit buffers dropping to `Invalid` after replay.
//! Recording validates only local facts (state, clear-value arity); it
//! never checks cross-command ordering — replaying a draw with no bound
//! pipeline is a documented undefined-output condition, not a recording
//! error.

use std::cell::Cell;

use thiserror::Error;

use crate::core::barrier::{BufferMemoryBarrier, ImageMemoryBarrier, MemoryBarrier};
use crate::core::command::{BufferCopy, BufferImageCopy, Command, ImageCopy};
use crate::core::flags::{
    CommandBufferUsageFlags, ImageAspectFlags, PipelineStageFlags, ShaderStageFlags,
};
use crate::core::framebuffer::Framebuffer;
use crate::core::handles::{
    BufferHandle, DescriptorSetHandle, ImageHandle, PipelineHandle, PipelineLayoutHandle,
    QueryPoolHandle, RenderPassHandle,
};
use crate::core::types::{
    ClearColorValue, ClearValue, IndexType, PipelineBindPoint, Rect2D, SubpassContents, Viewport,
};

/// Recording-state errors, the recoverable (`VkResult`-style) conditions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A recording call was made outside `begin`/`end`
    #[error("command buffer is not recording")]
    NotRecording,
    /// `begin` was called while already recording
    #[error("command buffer is already recording")]
    AlreadyRecording,
    /// `begin_render_pass` clear values do not cover the attachments
    #[error("render pass expects {expected} clear values, {actual} were supplied")]
    ClearValueCount {
        /// Framebuffer attachment count
        expected: usize,
        /// Supplied clear value count
        actual: usize,
    },
}

/// Result type for recording operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Lifecycle state of a command buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandBufferState {
    /// Freshly created or reset; nothing recorded
    #[default]
    Initial,
    /// Between `begin` and `end`
    Recording,
    /// Recorded and submittable
    Executable,
    /// A one-time-submit buffer that has been replayed
    Invalid,
}

impl CommandBufferState {
    /// Human-readable name for error reporting
    pub fn name(self) -> &'static str {
        match self {
            Self::Initial => "Initial",
            Self::Recording => "Recording",
            Self::Executable => "Executable",
            Self::Invalid => "Invalid",
        }
    }
}

/// An ordered, replayable sequence of [`Command`]s
///
/// The buffer exclusively owns its command list; commands reference
/// externally-owned resources through handles that must outlive every
/// submission. Command buffers are single-thread objects: a buffer must
/// not be reset or re-recorded between `submit` and the signaling of the
/// associated fence.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    state: Cell<CommandBufferState>,
    usage: CommandBufferUsageFlags,
}

impl CommandBuffer {
    /// Create an empty buffer in the `Initial` state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state
    pub fn state(&self) -> CommandBufferState {
        self.state.get()
    }

    /// Usage flags supplied to the most recent `begin`
    pub fn usage(&self) -> CommandBufferUsageFlags {
        self.usage
    }

    /// The recorded command sequence, in order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Start recording
    ///
    /// Fails with [`RecordError::AlreadyRecording`] if called while
    /// recording. From any other state the previous recording is cleared,
    /// so re-beginning an executable or invalidated buffer implicitly
    /// resets it.
    pub fn begin(&mut self, usage: CommandBufferUsageFlags) -> RecordResult<()> {
        if self.state.get() == CommandBufferState::Recording {
            return Err(RecordError::AlreadyRecording);
        }
        self.commands.clear();
        self.usage = usage;
        self.state.set(CommandBufferState::Recording);
        Ok(())
    }

    /// Finish recording, transitioning to `Executable`
    pub fn end(&mut self) -> RecordResult<()> {
        if self.state.get() != CommandBufferState::Recording {
            return Err(RecordError::NotRecording);
        }
        self.state.set(CommandBufferState::Executable);
        Ok(())
    }

    /// Discard the recording and return to `Initial`
    ///
    /// The command storage is kept to avoid reallocation on the next
    /// `begin`/`end` cycle.
    pub fn reset(&mut self) {
        self.commands.clear();
        self.state.set(CommandBufferState::Initial);
    }

    /// Called by queues after replaying a one-time-submit buffer
    pub(crate) fn mark_submitted(&self) {
        if self.usage.contains(CommandBufferUsageFlags::ONE_TIME_SUBMIT) {
            self.state.set(CommandBufferState::Invalid);
        }
    }

    fn push(&mut self, command: Command) -> RecordResult<()> {
        if self.state.get() != CommandBufferState::Recording {
            return Err(RecordError::NotRecording);
        }
        self.commands.push(command);
        Ok(())
    }

    /// Begin a render pass instance on `framebuffer`, starting at subpass 0
    ///
    /// `clear_values` must be ordered identically to the render pass's
    /// attachment declarations and cover every attachment; entries for
    /// non-cleared attachments are ignored at replay.
    pub fn begin_render_pass(
        &mut self,
        render_pass: RenderPassHandle,
        framebuffer: &Framebuffer,
        clear_values: Vec<ClearValue>,
        contents: SubpassContents,
    ) -> RecordResult<()> {
        if self.state.get() != CommandBufferState::Recording {
            return Err(RecordError::NotRecording);
        }
        if clear_values.len() != framebuffer.attachment_count() {
            return Err(RecordError::ClearValueCount {
                expected: framebuffer.attachment_count(),
                actual: clear_values.len(),
            });
        }
        self.push(Command::BeginRenderPass {
            render_pass,
            framebuffer: framebuffer.handle(),
            render_area: Rect2D::whole(framebuffer.extent()),
            clear_values,
            contents,
        })
    }

    /// Advance to the next subpass
    pub fn next_subpass(&mut self, contents: SubpassContents) -> RecordResult<()> {
        self.push(Command::NextSubpass { contents })
    }

    /// End the current render pass instance
    pub fn end_render_pass(&mut self) -> RecordResult<()> {
        self.push(Command::EndRenderPass)
    }

    /// Bind a pipeline
    pub fn bind_pipeline(
        &mut self,
        pipeline: PipelineHandle,
        bind_point: PipelineBindPoint,
    ) -> RecordResult<()> {
        self.push(Command::BindPipeline {
            pipeline,
            bind_point,
        })
    }

    /// Bind a descriptor set at `set_number`
    pub fn bind_descriptor_set(
        &mut self,
        set: DescriptorSetHandle,
        layout: PipelineLayoutHandle,
        set_number: u32,
        bind_point: PipelineBindPoint,
    ) -> RecordResult<()> {
        self.push(Command::BindDescriptorSet {
            set,
            layout,
            set_number,
            bind_point,
        })
    }

    /// Bind one vertex buffer at `binding`
    pub fn bind_vertex_buffer(
        &mut self,
        binding: u32,
        buffer: BufferHandle,
        offset: u64,
    ) -> RecordResult<()> {
        self.bind_vertex_buffers(binding, vec![(buffer, offset)])
    }

    /// Bind vertex buffers to consecutive binding slots
    pub fn bind_vertex_buffers(
        &mut self,
        first_binding: u32,
        buffers: Vec<(BufferHandle, u64)>,
    ) -> RecordResult<()> {
        self.push(Command::BindVertexBuffers {
            first_binding,
            buffers,
        })
    }

    /// Bind the index buffer
    pub fn bind_index_buffer(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        index_type: IndexType,
    ) -> RecordResult<()> {
        self.push(Command::BindIndexBuffer {
            buffer,
            offset,
            index_type,
        })
    }

    /// Set the dynamic viewport
    pub fn set_viewport(&mut self, viewport: Viewport) -> RecordResult<()> {
        self.push(Command::SetViewport { viewport })
    }

    /// Set the dynamic scissor
    pub fn set_scissor(&mut self, scissor: Rect2D) -> RecordResult<()> {
        self.push(Command::SetScissor { scissor })
    }

    /// Update push constants
    ///
    /// On the GL backend the bytes land in a device-owned uniform buffer
    /// bound at the reserved push-constant binding point.
    pub fn push_constants(
        &mut self,
        layout: PipelineLayoutHandle,
        stages: ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) -> RecordResult<()> {
        self.push(Command::PushConstants {
            layout,
            stages,
            offset,
            data: data.to_vec(),
        })
    }

    /// Record a non-indexed draw
    ///
    /// `first_instance` is forwarded to Vulkan; the GL backend requires it
    /// to be zero and logs otherwise.
    pub fn cmd_draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> RecordResult<()> {
        self.push(Command::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        })
    }

    /// Record an indexed draw
    pub fn cmd_draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> RecordResult<()> {
        self.push(Command::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        })
    }

    /// Record a buffer-to-buffer copy
    pub fn copy_buffer(
        &mut self,
        src: BufferHandle,
        dst: BufferHandle,
        regions: Vec<BufferCopy>,
    ) -> RecordResult<()> {
        self.push(Command::CopyBuffer { src, dst, regions })
    }

    /// Record a buffer-to-image copy
    pub fn copy_buffer_to_image(
        &mut self,
        src: BufferHandle,
        dst: ImageHandle,
        regions: Vec<BufferImageCopy>,
    ) -> RecordResult<()> {
        self.push(Command::CopyBufferToImage { src, dst, regions })
    }

    /// Record an image-to-image copy
    pub fn copy_image(
        &mut self,
        src: ImageHandle,
        dst: ImageHandle,
        regions: Vec<ImageCopy>,
    ) -> RecordResult<()> {
        self.push(Command::CopyImage { src, dst, regions })
    }

    /// Record an explicit barrier
    pub fn pipeline_barrier(
        &mut self,
        src_stage_mask: PipelineStageFlags,
        dst_stage_mask: PipelineStageFlags,
        memory_barriers: Vec<MemoryBarrier>,
        buffer_barriers: Vec<BufferMemoryBarrier>,
        image_barriers: Vec<ImageMemoryBarrier>,
    ) -> RecordResult<()> {
        self.push(Command::PipelineBarrier {
            src_stage_mask,
            dst_stage_mask,
            memory_barriers,
            buffer_barriers,
            image_barriers,
        })
    }

    /// Record a timestamp write
    pub fn write_timestamp(
        &mut self,
        stage: PipelineStageFlags,
        pool: QueryPoolHandle,
        query: u32,
    ) -> RecordResult<()> {
        self.push(Command::WriteTimestamp { stage, pool, query })
    }

    /// Record a query pool reset
    pub fn reset_query_pool(
        &mut self,
        pool: QueryPoolHandle,
        first_query: u32,
        query_count: u32,
    ) -> RecordResult<()> {
        self.push(Command::ResetQueryPool {
            pool,
            first_query,
            query_count,
        })
    }

    /// Record a color image clear (outside a render pass)
    pub fn clear_color_image(
        &mut self,
        image: ImageHandle,
        color: ClearColorValue,
    ) -> RecordResult<()> {
        self.push(Command::ClearColorImage { image, color })
    }

    /// Record a depth/stencil image clear (outside a render pass)
    pub fn clear_depth_stencil_image(
        &mut self,
        image: ImageHandle,
        depth: f32,
        stencil: u32,
        aspects: ImageAspectFlags,
    ) -> RecordResult<()> {
        self.push(Command::ClearDepthStencilImage {
            image,
            depth,
            stencil,
            aspects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::handles::FramebufferHandle;
    use crate::core::types::Extent2D;
    use slotmap::Key;

    fn fake_framebuffer(attachments: usize) -> Framebuffer {
        Framebuffer::new(
            FramebufferHandle::null(),
            attachments,
            Extent2D::new(4, 4),
        )
    }

    #[test]
    fn begin_record_end_reaches_executable() {
        let mut cmd = CommandBuffer::new();
        assert_eq!(cmd.state(), CommandBufferState::Initial);
        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        assert_eq!(cmd.state(), CommandBufferState::Recording);
        cmd.cmd_draw(3, 1, 0, 0).unwrap();
        cmd.end().unwrap();
        assert_eq!(cmd.state(), CommandBufferState::Executable);
        assert_eq!(cmd.commands().len(), 1);
    }

    #[test]
    fn begin_while_recording_fails() {
        let mut cmd = CommandBuffer::new();
        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        assert_eq!(
            cmd.begin(CommandBufferUsageFlags::empty()),
            Err(RecordError::AlreadyRecording)
        );
    }

    #[test]
    fn end_without_begin_fails() {
        let mut cmd = CommandBuffer::new();
        assert_eq!(cmd.end(), Err(RecordError::NotRecording));
    }

    #[test]
    fn recording_outside_begin_fails() {
        let mut cmd = CommandBuffer::new();
        assert_eq!(cmd.cmd_draw(3, 1, 0, 0), Err(RecordError::NotRecording));
    }

    #[test]
    fn reset_then_empty_begin_end_is_empty_and_executable() {
        let mut cmd = CommandBuffer::new();
        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        cmd.cmd_draw(3, 1, 0, 0).unwrap();
        cmd.set_viewport(Viewport::whole(Extent2D::new(4, 4))).unwrap();
        cmd.end().unwrap();

        cmd.reset();
        assert_eq!(cmd.state(), CommandBufferState::Initial);
        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        cmd.end().unwrap();
        assert_eq!(cmd.state(), CommandBufferState::Executable);
        assert!(cmd.commands().is_empty());
    }

    #[test]
    fn re_begin_clears_previous_recording() {
        let mut cmd = CommandBuffer::new();
        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        cmd.cmd_draw(3, 1, 0, 0).unwrap();
        cmd.end().unwrap();

        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        cmd.end().unwrap();
        assert!(cmd.commands().is_empty());
    }

    #[test]
    fn clear_value_arity_is_enforced_at_record_time() {
        let mut cmd = CommandBuffer::new();
        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        let fb = fake_framebuffer(2);
        let err = cmd
            .begin_render_pass(
                RenderPassHandle::null(),
                &fb,
                vec![ClearValue::color([1.0, 0.0, 0.0, 1.0])],
                SubpassContents::Inline,
            )
            .unwrap_err();
        assert_eq!(
            err,
            RecordError::ClearValueCount {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn recording_never_validates_command_ordering() {
        // Binding and drawing without a render pass must record fine; the
        // resulting replay output is undefined, not a recording error.
        let mut cmd = CommandBuffer::new();
        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        cmd.bind_vertex_buffer(0, BufferHandle::null(), 0).unwrap();
        cmd.bind_index_buffer(BufferHandle::null(), 0, IndexType::Uint32)
            .unwrap();
        cmd.cmd_draw_indexed(6, 1, 0, 0, 0).unwrap();
        cmd.end().unwrap();
        assert_eq!(cmd.commands().len(), 3);
    }

    #[test]
    fn one_time_submit_invalidates_after_replay() {
        let mut cmd = CommandBuffer::new();
        cmd.begin(CommandBufferUsageFlags::ONE_TIME_SUBMIT).unwrap();
        cmd.end().unwrap();
        cmd.mark_submitted();
        assert_eq!(cmd.state(), CommandBufferState::Invalid);

        // A multi-submit buffer stays executable.
        let mut cmd = CommandBuffer::new();
        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        cmd.end().unwrap();
        cmd.mark_submitted();
        assert_eq!(cmd.state(), CommandBufferState::Executable);
    }
}
