//! The deferred command model
//!
//! One recorded, deferred unit of GPU work. Commands are immutable once
//! constructed, cloneable (a command buffer can be replayed any number of
//! times), and hold handles plus copied parameters — never references into
//! the recording thread's stack. The backends dispatch on this enum at
//! submission time; there is no per-command virtual call.

use crate::core::barrier::{BufferMemoryBarrier, ImageMemoryBarrier, MemoryBarrier};
use crate::core::flags::{ImageAspectFlags, PipelineStageFlags, ShaderStageFlags};
use crate::core::handles::{
    BufferHandle, DescriptorSetHandle, FramebufferHandle, ImageHandle, PipelineHandle,
    PipelineLayoutHandle, QueryPoolHandle, RenderPassHandle,
};
use crate::core::types::{
    ClearColorValue, ClearValue, Extent3D, IndexType, Offset3D, PipelineBindPoint, Rect2D,
    SubpassContents, Viewport,
};

/// One region of a buffer-to-buffer copy
#[derive(Debug, Clone, Copy)]
pub struct BufferCopy {
    /// Source byte offset
    pub src_offset: u64,
    /// Destination byte offset
    pub dst_offset: u64,
    /// Bytes to copy
    pub size: u64,
}

/// One region of a buffer-to-image copy
#[derive(Debug, Clone, Copy)]
pub struct BufferImageCopy {
    /// Byte offset of the texel data in the buffer
    pub buffer_offset: u64,
    /// Destination texel offset
    pub image_offset: Offset3D,
    /// Destination region size
    pub image_extent: Extent3D,
    /// Destination mip level
    pub mip_level: u32,
}

/// One region of an image-to-image copy
#[derive(Debug, Clone, Copy)]
pub struct ImageCopy {
    /// Source texel offset
    pub src_offset: Offset3D,
    /// Destination texel offset
    pub dst_offset: Offset3D,
    /// Region size
    pub extent: Extent3D,
    /// Source mip level
    pub src_mip_level: u32,
    /// Destination mip level
    pub dst_mip_level: u32,
}

/// A recorded, deferred unit of GPU work
#[derive(Debug, Clone)]
pub enum Command {
    /// Begin a render pass instance on a framebuffer
    BeginRenderPass {
        /// The declared pass
        render_pass: RenderPassHandle,
        /// The concrete attachment binding
        framebuffer: FramebufferHandle,
        /// Area affected by load/store operations
        render_area: Rect2D,
        /// Clear values in attachment declaration order
        clear_values: Vec<ClearValue>,
        /// Inline or secondary contents
        contents: SubpassContents,
    },
    /// Advance to the next subpass
    NextSubpass {
        /// Inline or secondary contents
        contents: SubpassContents,
    },
    /// End the current render pass instance
    EndRenderPass,
    /// Bind a pipeline; replay applies the entire state bundle atomically
    BindPipeline {
        /// Pipeline to bind
        pipeline: PipelineHandle,
        /// Graphics or compute
        bind_point: PipelineBindPoint,
    },
    /// Bind a descriptor set
    BindDescriptorSet {
        /// Set to bind
        set: DescriptorSetHandle,
        /// Layout the set was allocated against
        layout: PipelineLayoutHandle,
        /// Set number
        set_number: u32,
        /// Graphics or compute
        bind_point: PipelineBindPoint,
    },
    /// Bind vertex buffers to consecutive binding slots
    BindVertexBuffers {
        /// First binding slot
        first_binding: u32,
        /// Buffer + byte offset per slot
        buffers: Vec<(BufferHandle, u64)>,
    },
    /// Bind the index buffer
    BindIndexBuffer {
        /// Buffer holding indices
        buffer: BufferHandle,
        /// Byte offset of the first index
        offset: u64,
        /// Index width
        index_type: IndexType,
    },
    /// Set the dynamic viewport
    SetViewport {
        /// New viewport
        viewport: Viewport,
    },
    /// Set the dynamic scissor rectangle
    SetScissor {
        /// New scissor
        scissor: Rect2D,
    },
    /// Update push-constant bytes
    PushConstants {
        /// Layout declaring the range
        layout: PipelineLayoutHandle,
        /// Stages that read the range
        stages: ShaderStageFlags,
        /// Byte offset within the push-constant block
        offset: u32,
        /// The bytes
        data: Vec<u8>,
    },
    /// Non-indexed draw
    Draw {
        /// Vertices per instance
        vertex_count: u32,
        /// Instances
        instance_count: u32,
        /// First vertex
        first_vertex: u32,
        /// First instance
        first_instance: u32,
    },
    /// Indexed draw
    DrawIndexed {
        /// Indices per instance
        index_count: u32,
        /// Instances
        instance_count: u32,
        /// First index
        first_index: u32,
        /// Added to each index value
        vertex_offset: i32,
        /// First instance
        first_instance: u32,
    },
    /// Buffer-to-buffer copy
    CopyBuffer {
        /// Source buffer
        src: BufferHandle,
        /// Destination buffer
        dst: BufferHandle,
        /// Regions to copy
        regions: Vec<BufferCopy>,
    },
    /// Buffer-to-image copy
    CopyBufferToImage {
        /// Source buffer
        src: BufferHandle,
        /// Destination image
        dst: ImageHandle,
        /// Regions to copy
        regions: Vec<BufferImageCopy>,
    },
    /// Image-to-image copy
    CopyImage {
        /// Source image
        src: ImageHandle,
        /// Destination image
        dst: ImageHandle,
        /// Regions to copy
        regions: Vec<ImageCopy>,
    },
    /// Explicit execution/memory barrier
    PipelineBarrier {
        /// Producer stages
        src_stage_mask: PipelineStageFlags,
        /// Consumer stages
        dst_stage_mask: PipelineStageFlags,
        /// Global barriers
        memory_barriers: Vec<MemoryBarrier>,
        /// Buffer-scoped barriers
        buffer_barriers: Vec<BufferMemoryBarrier>,
        /// Image-scoped barriers with layout transitions
        image_barriers: Vec<ImageMemoryBarrier>,
    },
    /// Write a timestamp into a query pool slot
    WriteTimestamp {
        /// Stage whose completion is timestamped
        stage: PipelineStageFlags,
        /// Target pool
        pool: QueryPoolHandle,
        /// Slot within the pool
        query: u32,
    },
    /// Reset a range of query pool slots
    ResetQueryPool {
        /// Target pool
        pool: QueryPoolHandle,
        /// First slot
        first_query: u32,
        /// Number of slots
        query_count: u32,
    },
    /// Clear a color image outside a render pass
    ClearColorImage {
        /// Target image
        image: ImageHandle,
        /// Clear color
        color: ClearColorValue,
    },
    /// Clear a depth/stencil image outside a render pass
    ClearDepthStencilImage {
        /// Target image
        image: ImageHandle,
        /// Depth clear value
        depth: f32,
        /// Stencil clear value
        stencil: u32,
        /// Aspects to clear
        aspects: ImageAspectFlags,
    },
}
