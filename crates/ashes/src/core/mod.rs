//! Backend-neutral data model and the command recording engine
//!
//! Everything in this module is pure data plus validation: recording a
//! command buffer, declaring a render pass, or describing a pipeline never
//! touches a native graphics API. Backends ([`crate::gl`], [`crate::vk`])
//! consume these descriptions at submission time.

mod barrier;
mod command;
mod command_buffer;
mod command_pool;
mod descriptor;
mod error;
mod flags;
mod format;
mod framebuffer;
mod handles;
mod pipeline;
mod render_pass;
mod resource;
mod types;

pub use barrier::{BufferMemoryBarrier, ImageMemoryBarrier, MemoryBarrier};
pub use command::{BufferCopy, BufferImageCopy, Command, ImageCopy};
pub use command_buffer::{CommandBuffer, CommandBufferState, RecordError, RecordResult};
pub use command_pool::{CommandBufferId, CommandPool};
pub use descriptor::{
    DescriptorSetLayoutBinding, DescriptorSetLayoutCreateInfo, DescriptorType, WriteDescriptorSet,
};
pub use error::{AshesError, AshesResult, WaitResult};
pub use flags::{
    AccessFlags, BufferUsageFlags, ColorComponentFlags, CommandBufferUsageFlags, ImageAspectFlags,
    ImageUsageFlags, PipelineStageFlags, ShaderStageFlags,
};
pub use format::Format;
pub use framebuffer::{validate_framebuffer, AttachmentViewDesc, Framebuffer};
pub use handles::{
    BufferHandle, DescriptorSetHandle, DescriptorSetLayoutHandle, FenceHandle, FramebufferHandle,
    ImageHandle, ImageViewHandle, PipelineHandle, PipelineLayoutHandle, QueryPoolHandle,
    RenderPassHandle, SamplerHandle, SemaphoreHandle, ShaderModuleHandle,
};
pub use pipeline::{
    BlendFactor, BlendOp, ColorBlendAttachment, ColorBlendState, CompareOp, CullMode,
    DepthStencilState, FrontFace, GraphicsPipelineCreateInfo, InputAssemblyState, LogicOp,
    MultisampleState, PipelineLayoutCreateInfo, PolygonMode, PrimitiveTopology,
    PushConstantRange, RasterizationState, StencilOp, StencilOpState, VertexInputAttribute,
    VertexInputBinding, VertexInputRate, VertexInputState,
};
pub use render_pass::{
    AttachmentDescription, AttachmentLoadOp, AttachmentReference, AttachmentStoreOp, RenderPass,
    RenderPassCreateInfo, SubpassDependency, SubpassDescription, SUBPASS_EXTERNAL,
};
pub use resource::{
    BufferCreateInfo, Filter, ImageCreateInfo, ImageViewCreateInfo, SamplerCreateInfo,
    ShaderModuleCreateInfo, ShaderSource, WrapMode,
};
pub use types::{
    ClearColorValue, ClearValue, Extent2D, Extent3D, ImageLayout, IndexType, Offset2D, Offset3D,
    PipelineBindPoint, Rect2D, SampleCount, SubpassContents, Viewport,
};
