//! Generational resource handles
//!
//! Commands reference device-owned resources through slotmap keys instead
//! of pointers. A destroyed resource leaves a stale key behind; backends
//! answer stale keys with [`crate::core::AshesError::ResourceLost`] rather
//! than reading freed memory. The application remains responsible for
//! keeping resources alive while command buffers referencing them may still
//! be submitted.

slotmap::new_key_type! {
    /// Handle to a device buffer
    pub struct BufferHandle;
    /// Handle to a device image
    pub struct ImageHandle;
    /// Handle to an image view
    pub struct ImageViewHandle;
    /// Handle to a sampler
    pub struct SamplerHandle;
    /// Handle to a compiled shader module
    pub struct ShaderModuleHandle;
    /// Handle to a render pass description registered with a device
    pub struct RenderPassHandle;
    /// Handle to a framebuffer
    pub struct FramebufferHandle;
    /// Handle to a descriptor set layout
    pub struct DescriptorSetLayoutHandle;
    /// Handle to an allocated descriptor set
    pub struct DescriptorSetHandle;
    /// Handle to a pipeline layout
    pub struct PipelineLayoutHandle;
    /// Handle to a graphics pipeline
    pub struct PipelineHandle;
    /// Handle to a fence
    pub struct FenceHandle;
    /// Handle to a semaphore
    pub struct SemaphoreHandle;
    /// Handle to a pool of timestamp queries
    pub struct QueryPoolHandle;
}
